//! Timing and debounce state machines driven once per tick
//!
//! - [`frame_step`] - hold-to-repeat single stepping with a configurable delay
//! - [`cooldown`] - suppression window after a trigger
//! - [`adjust`] - clamped numeric adjustment with snap bands

pub mod adjust;
pub mod cooldown;
pub mod frame_step;

pub use adjust::{Direction, NumericAdjustable, StepScale};
pub use cooldown::Cooldown;
pub use frame_step::{FrameStepPhase, FrameStepState, FRAME_STEP_CYCLE, MAX_FRAME_STEP_DELAY};
