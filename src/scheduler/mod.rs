//! The scheduling loop and its owner
//!
//! - [`driver`] - `TickDriver` state machine running one tick at a time
//! - [`handle`] - `HotkeyScheduler`, the thread owner with `start` / `stop`
//! - [`state`] - timing state threaded from tick to tick

pub mod driver;
pub mod handle;
pub mod state;

pub use driver::{TickDriver, TickOutcome, TickReport};
pub use handle::{HotkeyScheduler, SchedulerError};
pub use state::{SchedulerState, TickStats};
