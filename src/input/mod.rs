//! Input side of the scheduler
//!
//! The scheduler never talks to devices. It asks an [`InputProvider`] for the
//! state of logical actions and a [`HostLifecycle`] for whether the host is in
//! a state where hotkeys should do anything.
//!
//! ```text
//! InputProvider ──► EdgeDetector ──► TickSnapshot
//!  (raw samples)    (edge / hold)    (fired actions)
//! ```

pub mod detector;
pub mod hotkey;
pub mod virtual_input;

pub use detector::{EdgeDetector, TickSnapshot};
pub use hotkey::{ActionRegistry, Hotkey, LogicalAction, ParseHotkeyError, Trigger, BALANCE_BOARD, MAX_SLOTS};
pub use virtual_input::{SharedLifecycle, VirtualInput};

/// Source of logical action states, queried from the scheduler thread
///
/// Implementations must be cheap enough to call for every registered action
/// on every tick. An action without a bound device samples as `false`.
pub trait InputProvider: Send + Sync {
    /// Current state of `hotkey`. `hold` asks for held semantics, letting the
    /// provider apply its own repeat handling.
    fn sample(&self, hotkey: Hotkey, hold: bool) -> bool;

    /// Global gate; when false the scheduler skips the whole tick
    fn is_enabled(&self) -> bool;

    /// Re-scan input devices. Called while the host is idle or paused.
    fn refresh_input_sources(&self) {}
}

/// Lifecycle of the host application
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HostState {
    #[default]
    Uninitialized,
    Starting,
    Running,
    Paused,
    Stopping,
}

impl HostState {
    /// Running and started; hotkeys are processed only in these states
    pub fn is_running(self) -> bool {
        matches!(self, HostState::Running | HostState::Paused)
    }

    pub fn wants_input_refresh(self) -> bool {
        matches!(self, HostState::Uninitialized | HostState::Paused)
    }
}

pub trait HostLifecycle: Send + Sync {
    fn state(&self) -> HostState;
}
