//! Real-time hotkey scheduler
//!
//! Samples logical input actions at a fixed cadence on a dedicated thread
//! and turns presses and holds into typed commands for a host to execute.
//!
//! ```text
//! InputProvider ──► TickDriver ──► CommandEmitter ──► mpsc::Receiver<EmittedCommand>
//!                       │
//!                 ConfigStore, HostCapabilities
//! ```

pub mod capability;
pub mod command;
pub mod config;
pub mod input;
pub mod scheduler;
pub mod store;
pub mod timing;
pub mod toggle;

pub use capability::{HostCapabilities, OsdMessage, OsdNotifier, PeripheralSync};
pub use command::{CommandEmitter, EmittedCommand, HotkeyCommand};
pub use config::{SchedulerSettings, SettingsError};
pub use input::{HostLifecycle, HostState, Hotkey, InputProvider, SharedLifecycle, VirtualInput};
pub use scheduler::{HotkeyScheduler, SchedulerError, TickDriver, TickOutcome, TickReport};
pub use store::{ConfigKey, ConfigStore, ConfigValue, SharedConfigStore, StereoMode};
