use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::driver::{Ready, Stopped, TickDriver};
use crate::capability::HostCapabilities;
use crate::command::{CommandEmitter, EmittedCommand};
use crate::config::{SchedulerSettings, SettingsError};
use crate::input::{HostLifecycle, InputProvider};
use crate::store::ConfigStore;

const THREAD_NAME: &str = "hotkey-scheduler";

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Invalid scheduler settings: {0}")]
    InvalidSettings(#[from] SettingsError),

    #[error("Failed to build scheduler runtime: {0}")]
    RuntimeFailed(#[source] std::io::Error),

    #[error("Failed to spawn scheduler thread: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Scheduler thread panicked")]
    WorkerPanicked,

    /// The driver was lost to an earlier spawn failure or panic
    #[error("Scheduler is no longer available")]
    Unavailable,
}

enum Worker {
    Idle(TickDriver<Ready>),
    Running {
        token: CancellationToken,
        thread: JoinHandle<TickDriver<Stopped>>,
    },
}

/// Owner of the scheduler thread
///
/// `start` and `stop` are idempotent. `stop` blocks until the thread has
/// observed cancellation and exited; after that the scheduler can be started
/// again. Dropping the scheduler stops it.
pub struct HotkeyScheduler {
    worker: Option<Worker>,
}

impl HotkeyScheduler {
    /// Builds a stopped scheduler and the receiving end of its command channel
    pub fn new(
        settings: SchedulerSettings,
        input: Arc<dyn InputProvider>,
        lifecycle: Arc<dyn HostLifecycle>,
        store: Arc<dyn ConfigStore>,
        capabilities: HostCapabilities,
    ) -> Result<(Self, mpsc::Receiver<EmittedCommand>), SchedulerError> {
        settings.validate()?;

        let (emitter, receiver) = CommandEmitter::channel(settings.command_buffer);
        let driver = TickDriver::create(settings, input, lifecycle, store, capabilities, emitter);

        let scheduler = Self {
            worker: Some(Worker::Idle(driver)),
        };
        Ok((scheduler, receiver))
    }

    pub fn start(&mut self) -> Result<(), SchedulerError> {
        match self.worker.take() {
            Some(Worker::Idle(driver)) => {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        error!("Failed to build scheduler runtime: {}", e);
                        self.worker = Some(Worker::Idle(driver));
                        return Err(SchedulerError::RuntimeFailed(e));
                    }
                };

                let token = CancellationToken::new();
                let thread_token = token.clone();
                let thread = std::thread::Builder::new()
                    .name(THREAD_NAME.to_string())
                    .spawn(move || {
                        runtime.block_on(driver.activate().run_until_cancelled(thread_token))
                    })
                    .map_err(|e| {
                        error!("Failed to spawn scheduler thread: {}", e);
                        SchedulerError::SpawnFailed(e)
                    })?;

                self.worker = Some(Worker::Running { token, thread });
                info!("Hotkey scheduler started");
                Ok(())
            }
            Some(running @ Worker::Running { .. }) => {
                debug!("Hotkey scheduler already running");
                self.worker = Some(running);
                Ok(())
            }
            None => Err(SchedulerError::Unavailable),
        }
    }

    /// Cancels the loop and joins the thread
    pub fn stop(&mut self) -> Result<(), SchedulerError> {
        match self.worker.take() {
            Some(Worker::Running { token, thread }) => {
                debug!("Sending cancellation to scheduler thread");
                token.cancel();

                match thread.join() {
                    Ok(stopped) => {
                        info!(
                            "Hotkey scheduler stopped: {} commands emitted, {} dropped",
                            stopped.emitted(),
                            stopped.dropped()
                        );
                        self.worker = Some(Worker::Idle(stopped.rearm()));
                        Ok(())
                    }
                    Err(_) => {
                        error!("Scheduler thread panicked");
                        Err(SchedulerError::WorkerPanicked)
                    }
                }
            }
            Some(idle @ Worker::Idle(_)) => {
                debug!("Hotkey scheduler not running");
                self.worker = Some(idle);
                Ok(())
            }
            None => {
                debug!("Hotkey scheduler already torn down");
                Ok(())
            }
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.worker, Some(Worker::Running { .. }))
    }
}

impl Drop for HotkeyScheduler {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Error stopping scheduler on drop: {}", e);
        }
    }
}
