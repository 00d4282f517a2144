use color_eyre::{eyre::eyre, Result};
use hotkey_scheduler::{
    HostCapabilities, HostState, Hotkey, HotkeyScheduler, OsdMessage, OsdNotifier,
    SchedulerSettings, SharedConfigStore, SharedLifecycle, VirtualInput,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Logs on-screen messages instead of drawing them
struct LogNotifier;

impl OsdNotifier for LogNotifier {
    fn show(&self, message: OsdMessage) {
        info!("OSD: {:?}", message);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let settings_path = std::env::args()
        .nth(1)
        .map(Into::into)
        .unwrap_or_else(SchedulerSettings::default_path);
    let settings = SchedulerSettings::load(&settings_path)
        .await
        .map_err(|e| eyre!("Failed to load settings: {}", e))?;

    let input = Arc::new(VirtualInput::new());
    let lifecycle = Arc::new(SharedLifecycle::new(HostState::Running));
    let store = Arc::new(SharedConfigStore::new());
    let capabilities = HostCapabilities::default().with_notifier(Arc::new(LogNotifier));

    let (mut scheduler, mut commands) = HotkeyScheduler::new(
        settings,
        input.clone(),
        lifecycle.clone(),
        store,
        capabilities,
    )?;
    scheduler.start()?;

    let _consumer = tokio::spawn(async move {
        while let Some(emitted) = commands.recv().await {
            info!(
                "Command {:?} (tick {}, {})",
                emitted.command,
                emitted.tick,
                emitted.issued_at.format("%H:%M:%S.%3f")
            );
        }
        debug!("Command channel closed");
    });

    info!("Reading commands from stdin: press|release|tap <hotkey>, enable, disable, host <state>, quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received");
                break;
            }
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if !handle_line(line.trim(), &input, &lifecycle) {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    tokio::task::spawn_blocking(move || scheduler.stop())
        .await
        .map_err(|e| eyre!("Scheduler shutdown task failed: {}", e))??;
    info!("Shut down");
    Ok(())
}

// Returns false when the loop should end
fn handle_line(line: &str, input: &VirtualInput, lifecycle: &SharedLifecycle) -> bool {
    let mut parts = line.split_whitespace();
    let (Some(verb), arg) = (parts.next(), parts.next()) else {
        return true;
    };

    match (verb, arg) {
        ("quit" | "exit", _) => return false,
        ("enable", _) => input.set_enabled(true),
        ("disable", _) => input.set_enabled(false),
        ("host", Some(state)) => match parse_host_state(state) {
            Some(state) => lifecycle.set(state),
            None => warn!("Unknown host state: {}", state),
        },
        ("press" | "release" | "tap", Some(name)) => match name.parse::<Hotkey>() {
            Ok(hotkey) => match verb {
                "press" => input.press(hotkey),
                "release" => input.release(hotkey),
                _ => input.tap(hotkey),
            },
            Err(e) => warn!("{}", e),
        },
        _ => warn!("Unrecognized input: {}", line),
    }
    true
}

fn parse_host_state(name: &str) -> Option<HostState> {
    match name {
        "uninitialized" => Some(HostState::Uninitialized),
        "starting" => Some(HostState::Starting),
        "running" => Some(HostState::Running),
        "paused" => Some(HostState::Paused),
        "stopping" => Some(HostState::Stopping),
        _ => None,
    }
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

// Falls back to info when RUST_LOG is unset or unparsable
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn setup_logging_env() {
    let directives = std::env::var("RUST_LOG").ok();
    FmtSubscriber::builder()
        .with_env_filter(log_filter(directives.as_deref()))
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn log_filter_follows_rust_log() {
        assert_eq!(log_filter(Some("debug")).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(log_filter(Some("warn")).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn parse_host_state_accepts_lowercase_names() {
        assert_eq!(parse_host_state("paused"), Some(HostState::Paused));
        assert_eq!(parse_host_state("Paused"), None);
    }
}
