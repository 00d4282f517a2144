use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use hotkey_scheduler::command::{EmittedCommand, HotkeyCommand};
use hotkey_scheduler::config::SchedulerSettings;
use hotkey_scheduler::input::{HostState, Hotkey, InputProvider, SharedLifecycle, VirtualInput};
use hotkey_scheduler::scheduler::{HotkeyScheduler, SchedulerError};
use hotkey_scheduler::store::SharedConfigStore;
use hotkey_scheduler::timing::Cooldown;
use hotkey_scheduler::HostCapabilities;

const TIMEOUT_MS: u64 = 2000;

fn scheduler() -> (HotkeyScheduler, mpsc::Receiver<EmittedCommand>, Arc<VirtualInput>) {
    scheduler_with(SchedulerSettings::default())
}

fn scheduler_with(
    settings: SchedulerSettings,
) -> (HotkeyScheduler, mpsc::Receiver<EmittedCommand>, Arc<VirtualInput>) {
    let input = Arc::new(VirtualInput::new());
    let (scheduler, commands) = HotkeyScheduler::new(
        settings,
        input.clone(),
        Arc::new(SharedLifecycle::new(HostState::Running)),
        Arc::new(SharedConfigStore::new()),
        HostCapabilities::default(),
    )
    .expect("valid settings");
    (scheduler, commands, input)
}

async fn next_emitted(rx: &mut mpsc::Receiver<EmittedCommand>) -> EmittedCommand {
    timeout(Duration::from_millis(TIMEOUT_MS), rx.recv())
        .await
        .expect("command timed out")
        .expect("command channel closed unexpectedly")
}

async fn next_command(rx: &mut mpsc::Receiver<EmittedCommand>) -> HotkeyCommand {
    next_emitted(rx).await.command
}

#[tokio::test]
async fn started_scheduler_emits_commands() {
    let (mut scheduler, mut commands, input) = scheduler();
    scheduler.start().unwrap();
    assert!(scheduler.is_running());

    input.tap(Hotkey::Open);
    assert_eq!(next_command(&mut commands).await, HotkeyCommand::Open);

    scheduler.stop().unwrap();
    assert!(!scheduler.is_running());
}

#[test]
fn stop_is_idempotent() {
    let (mut scheduler, _commands, _input) = scheduler();
    scheduler.stop().unwrap();

    scheduler.start().unwrap();
    scheduler.start().unwrap();
    scheduler.stop().unwrap();
    scheduler.stop().unwrap();
    assert!(!scheduler.is_running());
}

#[test]
fn stopped_scheduler_no_longer_samples() {
    let (mut scheduler, _commands, input) = scheduler();
    scheduler.start().unwrap();
    scheduler.stop().unwrap();

    input.tap(Hotkey::Screenshot);
    std::thread::sleep(std::time::Duration::from_millis(100));
    // Nobody consumed the tap
    assert!(input.sample(Hotkey::Screenshot, false));
}

#[tokio::test]
async fn scheduler_restarts_after_stop() {
    let (mut scheduler, mut commands, input) = scheduler();
    scheduler.start().unwrap();
    scheduler.stop().unwrap();
    scheduler.start().unwrap();

    input.tap(Hotkey::Exit);
    assert_eq!(next_command(&mut commands).await, HotkeyCommand::Exit);
    scheduler.stop().unwrap();
}

#[tokio::test]
async fn dropping_scheduler_closes_channel() {
    let (mut scheduler, mut commands, _input) = scheduler();
    scheduler.start().unwrap();
    drop(scheduler);

    let closed = timeout(Duration::from_millis(TIMEOUT_MS), commands.recv())
        .await
        .expect("channel close timed out");
    assert!(closed.is_none());
}

#[tokio::test]
async fn cooldown_pause_holds_the_loop() {
    let settings = SchedulerSettings::default();
    let window = Cooldown::new(settings.cooldown(), settings.tick_interval()).window_ticks();
    let (mut scheduler, mut commands, input) = scheduler_with(settings.clone());
    scheduler.start().unwrap();

    input.tap(Hotkey::Fullscreen);
    let fullscreen = next_emitted(&mut commands).await;
    assert_eq!(fullscreen.command, HotkeyCommand::ToggleFullscreen);

    // Tapped while the loop sits out the pause
    input.tap(Hotkey::Open);
    let open = next_emitted(&mut commands).await;
    assert_eq!(open.command, HotkeyCommand::Open);

    let cooldown = chrono::Duration::milliseconds(settings.cooldown_ms as i64);
    assert!(open.issued_at - fullscreen.issued_at >= cooldown);
    // The tick clock skips the window, so the next processed tick lies beyond it
    assert!(open.tick > fullscreen.tick + window);
    scheduler.stop().unwrap();
}

#[test]
fn stop_interrupts_a_long_tick_wait() {
    let settings = SchedulerSettings {
        tick_interval_ms: 1000,
        ..SchedulerSettings::default()
    };
    let (mut scheduler, _commands, _input) = scheduler_with(settings);
    scheduler.start().unwrap();
    std::thread::sleep(std::time::Duration::from_millis(50));

    let started = std::time::Instant::now();
    scheduler.stop().unwrap();
    assert!(started.elapsed() < std::time::Duration::from_millis(500));
}

#[tokio::test]
async fn stop_interrupts_a_cooldown_pause() {
    let settings = SchedulerSettings {
        cooldown_ms: 1000,
        ..SchedulerSettings::default()
    };
    let (mut scheduler, mut commands, input) = scheduler_with(settings);
    scheduler.start().unwrap();

    input.tap(Hotkey::Fullscreen);
    assert_eq!(next_command(&mut commands).await, HotkeyCommand::ToggleFullscreen);

    let started = std::time::Instant::now();
    scheduler.stop().unwrap();
    assert!(started.elapsed() < std::time::Duration::from_millis(500));
}

#[test]
fn oversized_intervals_are_rejected() {
    for settings in [
        SchedulerSettings {
            tick_interval_ms: u64::MAX,
            ..SchedulerSettings::default()
        },
        SchedulerSettings {
            cooldown_ms: u64::MAX,
            ..SchedulerSettings::default()
        },
    ] {
        let result = HotkeyScheduler::new(
            settings,
            Arc::new(VirtualInput::new()),
            Arc::new(SharedLifecycle::default()),
            Arc::new(SharedConfigStore::new()),
            HostCapabilities::default(),
        );
        assert!(matches!(result, Err(SchedulerError::InvalidSettings(_))));
    }
}

#[test]
fn invalid_settings_are_rejected() {
    let settings = SchedulerSettings {
        slot_count: 0,
        ..SchedulerSettings::default()
    };
    let result = HotkeyScheduler::new(
        settings,
        Arc::new(VirtualInput::new()),
        Arc::new(SharedLifecycle::default()),
        Arc::new(SharedConfigStore::new()),
        HostCapabilities::default(),
    );
    assert!(matches!(result, Err(SchedulerError::InvalidSettings(_))));
}
