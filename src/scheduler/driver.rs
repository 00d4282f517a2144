//! Tick driver with statum state machine
//!
//! One driver owns every piece of timing state and runs the fixed-cadence
//! loop on the scheduler thread. Hosts that want to step the engine by hand
//! (tests, replay tools) can call [`TickDriver::tick`] directly.
//!
//! # State Machine
//!
//! ```text
//! Ready ──► Running ──► Stopped
//!   ▲                      │
//!   └──────── rearm ───────┘
//! ```
//!
//! # Tick
//!
//! ```text
//! enabled? ──► host state ──► EdgeDetector ──► handlers ──► CommandEmitter
//!                 │                              │
//!         refresh / stopping             ConfigStore, capabilities
//! ```

use chrono::Local;
use statum::{machine, state};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::state::SchedulerState;
use crate::capability::{HostCapabilities, OsdMessage};
use crate::command::{CommandEmitter, HotkeyCommand};
use crate::config::SchedulerSettings;
use crate::input::{
    ActionRegistry, EdgeDetector, HostLifecycle, HostState, Hotkey, InputProvider, TickSnapshot,
    BALANCE_BOARD,
};
use crate::store::{ConfigKey, ConfigStore, ConfigValue, StereoMode};
use crate::timing::{Direction, FrameStepState, NumericAdjustable};
use crate::toggle::ToggleGroup;

#[state]
#[derive(Debug, Clone)]
pub enum DriverState {
    Ready,   // Built, not ticking yet
    Running, // Ticking
    Stopped, // Loop exited after cancellation
}

/// Why a tick did or did not process actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Global input gate was off
    Disabled,
    /// Host is tearing down; nothing was sampled
    HostStopping,
    /// Sampled, but the host is not running
    HostNotRunning,
    Processed { emitted: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub outcome: TickOutcome,
    /// Blocking pause requested by a cooldown-guarded action
    pub pause: Option<Duration>,
}

#[machine]
pub struct TickDriver<S: DriverState> {
    settings: SchedulerSettings,
    input: Arc<dyn InputProvider>,
    lifecycle: Arc<dyn HostLifecycle>,
    store: Arc<dyn ConfigStore>,
    capabilities: HostCapabilities,
    registry: ActionRegistry,
    detector: EdgeDetector,
    stereo: ToggleGroup,
    emitter: CommandEmitter,
    state: SchedulerState,
}

impl<S: DriverState> TickDriver<S> {
    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn emitted(&self) -> u64 {
        self.emitter.emitted()
    }

    pub fn dropped(&self) -> u64 {
        self.emitter.dropped()
    }
}

impl TickDriver<Ready> {
    pub fn create(
        settings: SchedulerSettings,
        input: Arc<dyn InputProvider>,
        lifecycle: Arc<dyn HostLifecycle>,
        store: Arc<dyn ConfigStore>,
        capabilities: HostCapabilities,
        emitter: CommandEmitter,
    ) -> Self {
        let registry = ActionRegistry::standard(settings.slot_count);
        let state = SchedulerState::new(&settings);
        info!(
            "Initializing tick driver: {} actions, {}ms interval",
            registry.len(),
            settings.tick_interval_ms
        );

        Self::new(
            settings,
            input,
            lifecycle,
            store,
            capabilities,
            registry,
            EdgeDetector::new(),
            ToggleGroup::stereo(),
            emitter,
            state,
        )
    }

    pub fn activate(self) -> TickDriver<Running> {
        info!("Activating tick driver");
        self.transition()
    }
}

impl TickDriver<Running> {
    /// Runs one tick and reports what happened
    pub fn tick(&mut self) -> TickReport {
        self.state.tick += 1;
        let tick = self.state.tick;

        let (outcome, pause) = self.run_tick(tick);
        match outcome {
            TickOutcome::Processed { .. } => self.state.stats.processed += 1,
            _ => self.state.stats.skipped += 1,
        }

        TickReport {
            tick,
            outcome,
            pause,
        }
    }

    /// Ticks at the configured cadence until `token` is cancelled
    ///
    /// Cancellation wins over both the tick wait and a cooldown pause.
    /// Missed ticks are skipped, not caught up.
    pub async fn run_until_cancelled(mut self, token: CancellationToken) -> TickDriver<Stopped> {
        let period = self.settings.tick_interval();
        let stats_interval = chrono::Duration::from_std(self.settings.stats_interval())
            .unwrap_or_else(|_| chrono::Duration::seconds(30));
        info!("Starting tick loop with {}ms interval", self.settings.tick_interval_ms);

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.state.stats.reset(Local::now());

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let report = self.tick();
            if let Some(pause) = report.pause {
                debug!("Pausing tick loop for {:?}", pause);
                let cancelled = tokio::select! {
                    biased;
                    _ = token.cancelled() => true,
                    _ = tokio::time::sleep(pause) => false,
                };
                if cancelled {
                    break;
                }
                self.skip_pause(pause);
                ticker.reset();
            }

            let now = Local::now();
            if now - self.state.stats.window_start > stats_interval {
                let stats = &self.state.stats;
                info!(
                    "Scheduler stats: {} ticks processed, {} skipped, {} pauses, {} commands emitted ({} dropped) in {} seconds",
                    stats.processed,
                    stats.skipped,
                    stats.pauses,
                    self.emitter.emitted(),
                    self.emitter.dropped(),
                    (now - stats.window_start).num_seconds()
                );
                self.state.stats.reset(now);
            }
        }

        info!("Tick loop cancelled after {} ticks", self.state.tick);
        self.transition()
    }

    /// Moves the tick clock past a pause that was sat out
    fn skip_pause(&mut self, pause: Duration) {
        let interval = self.settings.tick_interval().as_nanos().max(1);
        let skipped = u64::try_from(pause.as_nanos().div_ceil(interval)).unwrap_or(u64::MAX);
        self.state.tick = self.state.tick.saturating_add(skipped);
        self.state.stats.pauses += 1;
    }

    fn run_tick(&mut self, tick: u64) -> (TickOutcome, Option<Duration>) {
        if !self.input.is_enabled() {
            debug!("Tick {}: input disabled", tick);
            return (TickOutcome::Disabled, None);
        }

        let host = self.lifecycle.state();
        if host.wants_input_refresh() {
            self.input.refresh_input_sources();
        }

        if host == HostState::Stopping {
            debug!("Tick {}: host stopping", tick);
            return (TickOutcome::HostStopping, None);
        }

        let fired = self.detector.sample(self.input.as_ref(), &self.registry);

        if !host.is_running() {
            debug!("Tick {}: host {:?}, not processing", tick, host);
            return (TickOutcome::HostNotRunning, None);
        }

        let mut commands = Vec::new();
        let pause = self.process_general(tick, &fired, &mut commands);
        self.process_frame_step(&fired, &mut commands);
        self.process_session(&fired, &mut commands);
        self.process_peripherals(&fired, &mut commands);
        self.process_audio(&fired);
        self.process_graphics(&fired);
        self.process_speed(&fired);
        push_fired(
            &fired,
            &mut commands,
            [
                (Hotkey::SaveStateSlotSelected, HotkeyCommand::SaveSelectedSlot),
                (Hotkey::LoadStateSlotSelected, HotkeyCommand::LoadSelectedSlot),
            ],
        );
        self.process_stereo(&fired);
        self.process_freelook(&fired, &mut commands);
        self.process_slots(&fired, &mut commands);

        let mut emitted = 0;
        for command in commands {
            info!("Tick {}: {:?}", tick, command);
            if self.emitter.emit(tick, command) {
                emitted += 1;
            }
        }

        (TickOutcome::Processed { emitted }, pause)
    }

    // Disc, window and emulation control. Returns the fullscreen pause.
    fn process_general(
        &mut self,
        tick: u64,
        fired: &TickSnapshot,
        commands: &mut Vec<HotkeyCommand>,
    ) -> Option<Duration> {
        push_fired(
            fired,
            commands,
            [
                (Hotkey::Open, HotkeyCommand::Open),
                (Hotkey::EjectDisc, HotkeyCommand::EjectDisc),
                (Hotkey::ChangeDisc, HotkeyCommand::ChangeDisc),
            ],
        );

        let mut pause = None;
        if fired.fired(Hotkey::Fullscreen) {
            pause = self.state.fullscreen_cooldown.trigger(tick);
            if pause.is_some() {
                commands.push(HotkeyCommand::ToggleFullscreen);
            }
        }

        push_fired(
            fired,
            commands,
            [
                (Hotkey::RefreshList, HotkeyCommand::RefreshGameList),
                (Hotkey::PlayPause, HotkeyCommand::TogglePause),
                (Hotkey::Stop, HotkeyCommand::Stop),
                (Hotkey::Reset, HotkeyCommand::Reset),
            ],
        );

        pause
    }

    fn process_frame_step(&mut self, fired: &TickSnapshot, commands: &mut Vec<HotkeyCommand>) {
        let frame_step = &mut self.state.frame_step;
        if fired.fired(Hotkey::FrameAdvanceIncreaseSpeed) {
            frame_step.increase_delay();
        }
        if fired.fired(Hotkey::FrameAdvanceDecreaseSpeed) {
            frame_step.decrease_delay();
        }
        if fired.fired(Hotkey::FrameAdvanceResetSpeed) {
            frame_step.reset_delay();
        }

        if frame_step.advance(fired.fired(Hotkey::FrameAdvance)) {
            commands.push(HotkeyCommand::FrameStep);
        }
    }

    // Screenshot, exit and movie recording
    fn process_session(&mut self, fired: &TickSnapshot, commands: &mut Vec<HotkeyCommand>) {
        push_fired(
            fired,
            commands,
            [
                (Hotkey::Screenshot, HotkeyCommand::Screenshot),
                (Hotkey::Exit, HotkeyCommand::Exit),
                (Hotkey::StartRecording, HotkeyCommand::StartRecording),
                (Hotkey::ExportRecording, HotkeyCommand::ExportRecording),
                (Hotkey::ReadOnlyMode, HotkeyCommand::ToggleReadOnlyMode),
            ],
        );
    }

    // Sync button, debugger and remote connection; each behind its own flag
    fn process_peripherals(&mut self, fired: &TickSnapshot, commands: &mut Vec<HotkeyCommand>) {
        if self.store.get_bool(ConfigKey::BluetoothPassthrough) {
            self.capabilities
                .update_sync_button(fired.fired(Hotkey::TriggerSyncButton));
        }

        if self.store.get_bool(ConfigKey::DebuggingEnabled) {
            push_fired(
                fired,
                commands,
                [
                    (Hotkey::Step, HotkeyCommand::Step),
                    (Hotkey::StepOver, HotkeyCommand::StepOver),
                    (Hotkey::StepOut, HotkeyCommand::StepOut),
                    (Hotkey::Skip, HotkeyCommand::Skip),
                    (Hotkey::ShowPc, HotkeyCommand::ShowPc),
                    (Hotkey::SetPc, HotkeyCommand::SetPc),
                    (Hotkey::ToggleBreakpoint, HotkeyCommand::ToggleBreakpoint),
                    (Hotkey::AddBreakpoint, HotkeyCommand::AddBreakpoint),
                ],
            );
        }

        if self.store.get_bool(ConfigKey::WiiMode) {
            // Last asserted wins
            let remote = (0..=BALANCE_BOARD)
                .filter(|id| fired.fired(Hotkey::ConnectWiiRemote(*id)))
                .last();
            if let Some(id) = remote {
                commands.push(HotkeyCommand::ConnectWiiRemote(id));
            }
        }
    }

    fn process_audio(&mut self, fired: &TickSnapshot) {
        let store = self.store.as_ref();
        if fired.fired(Hotkey::VolumeDown) {
            self.capabilities.show(OsdMessage::VolumeChanged);
            adjust(store, ConfigKey::Volume, NumericAdjustable::volume, Direction::Down);
        }
        if fired.fired(Hotkey::VolumeUp) {
            self.capabilities.show(OsdMessage::VolumeChanged);
            adjust(store, ConfigKey::Volume, NumericAdjustable::volume, Direction::Up);
        }
        if fired.fired(Hotkey::VolumeToggleMute) {
            self.capabilities.show(OsdMessage::VolumeChanged);
            store.toggle(ConfigKey::AudioMuted);
        }
    }

    fn process_graphics(&mut self, fired: &TickSnapshot) {
        let store = self.store.as_ref();
        let caps = &self.capabilities;

        if fired.fired(Hotkey::IncreaseIr) {
            caps.show(OsdMessage::IrChanged);
            adjust(store, ConfigKey::EfbScale, NumericAdjustable::internal_resolution, Direction::Up);
        }
        if fired.fired(Hotkey::DecreaseIr) {
            caps.show(OsdMessage::IrChanged);
            adjust(store, ConfigKey::EfbScale, NumericAdjustable::internal_resolution, Direction::Down);
        }

        if fired.fired(Hotkey::ToggleCrop) {
            store.toggle(ConfigKey::Crop);
        }
        if fired.fired(Hotkey::ToggleAspectRatio) {
            caps.show(OsdMessage::ArToggled);
            store.update(ConfigKey::AspectRatio, &mut |current| {
                ConfigValue::Aspect(current.as_aspect().unwrap_or_default().next())
            });
        }

        let flags = [
            (Hotkey::ToggleEfbCopies, ConfigKey::SkipEfbCopyToRam, Some(OsdMessage::EfbCopyToggled)),
            (Hotkey::ToggleXfbCopies, ConfigKey::SkipXfbCopyToRam, Some(OsdMessage::XfbChanged)),
            (Hotkey::ToggleImmediateXfb, ConfigKey::ImmediateXfb, Some(OsdMessage::XfbChanged)),
            (Hotkey::ToggleFog, ConfigKey::DisableFog, Some(OsdMessage::FogToggled)),
            (Hotkey::ToggleDumpTextures, ConfigKey::DumpTextures, None),
            (Hotkey::ToggleTextures, ConfigKey::HiresTextures, None),
        ];
        for (hotkey, key, message) in flags {
            if fired.fired(hotkey) {
                if let Some(message) = message {
                    caps.show(message);
                }
                store.toggle(key);
            }
        }

        // Held state, not a toggle
        store.set(
            ConfigKey::ThrottlerTempDisabled,
            ConfigValue::Bool(fired.fired(Hotkey::ToggleThrottle)),
        );
    }

    fn process_speed(&mut self, fired: &TickSnapshot) {
        let store = self.store.as_ref();
        if fired.fired(Hotkey::DecreaseEmulationSpeed) {
            self.capabilities.show(OsdMessage::SpeedChanged);
            adjust(store, ConfigKey::EmulationSpeed, NumericAdjustable::emulation_speed, Direction::Down);
        }
        if fired.fired(Hotkey::IncreaseEmulationSpeed) {
            self.capabilities.show(OsdMessage::SpeedChanged);
            adjust(store, ConfigKey::EmulationSpeed, NumericAdjustable::emulation_speed, Direction::Up);
        }
    }

    fn process_stereo(&mut self, fired: &TickSnapshot) {
        let store = self.store.as_ref();

        // Side-by-side wins when both layouts fire on one tick
        let split = if fired.fired(Hotkey::ToggleStereoSbs) {
            Some(StereoMode::SideBySide)
        } else if fired.fired(Hotkey::ToggleStereoTab) {
            Some(StereoMode::TopAndBottom)
        } else {
            None
        };
        let targets = [
            split,
            fired.fired(Hotkey::ToggleStereoAnaglyph).then_some(StereoMode::Anaglyph),
            fired.fired(Hotkey::ToggleStereo3dVision).then_some(StereoMode::Nvidia3DVision),
        ];
        for mode in targets.into_iter().flatten() {
            self.stereo.fire(store, &ConfigValue::Stereo(mode));
        }

        let depth: fn(f64) -> NumericAdjustable = NumericAdjustable::stereo_depth;
        let convergence: fn(f64) -> NumericAdjustable = NumericAdjustable::stereo_convergence;
        let held = [
            (Hotkey::DecreaseDepth, ConfigKey::StereoDepth, depth, Direction::Down),
            (Hotkey::IncreaseDepth, ConfigKey::StereoDepth, depth, Direction::Up),
            (Hotkey::DecreaseConvergence, ConfigKey::StereoConvergence, convergence, Direction::Down),
            (Hotkey::IncreaseConvergence, ConfigKey::StereoConvergence, convergence, Direction::Up),
        ];
        for (hotkey, key, policy, direction) in held {
            if fired.fired(hotkey) {
                adjust(store, key, policy, direction);
            }
        }
    }

    fn process_freelook(&mut self, fired: &TickSnapshot, commands: &mut Vec<HotkeyCommand>) {
        let speed = &mut self.state.freelook_speed;
        if fired.fired(Hotkey::FreelookDecreaseSpeed) {
            speed.decrease();
        }
        if fired.fired(Hotkey::FreelookIncreaseSpeed) {
            speed.increase();
        }
        if fired.fired(Hotkey::FreelookResetSpeed) {
            speed.reset();
        }

        let s = speed.current;
        let moves = [
            (Hotkey::FreelookUp, (0.0, 0.0, -s)),
            (Hotkey::FreelookDown, (0.0, 0.0, s)),
            (Hotkey::FreelookLeft, (s, 0.0, 0.0)),
            (Hotkey::FreelookRight, (-s, 0.0, 0.0)),
            (Hotkey::FreelookZoomIn, (0.0, s, 0.0)),
            (Hotkey::FreelookZoomOut, (0.0, -s, 0.0)),
        ];
        for (hotkey, (x, y, z)) in moves {
            if fired.fired(hotkey) {
                commands.push(HotkeyCommand::FreelookTranslate { x, y, z });
            }
        }

        if fired.fired(Hotkey::FreelookReset) {
            commands.push(HotkeyCommand::FreelookReset);
        }
    }

    // Every slot is checked independently; commands carry 1-based numbers
    fn process_slots(&mut self, fired: &TickSnapshot, commands: &mut Vec<HotkeyCommand>) {
        for slot in 0..self.registry.slot_count() {
            let number = slot + 1;
            push_fired(
                fired,
                commands,
                [
                    (Hotkey::LoadStateSlot(slot), HotkeyCommand::LoadSlot(number)),
                    (Hotkey::SaveStateSlot(slot), HotkeyCommand::SaveSlot(number)),
                    (Hotkey::LoadLastState(slot), HotkeyCommand::LoadLastSaved(number)),
                    (Hotkey::SelectStateSlot(slot), HotkeyCommand::SelectSlot(number)),
                ],
            );
        }

        push_fired(
            fired,
            commands,
            [
                (Hotkey::SaveFirstState, HotkeyCommand::SaveOldestSlot),
                (Hotkey::UndoLoadState, HotkeyCommand::UndoLoadState),
                (Hotkey::UndoSaveState, HotkeyCommand::UndoSaveState),
            ],
        );
    }

    pub fn stop(self) -> TickDriver<Stopped> {
        info!("Stopping tick driver at tick {}", self.state.tick);
        self.transition()
    }
}

impl TickDriver<Stopped> {
    /// Back to `Ready`, aborting any frame-step cycle in progress
    pub fn rearm(mut self) -> TickDriver<Ready> {
        info!("Rearming tick driver");
        self.state.frame_step = FrameStepState::with_delay(self.state.frame_step.delay_setting);
        self.transition()
    }
}

fn push_fired<const N: usize>(
    fired: &TickSnapshot,
    commands: &mut Vec<HotkeyCommand>,
    pairs: [(Hotkey, HotkeyCommand); N],
) {
    commands.extend(
        pairs
            .into_iter()
            .filter(|(hotkey, _)| fired.fired(*hotkey))
            .map(|(_, command)| command),
    );
}

/// Steps a numeric store parameter under `policy` in one atomic update
fn adjust(
    store: &dyn ConfigStore,
    key: ConfigKey,
    policy: fn(f64) -> NumericAdjustable,
    direction: Direction,
) -> ConfigValue {
    let next = store.update(key, &mut |current| {
        let value = current
            .as_f64()
            .or_else(|| key.default_value().as_f64())
            .unwrap_or_default();
        current.with_number(policy(value).adjust(direction))
    });
    debug!("{:?} -> {}", key, next);
    next
}
