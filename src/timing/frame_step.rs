use tracing::debug;

/// Ticks between the first step of a hold and the first repeat
pub const FRAME_STEP_CYCLE: u32 = 30;

/// Upper bound for the configurable inter-step delay
pub const MAX_FRAME_STEP_DELAY: u32 = 60;

pub const DEFAULT_FRAME_STEP_DELAY: u32 = 1;

/// Observable phase of the frame-step cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStepPhase {
    Idle,
    Stepping,
    HoldWait,
}

/// Counters of the frame-step hold machine
///
/// Holding the step action emits one step immediately, then waits out
/// `FRAME_STEP_CYCLE` ticks, then repeats every `delay_setting + 1` ticks
/// for as long as the action stays held. Releasing resets the counters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameStepState {
    pub elapsed_ticks: u32,
    pub hold_active: bool,
    pub delay_setting: u32,
    pub delay_elapsed: u32,
}

impl Default for FrameStepState {
    fn default() -> Self {
        Self::with_delay(DEFAULT_FRAME_STEP_DELAY)
    }
}

impl FrameStepState {
    pub fn with_delay(delay: u32) -> Self {
        Self {
            elapsed_ticks: 0,
            hold_active: false,
            delay_setting: delay.min(MAX_FRAME_STEP_DELAY),
            delay_elapsed: 0,
        }
    }

    pub fn phase(&self) -> FrameStepPhase {
        if self.elapsed_ticks == 0 {
            FrameStepPhase::Idle
        } else if self.elapsed_ticks < FRAME_STEP_CYCLE {
            FrameStepPhase::Stepping
        } else {
            FrameStepPhase::HoldWait
        }
    }

    /// Advances one tick; returns true when a step should be emitted
    pub fn advance(&mut self, held: bool) -> bool {
        if !held {
            if self.elapsed_ticks > 0 {
                debug!("Frame step released, resetting cycle");
                self.reset_cycle();
            }
            return false;
        }

        if self.hold_active && self.delay_elapsed < self.delay_setting {
            self.delay_elapsed += 1;
        }

        let mut step = false;
        if !self.hold_active && (self.elapsed_ticks == 0 || self.elapsed_ticks == FRAME_STEP_CYCLE) {
            step = true;
            self.hold_active = true;
        }

        if self.elapsed_ticks < FRAME_STEP_CYCLE {
            self.elapsed_ticks += 1;
            self.hold_active = false;
        }

        if self.elapsed_ticks == FRAME_STEP_CYCLE
            && self.hold_active
            && self.delay_elapsed >= self.delay_setting
        {
            self.hold_active = false;
            self.delay_elapsed = 0;
        }

        step
    }

    pub fn increase_delay(&mut self) {
        self.delay_setting = (self.delay_setting + 1).min(MAX_FRAME_STEP_DELAY);
        debug!("Frame step delay: {}", self.delay_setting);
    }

    pub fn decrease_delay(&mut self) {
        self.delay_setting = self.delay_setting.saturating_sub(1);
        debug!("Frame step delay: {}", self.delay_setting);
    }

    pub fn reset_delay(&mut self) {
        self.delay_setting = DEFAULT_FRAME_STEP_DELAY;
        debug!("Frame step delay reset to {}", self.delay_setting);
    }

    fn reset_cycle(&mut self) {
        self.elapsed_ticks = 0;
        self.hold_active = false;
        self.delay_elapsed = 0;
    }
}
