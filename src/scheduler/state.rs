use chrono::{DateTime, Local};
use std::time::Duration;

use crate::config::SchedulerSettings;
use crate::timing::{Cooldown, FrameStepState, NumericAdjustable};

/// Counters reported by the periodic stats log
#[derive(Clone, Debug)]
pub struct TickStats {
    pub processed: u64,
    pub skipped: u64,
    pub pauses: u64,
    pub window_start: DateTime<Local>,
}

impl Default for TickStats {
    fn default() -> Self {
        Self {
            processed: 0,
            skipped: 0,
            pauses: 0,
            window_start: Local::now(),
        }
    }
}

impl TickStats {
    pub fn reset(&mut self, now: DateTime<Local>) {
        *self = Self {
            window_start: now,
            ..Self::default()
        };
    }
}

/// State owned by the tick driver and threaded from tick to tick
///
/// Only the scheduler thread touches it, so none of it is synchronized.
#[derive(Clone, Debug)]
pub struct SchedulerState {
    /// Nominal tick counter, advanced across cooldown pauses as well
    pub tick: u64,
    pub frame_step: FrameStepState,
    pub fullscreen_cooldown: Cooldown,
    pub freelook_speed: NumericAdjustable,
    pub stats: TickStats,
}

impl SchedulerState {
    pub fn new(settings: &SchedulerSettings) -> Self {
        Self::with_timing(
            settings.frame_step_delay,
            settings.cooldown(),
            settings.tick_interval(),
        )
    }

    pub fn with_timing(frame_step_delay: u32, cooldown: Duration, tick_interval: Duration) -> Self {
        Self {
            tick: 0,
            frame_step: FrameStepState::with_delay(frame_step_delay),
            fullscreen_cooldown: Cooldown::new(cooldown, tick_interval),
            freelook_speed: NumericAdjustable::freelook_speed(),
            stats: TickStats::default(),
        }
    }
}
