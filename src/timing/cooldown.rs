use std::time::Duration;

use tracing::debug;

/// Debounce for actions whose effect must not repeat too quickly
///
/// A trigger hands back the blocking pause the tick loop has to sit out.
/// Ticks are nominal intervals, so the window is expressed in ticks and the
/// loop advances its tick clock across the pause.
///
/// That advance covers the whole window, so under the threaded loop the
/// pause alone keeps the action from repeating. The tick-window check only
/// suppresses triggers when a host drives [`TickDriver::tick`] by hand and
/// never sits the pause out.
///
/// [`TickDriver::tick`]: crate::scheduler::TickDriver::tick
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cooldown {
    pause: Duration,
    window_ticks: u64,
    last_trigger_tick: Option<u64>,
}

impl Cooldown {
    pub fn new(pause: Duration, tick_interval: Duration) -> Self {
        let interval = tick_interval.as_nanos().max(1);
        let window_ticks = u64::try_from(pause.as_nanos().div_ceil(interval)).unwrap_or(u64::MAX);

        Self {
            pause,
            window_ticks,
            last_trigger_tick: None,
        }
    }

    pub fn pause(&self) -> Duration {
        self.pause
    }

    pub fn window_ticks(&self) -> u64 {
        self.window_ticks
    }

    pub fn last_trigger_tick(&self) -> Option<u64> {
        self.last_trigger_tick
    }

    pub fn is_cooling(&self, tick: u64) -> bool {
        self.last_trigger_tick
            .is_some_and(|last| tick.saturating_sub(last) < self.window_ticks)
    }

    /// Records a trigger at `tick` unless still cooling down
    ///
    /// Returns the pause to apply, or `None` when the trigger is suppressed.
    pub fn trigger(&mut self, tick: u64) -> Option<Duration> {
        if self.is_cooling(tick) {
            debug!(
                "Trigger at tick {} suppressed, cooling down since tick {:?}",
                tick, self.last_trigger_tick
            );
            return None;
        }

        self.last_trigger_tick = Some(tick);
        Some(self.pause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fullscreen() -> Cooldown {
        Cooldown::new(Duration::from_millis(100), Duration::from_millis(16))
    }

    #[test]
    fn window_rounds_up_to_whole_ticks() {
        assert_eq!(fullscreen().window_ticks(), 7);
        let exact = Cooldown::new(Duration::from_millis(100), Duration::from_millis(20));
        assert_eq!(exact.window_ticks(), 5);
    }

    #[test]
    fn first_trigger_passes_and_returns_pause() {
        let mut cooldown = fullscreen();
        assert_eq!(cooldown.trigger(3), Some(Duration::from_millis(100)));
        assert_eq!(cooldown.last_trigger_tick(), Some(3));
    }

    #[test]
    fn retrigger_inside_window_is_suppressed() {
        let mut cooldown = fullscreen();
        cooldown.trigger(10);
        for tick in 11..17 {
            assert_eq!(cooldown.trigger(tick), None, "tick {tick}");
        }
        assert_eq!(cooldown.last_trigger_tick(), Some(10));
        assert!(cooldown.trigger(17).is_some());
    }

    #[test]
    fn zero_pause_never_cools() {
        let mut cooldown = Cooldown::new(Duration::ZERO, Duration::from_millis(16));
        assert!(cooldown.trigger(1).is_some());
        assert!(cooldown.trigger(1).is_some());
    }
}
