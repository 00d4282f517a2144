//! Clamped numeric adjustment with an optional snap band
//!
//! Each adjustable parameter carries its own policy. Emulation speed snaps to
//! its default inside a band around 1.0 and when a step would take it to zero
//! or below; stereo depth and convergence only clamp. The constructors below
//! are the single place where those per-parameter policies are decided.

use tracing::debug;

/// How one step changes the value
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepScale {
    /// `current ± step`
    Linear,
    /// `current * step` / `current / step`
    Geometric,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NumericAdjustable {
    pub current: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub scale: StepScale,
    /// Results inside `[low, high]` snap to `snap_target`. A zero-width band
    /// is treated as disabled.
    pub snap_band: Option<(f64, f64)>,
    pub snap_target: f64,
    /// Results at or below zero snap to `snap_target`
    pub snap_degenerate: bool,
}

impl NumericAdjustable {
    pub fn new(current: f64, min: f64, max: f64, step: f64) -> Self {
        Self {
            current,
            min,
            max,
            step,
            scale: StepScale::Linear,
            snap_band: None,
            snap_target: current,
            snap_degenerate: false,
        }
    }

    pub fn geometric(mut self) -> Self {
        self.scale = StepScale::Geometric;
        self
    }

    pub fn with_snap_band(mut self, low: f64, high: f64, target: f64) -> Self {
        self.snap_band = Some((low, high));
        self.snap_target = target;
        self
    }

    pub fn with_degenerate_snap(mut self) -> Self {
        self.snap_degenerate = true;
        self
    }

    /// Same policy, different current value
    pub fn at(&self, current: f64) -> Self {
        Self {
            current,
            ..self.clone()
        }
    }

    pub fn increase(&mut self) -> f64 {
        self.adjust(Direction::Up)
    }

    pub fn decrease(&mut self) -> f64 {
        self.adjust(Direction::Down)
    }

    pub fn adjust(&mut self, direction: Direction) -> f64 {
        let raw = match (self.scale, direction) {
            (StepScale::Linear, Direction::Up) => self.current + self.step,
            (StepScale::Linear, Direction::Down) => self.current - self.step,
            (StepScale::Geometric, Direction::Up) => self.current * self.step,
            (StepScale::Geometric, Direction::Down) => self.current / self.step,
        };
        let next = self.resolve(raw);
        debug!("Adjusted {} -> {} (raw {})", self.current, next, raw);
        self.current = next;
        next
    }

    /// Resets to the snap target
    pub fn reset(&mut self) -> f64 {
        self.current = self.snap_target;
        self.current
    }

    fn resolve(&self, raw: f64) -> f64 {
        if self.snaps(raw) {
            self.snap_target
        } else {
            raw.clamp(self.min, self.max)
        }
    }

    fn snaps(&self, raw: f64) -> bool {
        let in_band = match self.snap_band {
            Some((low, high)) if low < high => (low..=high).contains(&raw),
            _ => false,
        };
        in_band || (self.snap_degenerate && raw <= 0.0)
    }

    pub fn emulation_speed(current: f64) -> Self {
        Self::new(current, 0.0, f64::INFINITY, 0.1)
            .with_snap_band(0.95, 1.05, 1.0)
            .with_degenerate_snap()
    }

    pub fn stereo_depth(current: f64) -> Self {
        Self::new(current, 0.0, 100.0, 1.0)
    }

    pub fn stereo_convergence(current: f64) -> Self {
        Self::new(current, 0.0, 500.0, 5.0)
    }

    /// Internal resolution scale; 0 is "auto"
    pub fn internal_resolution(current: f64) -> Self {
        Self::new(current, 0.0, 16.0, 1.0)
    }

    pub fn volume(current: f64) -> Self {
        Self::new(current, 0.0, 100.0, 3.0)
    }

    pub fn freelook_speed() -> Self {
        let mut speed = Self::new(1.0, f64::MIN_POSITIVE, f64::MAX, 1.1).geometric();
        speed.snap_target = 1.0;
        speed
    }
}
