use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::hotkey::{ActionRegistry, Hotkey, LogicalAction, Trigger};
use super::InputProvider;

// Previous and current sample of one action
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct ActionSampleState {
    previous: bool,
    current: bool,
}

impl ActionSampleState {
    fn push(&mut self, pressed: bool) {
        self.previous = self.current;
        self.current = pressed;
    }

    fn rising_edge(&self) -> bool {
        self.current && !self.previous
    }
}

/// Actions that fired during one tick
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickSnapshot {
    fired: HashSet<Hotkey>,
}

impl TickSnapshot {
    pub fn fired(&self, hotkey: Hotkey) -> bool {
        self.fired.contains(&hotkey)
    }

    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fired.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hotkey> {
        self.fired.iter()
    }
}

impl FromIterator<Hotkey> for TickSnapshot {
    fn from_iter<I: IntoIterator<Item = Hotkey>>(iter: I) -> Self {
        Self {
            fired: iter.into_iter().collect(),
        }
    }
}

/// Turns raw per-tick samples into fired events
///
/// Edge actions fire on the false -> true transition only; hold actions
/// report the raw sample. Every registered action is sampled on every call
/// to [`EdgeDetector::sample`], so a press lasting a single tick is always
/// seen.
#[derive(Debug, Default)]
pub struct EdgeDetector {
    samples: HashMap<Hotkey, ActionSampleState>,
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples every registered action once and collects the fired ones
    pub fn sample(&mut self, provider: &dyn InputProvider, registry: &ActionRegistry) -> TickSnapshot {
        let mut fired = HashSet::new();

        for action in registry.iter() {
            let pressed = provider.sample(action.hotkey, action.trigger == Trigger::Hold);
            if self.observe(action, pressed) {
                fired.insert(action.hotkey);
            }
        }

        if !fired.is_empty() {
            debug!("Fired this tick: {:?}", fired);
        }

        TickSnapshot { fired }
    }

    /// Feeds one sample for `action` and reports whether it fired
    pub fn observe(&mut self, action: &LogicalAction, pressed: bool) -> bool {
        let state = self.samples.entry(action.hotkey).or_default();
        state.push(pressed);

        match action.trigger {
            Trigger::Edge => state.rising_edge(),
            Trigger::Hold => state.current,
        }
    }
}
