//! In-process input provider and lifecycle
//!
//! `VirtualInput` holds the pressed set in memory so a host (or a test) can
//! press, release and tap logical actions directly, without a device layer.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use super::{HostLifecycle, HostState, Hotkey, InputProvider};

#[derive(Debug)]
pub struct VirtualInput {
    pressed: Mutex<HashSet<Hotkey>>,
    // Reported as pressed for exactly one sample
    taps: Mutex<HashSet<Hotkey>>,
    enabled: AtomicBool,
    refreshes: AtomicUsize,
}

impl Default for VirtualInput {
    fn default() -> Self {
        Self {
            pressed: Mutex::new(HashSet::new()),
            taps: Mutex::new(HashSet::new()),
            enabled: AtomicBool::new(true),
            refreshes: AtomicUsize::new(0),
        }
    }
}

impl VirtualInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self, hotkey: Hotkey) {
        debug!("Virtual press: {}", hotkey);
        self.pressed.lock().insert(hotkey);
    }

    pub fn release(&self, hotkey: Hotkey) {
        debug!("Virtual release: {}", hotkey);
        self.pressed.lock().remove(&hotkey);
    }

    /// Press that lasts for the next sample of `hotkey` only
    pub fn tap(&self, hotkey: Hotkey) {
        debug!("Virtual tap: {}", hotkey);
        self.taps.lock().insert(hotkey);
    }

    pub fn release_all(&self) {
        self.pressed.lock().clear();
        self.taps.lock().clear();
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Number of `refresh_input_sources` calls seen so far
    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

impl InputProvider for VirtualInput {
    fn sample(&self, hotkey: Hotkey, _hold: bool) -> bool {
        self.pressed.lock().contains(&hotkey) || self.taps.lock().remove(&hotkey)
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn refresh_input_sources(&self) {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Host lifecycle that can be flipped from any thread
#[derive(Debug, Default)]
pub struct SharedLifecycle {
    state: RwLock<HostState>,
}

impl SharedLifecycle {
    pub fn new(state: HostState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    pub fn set(&self, state: HostState) {
        debug!("Host state -> {:?}", state);
        *self.state.write() = state;
    }
}

impl HostLifecycle for SharedLifecycle {
    fn state(&self) -> HostState {
        *self.state.read()
    }
}
