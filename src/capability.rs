//! Optional host capabilities
//!
//! Both are injected at construction and may be absent, in which case the
//! scheduler treats every call as a no-op.

use std::fmt;
use std::sync::Arc;

/// On-screen messages the host may render after a parameter change
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OsdMessage {
    IrChanged,
    ArToggled,
    EfbCopyToggled,
    XfbChanged,
    FogToggled,
    SpeedChanged,
    VolumeChanged,
}

pub trait OsdNotifier: Send + Sync {
    fn show(&self, message: OsdMessage);
}

/// Forwarding target for the held sync button of passthrough peripherals
pub trait PeripheralSync: Send + Sync {
    fn update_sync_button(&self, pressed: bool);
}

#[derive(Clone, Default)]
pub struct HostCapabilities {
    pub notifier: Option<Arc<dyn OsdNotifier>>,
    pub peripheral_sync: Option<Arc<dyn PeripheralSync>>,
}

impl HostCapabilities {
    pub fn with_notifier(mut self, notifier: Arc<dyn OsdNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_peripheral_sync(mut self, sync: Arc<dyn PeripheralSync>) -> Self {
        self.peripheral_sync = Some(sync);
        self
    }

    pub fn show(&self, message: OsdMessage) {
        if let Some(notifier) = &self.notifier {
            notifier.show(message);
        }
    }

    pub fn update_sync_button(&self, pressed: bool) {
        if let Some(sync) = &self.peripheral_sync {
            sync.update_sync_button(pressed);
        }
    }
}

impl fmt::Debug for HostCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostCapabilities")
            .field("notifier", &self.notifier.is_some())
            .field("peripheral_sync", &self.peripheral_sync.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Messages(Mutex<Vec<OsdMessage>>);

    impl OsdNotifier for Messages {
        fn show(&self, message: OsdMessage) {
            self.0.lock().push(message);
        }
    }

    #[test]
    fn absent_capabilities_are_noops() {
        let caps = HostCapabilities::default();
        caps.show(OsdMessage::SpeedChanged);
        caps.update_sync_button(true);
    }

    #[test]
    fn notifier_receives_messages() {
        let messages = Arc::new(Messages::default());
        let caps = HostCapabilities::default().with_notifier(messages.clone());
        caps.show(OsdMessage::FogToggled);
        assert_eq!(*messages.0.lock(), vec![OsdMessage::FogToggled]);
    }
}
