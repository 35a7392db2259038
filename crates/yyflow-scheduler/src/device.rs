//! Device Status Monitor: latest battery / memory / CPU / network sample.
//!
//! Single writer (the platform collaborator), many readers. Each update
//! replaces the whole snapshot, so readers never see a half-applied sample.

use tokio::sync::watch;
use yyflow_core::types::{DeviceStatus, DeviceStatusUpdate};

pub struct DeviceMonitor {
    tx: watch::Sender<DeviceStatus>,
}

impl DeviceMonitor {
    pub fn new(initial: DeviceStatus) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> DeviceStatus {
        *self.tx.borrow()
    }

    /// Merge a partial update. Returns `(previous, current)`.
    pub fn apply(&self, update: &DeviceStatusUpdate) -> (DeviceStatus, DeviceStatus) {
        let previous = self.snapshot();
        let current = previous.merged(update);
        self.tx.send_replace(current);
        (previous, current)
    }

    /// Receive every subsequent sample.
    pub fn subscribe(&self) -> watch::Receiver<DeviceStatus> {
        self.tx.subscribe()
    }
}

impl Default for DeviceMonitor {
    fn default() -> Self {
        Self::new(DeviceStatus::default())
    }
}
