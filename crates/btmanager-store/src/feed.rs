//! Live view of the device table.

use tokio::sync::watch;

use btmanager_types::Device;

/// An observable, ordered list of devices.
///
/// A feed obtained from [`Store::read_devices`](crate::Store::read_devices)
/// is republished after every write to the store, so holders are notified
/// of later upserts and wipes instead of keeping a stale snapshot. A feed
/// built with [`DeviceFeed::fixed`] never changes.
#[derive(Debug, Clone)]
pub struct DeviceFeed {
    rx: watch::Receiver<Vec<Device>>,
}

impl DeviceFeed {
    /// Wrap a watch receiver owned by some other publisher.
    pub fn from_receiver(rx: watch::Receiver<Vec<Device>>) -> Self {
        Self { rx }
    }

    /// A feed over a list that will never change.
    pub fn fixed(devices: Vec<Device>) -> Self {
        let (_tx, rx) = watch::channel(devices);
        Self { rx }
    }

    /// The latest published list.
    pub fn current(&self) -> Vec<Device> {
        self.rx.borrow().clone()
    }

    /// Whether a newer list was published since the last one seen.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Wait for the next published list.
    ///
    /// Returns `None` once the source is gone (or for fixed feeds).
    pub async fn changed(&mut self) -> Option<Vec<Device>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
