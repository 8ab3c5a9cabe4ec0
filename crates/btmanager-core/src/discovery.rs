//! Accumulating radio discovery results.
//!
//! A scan produces "found" events from many callbacks over time. Each
//! source holds a cloned [`DiscoverySender`]; a single aggregator task owns
//! the list, folds events into it by address and republishes it as a
//! [`DeviceFeed`]. No list is ever shared mutably between sources.
//!
//! # Example
//!
//! ```
//! use btmanager_core::{DiscoveryCollector, DiscoveryEvent};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let collector = DiscoveryCollector::start();
//! let sender = collector.sender();
//!
//! sender.report(DiscoveryEvent::new(Some("Speaker"), "AA:BB", Some(-60)));
//! sender.report(DiscoveryEvent::new(Some("Speaker"), "AA:BB", Some(-52)));
//!
//! let devices = collector.finish().await;
//! assert_eq!(devices.len(), 1);
//! assert_eq!(devices[0].strength, -52);
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use btmanager_store::DeviceFeed;
use btmanager_types::Device;

use crate::error::Result;
use crate::traits::RadioAdapter;

/// One "device found" observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryEvent {
    /// Advertised name, if any.
    pub name: Option<String>,
    /// Hardware address.
    pub address: String,
    /// Signal strength in dBm, if reported.
    pub rssi: Option<i16>,
}

impl DiscoveryEvent {
    pub fn new(name: Option<&str>, address: impl Into<String>, rssi: Option<i16>) -> Self {
        Self {
            name: name.map(str::to_string),
            address: address.into(),
            rssi,
        }
    }

    /// Build a fresh unsynced record stamped with the current time.
    pub fn into_device(self) -> Device {
        Device::discovered(self.name.as_deref(), self.address, self.rssi)
    }
}

/// Cloneable handle event sources report through.
#[derive(Debug, Clone)]
pub struct DiscoverySender {
    tx: mpsc::UnboundedSender<DiscoveryEvent>,
}

impl DiscoverySender {
    /// Report an observation. Returns `false` once the collector has finished.
    pub fn report(&self, event: DiscoveryEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Owns the aggregator task for one discovery session.
#[derive(Debug)]
pub struct DiscoveryCollector {
    sender: DiscoverySender,
    feed: DeviceFeed,
    cancel: CancellationToken,
    task: JoinHandle<Vec<Device>>,
}

impl DiscoveryCollector {
    /// Spawn the aggregator. Must be called from within a Tokio runtime.
    pub fn start() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (publish, feed_rx) = watch::channel(Vec::new());
        let cancel = CancellationToken::new();

        let task = tokio::spawn(aggregate(rx, publish, cancel.clone()));

        Self {
            sender: DiscoverySender { tx },
            feed: DeviceFeed::from_receiver(feed_rx),
            cancel,
            task,
        }
    }

    /// A new handle for an event source.
    pub fn sender(&self) -> DiscoverySender {
        self.sender.clone()
    }

    /// Live view of the accumulated list, in first-seen order.
    pub fn feed(&self) -> DeviceFeed {
        self.feed.clone()
    }

    /// Stop accepting events and return the final list.
    ///
    /// Events already queued when this is called are still folded in.
    pub async fn finish(self) -> Vec<Device> {
        self.cancel.cancel();
        match self.task.await {
            Ok(devices) => devices,
            Err(e) => {
                debug!("Discovery aggregator ended abnormally: {}", e);
                self.feed.current()
            }
        }
    }
}

async fn aggregate(
    mut rx: mpsc::UnboundedReceiver<DiscoveryEvent>,
    publish: watch::Sender<Vec<Device>>,
    cancel: CancellationToken,
) -> Vec<Device> {
    let mut found = Found::default();

    loop {
        tokio::select! {
            biased;
            event = rx.recv() => match event {
                Some(event) => {
                    found.fold(event);
                    publish.send_replace(found.devices.clone());
                }
                None => break,
            },
            _ = cancel.cancelled() => break,
        }
    }

    rx.close();
    while let Ok(event) = rx.try_recv() {
        found.fold(event);
    }
    publish.send_replace(found.devices.clone());

    info!("Discovery finished with {} device(s)", found.devices.len());
    found.devices
}

#[derive(Default)]
struct Found {
    devices: Vec<Device>,
    index: HashMap<String, usize>,
}

impl Found {
    fn fold(&mut self, event: DiscoveryEvent) {
        if let Some(&i) = self.index.get(&event.address) {
            let existing = &mut self.devices[i];
            if let Some(name) = event.name {
                existing.name = name;
            }
            if let Some(rssi) = event.rssi {
                existing.strength = i32::from(rssi);
            }
            debug!(address = %existing.address, strength = existing.strength, "Updated device");
            return;
        }

        debug!(address = %event.address, "Discovered device");
        self.index.insert(event.address.clone(), self.devices.len());
        self.devices.push(event.into_device());
    }
}

/// Run one timed scan on `radio` and collect the results.
pub async fn discover_with(radio: Arc<dyn RadioAdapter>, duration: Duration) -> Result<Vec<Device>> {
    let collector = DiscoveryCollector::start();
    let scan = radio.discover(duration, collector.sender()).await;
    let devices = collector.finish().await;
    scan?;
    Ok(devices)
}
