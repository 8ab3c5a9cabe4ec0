//! Radio adapter over `btleplug`.
//!
//! Enabled with the `ble` feature. The adapter is the first one the
//! platform reports.
//!
//! btleplug has no notion of bonding, so [`BleRadio::bonded_devices`]
//! lists the peripherals the platform stack already knows about. On BlueZ
//! this includes paired devices without scanning.

use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, PeripheralId};
use futures::StreamExt;
use tracing::{debug, info};

use crate::discovery::{DiscoveryEvent, DiscoverySender};
use crate::error::{Error, Result};
use crate::radio::BondedPeer;
use crate::traits::RadioAdapter;

/// Radio backed by the platform Bluetooth stack.
#[derive(Debug, Clone)]
pub struct BleRadio {
    adapter: Adapter,
}

impl BleRadio {
    /// Use the first available adapter.
    pub async fn first_adapter() -> Result<Self> {
        let manager = Manager::new().await?;
        let adapter = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::radio_unavailable("no Bluetooth adapter found"))?;
        Ok(Self { adapter })
    }

    pub fn new(adapter: Adapter) -> Self {
        Self { adapter }
    }

    async fn observe(&self, id: &PeripheralId) -> Result<Option<DiscoveryEvent>> {
        let peripheral = self.adapter.peripheral(id).await?;
        let Some(properties) = peripheral.properties().await? else {
            return Ok(None);
        };
        Ok(Some(DiscoveryEvent::new(
            properties.local_name.as_deref(),
            properties.address.to_string(),
            properties.rssi,
        )))
    }
}

#[async_trait]
impl RadioAdapter for BleRadio {
    async fn bonded_devices(&self) -> Result<Vec<BondedPeer>> {
        let mut peers = Vec::new();
        for peripheral in self.adapter.peripherals().await? {
            match peripheral.properties().await {
                Ok(Some(properties)) => peers.push(BondedPeer::new(
                    properties.local_name.as_deref(),
                    properties.address.to_string(),
                )),
                Ok(None) => {}
                Err(e) => debug!("Error reading peripheral properties: {}", e),
            }
        }
        Ok(peers)
    }

    async fn discover(&self, duration: Duration, sender: DiscoverySender) -> Result<()> {
        let mut events = self.adapter.events().await?;

        info!("Starting BLE scan for {} seconds...", duration.as_secs());
        self.adapter.start_scan(ScanFilter::default()).await?;

        let deadline = tokio::time::sleep(duration);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => break,
                event = events.next() => match event {
                    Some(CentralEvent::DeviceDiscovered(id))
                    | Some(CentralEvent::DeviceUpdated(id)) => {
                        match self.observe(&id).await {
                            Ok(Some(found)) => {
                                if !sender.report(found) {
                                    break;
                                }
                            }
                            Ok(None) => {}
                            Err(e) => debug!("Error processing peripheral: {}", e),
                        }
                    }
                    Some(_) => {}
                    None => break,
                },
            }
        }

        self.adapter.stop_scan().await?;
        info!("Scan complete");
        Ok(())
    }
}
