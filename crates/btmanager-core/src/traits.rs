//! Trait abstractions for the repository's collaborators.
//!
//! The [`DeviceRepository`](crate::DeviceRepository) is built from four
//! seams so each can be swapped for a test double:
//!
//! - [`DeviceStore`]: the device table
//! - [`SettingsStore`]: scalar settings such as the cache expiration
//! - [`RemoteSyncClient`]: the HTTP backend
//! - [`RadioAdapter`]: the platform Bluetooth stack
//!
//! [`Store`] implements both storage traits.

use std::time::Duration;

use async_trait::async_trait;

use btmanager_store::{DeviceFeed, Store};
use btmanager_types::Device;

use crate::discovery::DiscoverySender;
use crate::error::Result;
use crate::radio::BondedPeer;
use crate::remote::RemoteResult;

/// Durable table of device records keyed by address.
///
/// Calls are synchronous but may be made from any task, including
/// network continuations running off the worker queue.
pub trait DeviceStore: Send + Sync {
    /// Insert or replace the record with the same address.
    fn upsert(&self, device: &Device) -> Result<()>;

    /// Live view of every record ordered by `created_at` ascending.
    fn read_all(&self) -> Result<DeviceFeed>;

    /// Snapshot of records with `sync_state == false`, ordered by
    /// `created_at` ascending.
    fn read_unsynced(&self) -> Result<Vec<Device>>;

    /// Remove every record.
    fn delete_all(&self) -> Result<()>;
}

/// Small key-value store for integer settings.
pub trait SettingsStore: Send + Sync {
    /// Read a value, `None` if absent.
    fn get_i64(&self, key: &str) -> Result<Option<i64>>;

    /// Write a value.
    fn put_i64(&self, key: &str, value: i64) -> Result<()>;
}

/// Remote backend holding the shared device list.
///
/// Implementations map transport errors, non-success statuses and
/// malformed bodies to [`RemoteError`](crate::RemoteError); the repository
/// treats all of them as one "remote failure".
#[async_trait]
pub trait RemoteSyncClient: Send + Sync {
    /// Fetch the full device list.
    async fn fetch_all(&self) -> RemoteResult<Vec<Device>>;

    /// Persist one device. Returns the server's copy, or `None` when the
    /// server answered without a body.
    async fn add(&self, device: &Device) -> RemoteResult<Option<Device>>;
}

/// Platform Bluetooth capabilities the core relies on.
#[async_trait]
pub trait RadioAdapter: Send + Sync {
    /// Devices paired at the OS level, enumerable without scanning.
    async fn bonded_devices(&self) -> Result<Vec<BondedPeer>>;

    /// Scan for `duration`, reporting every observation to `sender`.
    async fn discover(&self, duration: Duration, sender: DiscoverySender) -> Result<()>;
}

impl DeviceStore for Store {
    fn upsert(&self, device: &Device) -> Result<()> {
        Ok(self.upsert_device(device)?)
    }

    fn read_all(&self) -> Result<DeviceFeed> {
        Ok(self.read_devices())
    }

    fn read_unsynced(&self) -> Result<Vec<Device>> {
        Ok(Store::read_unsynced(self)?)
    }

    fn delete_all(&self) -> Result<()> {
        Store::delete_all(self)?;
        Ok(())
    }
}

impl SettingsStore for Store {
    fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.get_setting_i64(key)?)
    }

    fn put_i64(&self, key: &str, value: i64) -> Result<()> {
        Ok(self.put_setting_i64(key, value)?)
    }
}
