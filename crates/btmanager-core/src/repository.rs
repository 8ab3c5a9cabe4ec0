//! The device repository.
//!
//! [`DeviceRepository`] is the single entry point for reading and writing
//! device records. It reconciles three sources:
//!
//! - the local store, always written first
//! - the remote backend, which owns the shared list
//! - the radio, for bonded and discovered devices
//!
//! Remote failures never escape as errors. A failed push leaves the record
//! stored locally with `sync_state == false` for a later
//! [`synchronize_devices`](DeviceRepository::synchronize_devices) sweep, and
//! a failed fetch falls back to whatever the local store holds.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use btmanager_store::{DeviceFeed, Store};
use btmanager_types::Device;

use crate::cache::{CacheConfig, CachePolicy};
use crate::discovery::discover_with;
use crate::error::Result;
use crate::traits::{DeviceStore, RadioAdapter, RemoteSyncClient, SettingsStore};

/// Result of [`DeviceRepository::store_device`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOutcome {
    /// The backend accepted the record. Holds the copy now stored locally.
    Synced(Device),
    /// The backend was unreachable or refused; only the local copy exists.
    LocalOnly,
}

impl StoreOutcome {
    pub fn is_synced(&self) -> bool {
        matches!(self, Self::Synced(_))
    }

    /// The synced record, if any.
    pub fn synced_device(&self) -> Option<&Device> {
        match self {
            Self::Synced(device) => Some(device),
            Self::LocalOnly => None,
        }
    }
}

/// Summary of a retry sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Unsynced records found.
    pub attempted: usize,
    /// Records the backend accepted.
    pub synced: usize,
}

impl SyncReport {
    /// Records still waiting for a successful push.
    pub fn pending(&self) -> usize {
        self.attempted.saturating_sub(self.synced)
    }
}

/// Reads and writes device records across store, backend and radio.
pub struct DeviceRepository {
    store: Arc<dyn DeviceStore>,
    cache: CachePolicy,
    remote: Arc<dyn RemoteSyncClient>,
    radio: Arc<dyn RadioAdapter>,
}

impl std::fmt::Debug for DeviceRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRepository")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl DeviceRepository {
    /// Build a repository from its collaborators.
    ///
    /// `store` and `settings` are usually the same [`Store`]; see
    /// [`with_store`](Self::with_store).
    pub fn new(
        store: Arc<dyn DeviceStore>,
        settings: Arc<dyn SettingsStore>,
        remote: Arc<dyn RemoteSyncClient>,
        radio: Arc<dyn RadioAdapter>,
        config: CacheConfig,
    ) -> Self {
        let cache = CachePolicy::new(settings, store.clone(), config);
        Self {
            store,
            cache,
            remote,
            radio,
        }
    }

    /// Build a repository over one SQLite [`Store`].
    pub fn with_store(
        store: Arc<Store>,
        remote: Arc<dyn RemoteSyncClient>,
        radio: Arc<dyn RadioAdapter>,
        config: CacheConfig,
    ) -> Self {
        Self::new(store.clone(), store, remote, radio, config)
    }

    /// The cache policy in use.
    pub fn cache(&self) -> &CachePolicy {
        &self.cache
    }

    /// Upsert `device` locally, then push it to the backend.
    ///
    /// On success the stored row is overwritten with the backend's copy
    /// marked synced (two local writes). On remote failure the first write
    /// stands and [`StoreOutcome::LocalOnly`] is returned (one local write).
    ///
    /// # Errors
    ///
    /// Only local store failures are returned as `Err`.
    pub async fn store_device(&self, device: Device) -> Result<StoreOutcome> {
        self.store_locally(&device)?;
        self.push_remote(device).await
    }

    /// First half of [`store_device`](Self::store_device): the local upsert.
    pub fn store_locally(&self, device: &Device) -> Result<()> {
        self.store.upsert(device)?;
        debug!(address = %device.address, "Stored device locally");
        Ok(())
    }

    /// Second half of [`store_device`](Self::store_device): submit to the
    /// backend and record the outcome.
    pub async fn push_remote(&self, device: Device) -> Result<StoreOutcome> {
        match self.remote.add(&device).await {
            Ok(echo) => {
                let synced = echo.unwrap_or(device).synced();
                self.store.upsert(&synced)?;
                info!(address = %synced.address, "Device synced");
                Ok(StoreOutcome::Synced(synced))
            }
            Err(e) => {
                warn!(
                    address = %device.address,
                    error = %e,
                    "Remote add failed, device kept locally"
                );
                Ok(StoreOutcome::LocalOnly)
            }
        }
    }

    /// Cache-first read.
    ///
    /// Serves the live local feed while the cache is valid, otherwise
    /// delegates to [`refresh_cache`](Self::refresh_cache).
    pub async fn fetch_devices(&self) -> Result<DeviceFeed> {
        if self.cache.is_valid() {
            debug!("Cache valid, serving local devices");
            return self.store.read_all();
        }
        self.refresh_cache().await
    }

    /// Wipe local data and reload it from the backend.
    ///
    /// On success the fetched records are stored as synced and the cache is
    /// renewed. On failure the cache stays expired and the returned feed is
    /// the (empty) local table, indistinguishable from a backend with no
    /// devices.
    pub async fn refresh_cache(&self) -> Result<DeviceFeed> {
        self.cache.invalidate()?;

        match self.remote.fetch_all().await {
            Ok(devices) => {
                let count = devices.len();
                for device in devices {
                    self.store.upsert(&device.synced())?;
                }
                self.cache.renew()?;
                info!("Cache refreshed with {} device(s)", count);
            }
            Err(e) => {
                warn!(error = %e, "Remote fetch failed, serving local devices");
            }
        }

        self.store.read_all()
    }

    /// Devices paired at the OS level, as fresh unsynced records with
    /// unknown strength. Nothing is persisted.
    pub async fn find_bonded_devices(&self) -> Result<Vec<Device>> {
        let peers = self.radio.bonded_devices().await?;
        let devices: Vec<Device> = peers
            .into_iter()
            .map(|peer| Device::discovered(peer.name.as_deref(), peer.address, None))
            .collect();
        debug!("Found {} bonded device(s)", devices.len());
        Ok(devices)
    }

    /// Run a timed scan and return what was seen. Nothing is persisted.
    pub async fn discover_devices(&self, duration: Duration) -> Result<Vec<Device>> {
        discover_with(self.radio.clone(), duration).await
    }

    /// Retry sweep: push every unsynced record, oldest first.
    pub async fn synchronize_devices(&self) -> Result<SyncReport> {
        let pending = self.store.read_unsynced()?;
        let mut report = SyncReport {
            attempted: pending.len(),
            synced: 0,
        };

        if pending.is_empty() {
            debug!("No unsynced devices");
            return Ok(report);
        }

        info!("Synchronizing {} device(s)", pending.len());
        for device in pending {
            if self.store_device(device).await?.is_synced() {
                report.synced += 1;
            }
        }

        if report.pending() > 0 {
            warn!("{} device(s) still unsynced", report.pending());
        }
        Ok(report)
    }

    /// Now, in the record timestamp format. Empty on formatting failure.
    pub fn current_timestamp(&self) -> String {
        btmanager_types::current_timestamp()
    }
}
