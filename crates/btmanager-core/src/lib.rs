//! Device synchronization and caching core.
//!
//! This crate reconciles three sources of device records: live radio
//! observations, the local SQLite store, and a remote HTTP backend. Local
//! data is served while a time-based cache window is open; outside it the
//! store is wiped and refilled from the backend.
//!
//! # Components
//!
//! - [`CachePolicy`]: decides whether local data is fresh enough
//! - [`DeviceRepository`]: upsert-then-sync writes, cache-first reads,
//!   retry sweep for unsynced records, bonded device enumeration
//! - [`HttpDeviceClient`]: `reqwest` implementation of [`RemoteSyncClient`]
//! - [`RepositoryWorker`]: single background queue serializing repository calls
//! - [`DiscoveryCollector`]: folds concurrent radio observations into one feed
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use btmanager_core::{CacheConfig, DeviceRepository, HttpDeviceClient, UnavailableRadio};
//! use btmanager_store::Store;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(Store::open_default()?);
//!     let remote = Arc::new(HttpDeviceClient::new("https://devices.example.com/api")?);
//!     let radio = Arc::new(UnavailableRadio::default());
//!
//!     let repo = DeviceRepository::with_store(store, remote, radio, CacheConfig::default());
//!     let feed = repo.fetch_devices().await?;
//!     for device in feed.current() {
//!         println!("{} {}", device.address, device.name);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod discovery;
pub mod error;
pub mod mock;
pub mod radio;
pub mod remote;
pub mod repository;
pub mod traits;
pub mod worker;

#[cfg(feature = "ble")]
pub mod ble;

pub use cache::{CACHE_EXPIRATION_KEY, CacheConfig, CachePolicy, EXPIRED_SENTINEL};
pub use discovery::{DiscoveryCollector, DiscoveryEvent, DiscoverySender, discover_with};
pub use error::{Error, Result};
pub use mock::{CallLog, MockRadio, MockRemote};
pub use radio::{BondedPeer, UnavailableRadio};
pub use remote::{HttpDeviceClient, RemoteError, RemoteResult};
pub use repository::{DeviceRepository, StoreOutcome, SyncReport};
pub use traits::{DeviceStore, RadioAdapter, RemoteSyncClient, SettingsStore};
pub use worker::{Command, RepositoryWorker, WorkerHandle};

#[cfg(feature = "ble")]
pub use ble::BleRadio;

// Re-export from the sibling crates
pub use btmanager_store::{DeviceFeed, Store};
pub use btmanager_types::{Device, UNKNOWN_STRENGTH};
