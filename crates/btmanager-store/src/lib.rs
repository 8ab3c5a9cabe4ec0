//! Local data persistence for discovered Bluetooth devices.
//!
//! This crate provides SQLite-based storage for device records plus a
//! small key-value settings table used for cache metadata.
//!
//! # Features
//!
//! - Upsert device records keyed by hardware address
//! - Live, ordered view of the device table ([`DeviceFeed`])
//! - Snapshot of records not yet confirmed by the remote backend
//! - Integer settings (e.g. cache expiration)
//!
//! # Example
//!
//! ```
//! use btmanager_store::Store;
//! use btmanager_types::Device;
//!
//! let store = Store::open_in_memory()?;
//! store.upsert_device(&Device::new("Speaker", "AA:BB:CC:DD:EE:FF", -48))?;
//!
//! let feed = store.read_devices();
//! assert_eq!(feed.current().len(), 1);
//! # Ok::<(), btmanager_store::Error>(())
//! ```

mod error;
mod feed;
mod schema;
mod store;

pub use error::{Error, Result};
pub use feed::DeviceFeed;
pub use store::Store;

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/btmanager/devices.db`
/// - macOS: `~/Library/Application Support/btmanager/devices.db`
/// - Windows: `C:\Users\<user>\AppData\Local\btmanager\devices.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("btmanager")
        .join("devices.db")
}
