//! Platform-agnostic types for the Bluetooth device manager.
//!
//! This crate holds the [`Device`] record shared by the store, the sync
//! core and the remote backend, together with the fixed timestamp format
//! used for the `created_at` field.
//!
//! # Example
//!
//! ```
//! use btmanager_types::{Device, UNKNOWN_STRENGTH};
//!
//! let device = Device::discovered(Some("Headphones"), "AA:BB:CC:DD:EE:FF", None);
//! assert_eq!(device.strength, UNKNOWN_STRENGTH);
//! assert!(!device.sync_state);
//! ```

pub mod device;
pub mod error;
pub mod timestamp;

pub use device::{Device, UNKNOWN_STRENGTH};
pub use error::{ParseError, ParseResult};
pub use timestamp::{current_timestamp, display_timestamp, parse_timestamp};
