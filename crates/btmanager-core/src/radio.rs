//! Radio adapter types.
//!
//! The platform Bluetooth stack sits behind [`RadioAdapter`](crate::RadioAdapter).
//! [`UnavailableRadio`] stands in when no adapter exists or the crate was
//! built without the `ble` feature.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::discovery::DiscoverySender;
use crate::error::{Error, Result};
use crate::traits::RadioAdapter;

/// A device paired at the OS level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondedPeer {
    /// Advertised or user-assigned name, if known.
    pub name: Option<String>,
    /// Hardware address.
    pub address: String,
}

impl BondedPeer {
    pub fn new(name: Option<&str>, address: impl Into<String>) -> Self {
        Self {
            name: name.map(str::to_string),
            address: address.into(),
        }
    }
}

/// Radio that fails every call with [`Error::RadioUnavailable`].
#[derive(Debug, Clone)]
pub struct UnavailableRadio {
    reason: String,
}

impl UnavailableRadio {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Default for UnavailableRadio {
    fn default() -> Self {
        Self::new("built without Bluetooth support")
    }
}

#[async_trait]
impl RadioAdapter for UnavailableRadio {
    async fn bonded_devices(&self) -> Result<Vec<BondedPeer>> {
        Err(Error::radio_unavailable(self.reason.clone()))
    }

    async fn discover(&self, _duration: Duration, _sender: DiscoverySender) -> Result<()> {
        Err(Error::radio_unavailable(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unavailable_radio_reports_reason() {
        let radio = UnavailableRadio::new("adapter powered off");
        let err = radio.bonded_devices().await.unwrap_err();
        assert!(matches!(err, Error::RadioUnavailable(ref r) if r == "adapter powered off"));
    }

    #[test]
    fn test_bonded_peer_new() {
        let peer = BondedPeer::new(None, "AA:BB");
        assert_eq!(peer.name, None);
        assert_eq!(peer.address, "AA:BB");
    }
}
