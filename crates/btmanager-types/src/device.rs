//! The device record.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize};

use crate::timestamp::current_timestamp;

/// Signal strength reported when no RSSI reading is available.
pub const UNKNOWN_STRENGTH: i32 = i16::MIN as i32;

/// One observation of a physical Bluetooth device.
///
/// The `address` is the identity of a record: equality and hashing only
/// look at it, so two observations of the same device compare equal even
/// when their signal strength or timestamps differ. Use
/// [`Device::same_contents`] to compare every field.
///
/// On the wire a device is a JSON object with `name`, `strength`,
/// `address` and `created_at`. The local `sync_state` flag is never
/// serialized and is `false` for every record parsed from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Device {
    /// Human-readable name, may be empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    /// RSSI in dBm, or [`UNKNOWN_STRENGTH`].
    #[serde(default = "unknown_strength")]
    pub strength: i32,
    /// Hardware address, the unique key.
    pub address: String,
    /// Creation timestamp in the fixed `created_at` format.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub created_at: String,
    /// Whether these exact field values have been persisted remotely.
    #[serde(skip)]
    pub sync_state: bool,
}

fn unknown_strength() -> i32 {
    UNKNOWN_STRENGTH
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Device {
    /// Create an unsynced record stamped with the current time.
    pub fn new(name: impl Into<String>, address: impl Into<String>, strength: i32) -> Self {
        Self {
            name: name.into(),
            strength,
            address: address.into(),
            created_at: current_timestamp(),
            sync_state: false,
        }
    }

    /// Create a record from a radio observation.
    ///
    /// A missing name becomes `""` and a missing RSSI becomes
    /// [`UNKNOWN_STRENGTH`].
    pub fn discovered(name: Option<&str>, address: impl Into<String>, rssi: Option<i16>) -> Self {
        Self::new(
            name.unwrap_or_default(),
            address,
            rssi.map_or(UNKNOWN_STRENGTH, i32::from),
        )
    }

    /// Whether the signal strength is known.
    pub fn has_strength(&self) -> bool {
        self.strength != UNKNOWN_STRENGTH && self.strength != -1
    }

    /// Return a copy flagged as synchronized.
    pub fn synced(mut self) -> Self {
        self.sync_state = true;
        self
    }

    /// Compare every field, not just the address.
    pub fn same_contents(&self, other: &Self) -> bool {
        self.address == other.address
            && self.name == other.name
            && self.strength == other.strength
            && self.created_at == other.created_at
            && self.sync_state == other.sync_state
    }
}

impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for Device {}

impl Hash for Device {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn device(address: &str, strength: i32) -> Device {
        Device {
            name: "Speaker".to_string(),
            strength,
            address: address.to_string(),
            created_at: "2018-11-06T16:16:05.500z".to_string(),
            sync_state: false,
        }
    }

    #[test]
    fn test_equality_is_by_address() {
        let a = device("AA:BB", -40);
        let mut b = device("AA:BB", -80);
        b.name = "Other".to_string();
        assert_eq!(a, b);
        assert!(!a.same_contents(&b));
        assert_ne!(a, device("CC:DD", -40));
    }

    #[test]
    fn test_hash_dedups_by_address() {
        let set: HashSet<Device> = [device("AA:BB", -40), device("AA:BB", -70), device("CC:DD", -50)]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_discovered_defaults() {
        let d = Device::discovered(None, "AA:BB", None);
        assert_eq!(d.name, "");
        assert_eq!(d.strength, UNKNOWN_STRENGTH);
        assert!(!d.has_strength());
        assert!(!d.sync_state);
        assert!(!d.created_at.is_empty());

        let d = Device::discovered(Some("Watch"), "AA:BB", Some(-62));
        assert_eq!(d.name, "Watch");
        assert_eq!(d.strength, -62);
        assert!(d.has_strength());
    }

    #[test]
    fn test_wire_format_field_names() {
        let json = serde_json::to_value(device("AA:BB", -40).synced()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        assert_eq!(obj["name"], "Speaker");
        assert_eq!(obj["strength"], -40);
        assert_eq!(obj["address"], "AA:BB");
        assert_eq!(obj["created_at"], "2018-11-06T16:16:05.500z");
        assert!(!obj.contains_key("sync_state"));
    }

    #[test]
    fn test_wire_round_trip_keeps_fields() {
        let original = device("AA:BB", -40);
        let json = serde_json::to_string(&original).unwrap();
        let parsed: Device = serde_json::from_str(&json).unwrap();
        assert!(parsed.same_contents(&original));
    }

    #[test]
    fn test_parse_never_carries_sync_state() {
        let json = r#"{"name":"x","strength":-3,"address":"AA:BB","created_at":"","sync_state":true}"#;
        let parsed: Device = serde_json::from_str(json).unwrap();
        assert!(!parsed.sync_state);
    }

    #[test]
    fn test_parse_tolerates_nulls_and_missing_fields() {
        let json = r#"{"name":null,"address":"AA:BB","created_at":null}"#;
        let parsed: Device = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.name, "");
        assert_eq!(parsed.created_at, "");
        assert_eq!(parsed.strength, UNKNOWN_STRENGTH);
    }

    #[test]
    fn test_parse_requires_address() {
        let json = r#"{"name":"x","strength":1,"created_at":""}"#;
        assert!(serde_json::from_str::<Device>(json).is_err());
    }
}
