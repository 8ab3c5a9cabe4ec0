//! Integration tests for btmanager-store using on-disk databases.

use std::sync::Arc;

use btmanager_store::Store;
use btmanager_types::Device;
use proptest::prelude::*;

fn record(address: &str, name: &str, strength: i32, created_at: &str, synced: bool) -> Device {
    Device {
        name: name.to_string(),
        strength,
        address: address.to_string(),
        created_at: created_at.to_string(),
        sync_state: synced,
    }
}

#[test]
fn test_open_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("devices.db");

    let store = Store::open(&path).unwrap();
    store
        .upsert_device(&record("AA:BB", "Speaker", -40, "2018-11-06T08:00:00.000z", false))
        .unwrap();

    assert!(path.exists());
}

#[test]
fn test_data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("devices.db");

    {
        let store = Store::open(&path).unwrap();
        store
            .upsert_device(&record("AA:BB", "Speaker", -40, "2018-11-06T08:00:00.000z", true))
            .unwrap();
        store.put_setting_i64("cache_expiration_ms", 123).unwrap();
    }

    let store = Store::open(&path).unwrap();
    let device = store.get_device("AA:BB").unwrap().unwrap();
    assert_eq!(device.name, "Speaker");
    assert!(device.sync_state);
    assert_eq!(store.get_setting_i64("cache_expiration_ms").unwrap(), Some(123));
}

#[test]
fn test_concurrent_upserts_from_many_threads() {
    let store = Arc::new(Store::open_in_memory().unwrap());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 0..25 {
                    let address = format!("{t:02X}:{i:02X}");
                    store
                        .upsert_device(&record(&address, "x", -1, "2018-11-06T08:00:00.000z", false))
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.count_devices().unwrap(), 200);
}

#[test]
fn test_same_address_last_write_wins_across_threads() {
    let store = Arc::new(Store::open_in_memory().unwrap());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                store
                    .upsert_device(&record("AA:BB", &format!("writer {t}"), t, "", false))
                    .unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.count_devices().unwrap(), 1);
    let survivor = store.get_device("AA:BB").unwrap().unwrap();
    assert_eq!(survivor.name, format!("writer {}", survivor.strength));
}

proptest! {
    /// Upserting B after A with the same address leaves exactly one row
    /// holding B's values.
    #[test]
    fn upsert_same_address_keeps_latest(
        address in "[0-9A-F]{2}(:[0-9A-F]{2}){5}",
        first_name in "[a-zA-Z0-9 ]{0,16}",
        second_name in "[a-zA-Z0-9 ]{0,16}",
        first_strength: i32,
        second_strength: i32,
        first_synced: bool,
        second_synced: bool,
    ) {
        let store = Store::open_in_memory().unwrap();
        let a = record(&address, &first_name, first_strength, "2018-11-06T08:00:00.000z", first_synced);
        let b = record(&address, &second_name, second_strength, "2018-11-06T09:00:00.000z", second_synced);

        store.upsert_device(&a).unwrap();
        store.upsert_device(&b).unwrap();

        let rows = store.list_devices().unwrap();
        prop_assert_eq!(rows.len(), 1);
        prop_assert!(rows[0].same_contents(&b));
    }
}
