//! Repository behavior against mock collaborators.
//!
//! The store is wrapped so that its calls land in the same ordered
//! [`CallLog`] as the mock backend's, which lets tests assert on write
//! counts and on the order of local and remote calls.

use std::sync::Arc;

use btmanager_core::{
    BondedPeer, CACHE_EXPIRATION_KEY, CacheConfig, CallLog, Device, DeviceFeed, DeviceRepository,
    DeviceStore, EXPIRED_SENTINEL, Error, MockRadio, MockRemote, Result, SettingsStore, Store,
    UNKNOWN_STRENGTH,
};

struct RecordingStore {
    inner: Arc<Store>,
    log: CallLog,
}

impl DeviceStore for RecordingStore {
    fn upsert(&self, device: &Device) -> Result<()> {
        self.log.record(format!("store.upsert {}", device.address));
        DeviceStore::upsert(self.inner.as_ref(), device)
    }

    fn read_all(&self) -> Result<DeviceFeed> {
        self.log.record("store.read_all");
        self.inner.read_all()
    }

    fn read_unsynced(&self) -> Result<Vec<Device>> {
        self.log.record("store.read_unsynced");
        DeviceStore::read_unsynced(self.inner.as_ref())
    }

    fn delete_all(&self) -> Result<()> {
        self.log.record("store.delete_all");
        DeviceStore::delete_all(self.inner.as_ref())
    }
}

struct Harness {
    store: Arc<Store>,
    remote: MockRemote,
    radio: MockRadio,
    log: CallLog,
    repo: DeviceRepository,
}

impl Harness {
    fn new() -> Self {
        Self::with(MockRemote::new(), MockRadio::new())
    }

    fn with(remote: MockRemote, radio: MockRadio) -> Self {
        let log = CallLog::new();
        let remote = remote.with_call_log(log.clone());
        let store = Arc::new(Store::open_in_memory().unwrap());
        let recording = Arc::new(RecordingStore {
            inner: store.clone(),
            log: log.clone(),
        });
        let repo = DeviceRepository::new(
            recording,
            store.clone(),
            Arc::new(remote.clone()),
            Arc::new(radio.clone()),
            CacheConfig::default(),
        );
        Self {
            store,
            remote,
            radio,
            log,
            repo,
        }
    }

    fn upserts(&self) -> usize {
        self.log.count("store.upsert")
    }
}

fn stamped(name: &str, address: &str, created_at: &str) -> Device {
    let mut device = Device::new(name, address, -50);
    device.created_at = created_at.to_string();
    device
}

#[tokio::test]
async fn store_device_success_writes_twice() {
    let h = Harness::new();

    let outcome = h
        .repo
        .store_device(Device::new("Speaker", "AA:BB", -48))
        .await
        .unwrap();

    assert!(outcome.is_synced());
    assert_eq!(h.upserts(), 2);
    assert_eq!(
        h.log.entries(),
        ["store.upsert AA:BB", "remote.add AA:BB", "store.upsert AA:BB"]
    );
    assert!(h.store.get_device("AA:BB").unwrap().unwrap().sync_state);
    assert_eq!(h.store.count_devices().unwrap(), 1);
}

#[tokio::test]
async fn store_device_failure_writes_once() {
    let h = Harness::new();
    h.remote.set_fail_add(true);

    let outcome = h
        .repo
        .store_device(Device::new("Speaker", "AA:BB", -48))
        .await
        .unwrap();

    assert!(!outcome.is_synced());
    assert_eq!(h.upserts(), 1);
    let row = h.store.get_device("AA:BB").unwrap().unwrap();
    assert!(!row.sync_state);
}

#[tokio::test]
async fn store_device_uses_original_when_server_echoes_nothing() {
    let h = Harness::new();
    h.remote.set_echo_none(true);
    let device = Device::new("Speaker", "AA:BB", -48);

    let outcome = h.repo.store_device(device.clone()).await.unwrap();

    let synced = outcome.synced_device().unwrap();
    assert_eq!(synced.created_at, device.created_at);
    assert!(synced.sync_state);
    assert_eq!(h.upserts(), 2);
}

#[tokio::test]
async fn store_device_keeps_server_created_at() {
    let h = Harness::new();
    h.remote
        .set_created_at_override(Some("2030-01-01T00:00:00.000z"));

    h.repo
        .store_device(Device::new("Speaker", "AA:BB", -48))
        .await
        .unwrap();

    let row = h.store.get_device("AA:BB").unwrap().unwrap();
    assert_eq!(row.created_at, "2030-01-01T00:00:00.000z");
}

#[tokio::test]
async fn fetch_with_valid_cache_skips_remote() {
    let h = Harness::new();
    h.repo.cache().renew().unwrap();
    h.store
        .upsert_device(&Device::new("local", "AA:BB", -1))
        .unwrap();

    let feed = h.repo.fetch_devices().await.unwrap();

    assert_eq!(feed.current().len(), 1);
    assert_eq!(h.remote.fetch_count(), 0);
    assert_eq!(h.remote.add_count(), 0);
}

#[tokio::test]
async fn fetch_with_missing_cache_refreshes_once() {
    let h = Harness::new();

    let feed = h.repo.fetch_devices().await.unwrap();

    // 200 with an empty list: renewed, empty result
    assert!(feed.current().is_empty());
    assert_eq!(h.remote.fetch_count(), 1);
    assert!(h.repo.cache().is_valid());
    assert_eq!(h.log.count("store.delete_all"), 1);
}

#[tokio::test]
async fn fetch_with_expired_cache_replaces_local_data() {
    let server = vec![
        stamped("b", "BB", "2021-01-02T00:00:00.000z"),
        stamped("a", "AA", "2021-01-01T00:00:00.000z"),
    ];
    let h = Harness::with(MockRemote::new().with_devices(server), MockRadio::new());
    h.store
        .upsert_device(&Device::new("stale", "ZZ", -1))
        .unwrap();
    h.store
        .put_setting_i64(CACHE_EXPIRATION_KEY, EXPIRED_SENTINEL)
        .unwrap();

    let feed = h.repo.fetch_devices().await.unwrap();
    let devices = feed.current();

    let addresses: Vec<_> = devices.iter().map(|d| d.address.as_str()).collect();
    assert_eq!(addresses, ["AA", "BB"]);
    assert!(devices.iter().all(|d| d.sync_state));
    assert!(h.store.get_device("ZZ").unwrap().is_none());
    assert!(h.repo.cache().is_valid());
}

#[tokio::test]
async fn refresh_wipes_before_fetching() {
    let h = Harness::new();

    h.repo.refresh_cache().await.unwrap();

    let entries = h.log.entries();
    let wipe = entries.iter().position(|e| e == "store.delete_all").unwrap();
    let fetch = entries
        .iter()
        .position(|e| e == "remote.fetch_all")
        .unwrap();
    assert!(wipe < fetch);
}

#[tokio::test]
async fn refresh_failure_leaves_cache_expired() {
    let h = Harness::new();
    h.remote.set_fail_fetch(true);
    h.store
        .upsert_device(&Device::new("local", "AA", -1))
        .unwrap();

    let feed = h.repo.refresh_cache().await.unwrap();

    assert!(feed.current().is_empty());
    assert!(!h.repo.cache().is_valid());
    assert_eq!(
        h.store.get_setting_i64(CACHE_EXPIRATION_KEY).unwrap(),
        Some(EXPIRED_SENTINEL)
    );
}

#[tokio::test]
async fn fetched_feed_observes_later_writes() {
    let h = Harness::new();
    let mut feed = h.repo.fetch_devices().await.unwrap();
    assert!(feed.current().is_empty());

    h.repo
        .store_device(Device::new("new", "AA", -1))
        .await
        .unwrap();

    let latest = feed.changed().await.unwrap();
    assert!(!latest.is_empty());
    assert_eq!(feed.current()[0].address, "AA");
}

#[tokio::test]
async fn synchronize_pushes_unsynced_oldest_first() {
    let h = Harness::new();
    h.store
        .upsert_device(&stamped("second", "BB", "2021-01-02T00:00:00.000z"))
        .unwrap();
    h.store
        .upsert_device(&stamped("first", "AA", "2021-01-01T00:00:00.000z"))
        .unwrap();
    h.store
        .upsert_device(&stamped("done", "CC", "2020-01-01T00:00:00.000z").synced())
        .unwrap();

    let report = h.repo.synchronize_devices().await.unwrap();

    assert_eq!(report.attempted, 2);
    assert_eq!(report.synced, 2);
    let added: Vec<_> = h.remote.added().into_iter().map(|d| d.address).collect();
    assert_eq!(added, ["AA", "BB"]);
    assert!(h.store.read_unsynced().unwrap().is_empty());
}

#[tokio::test]
async fn synchronize_with_nothing_pending_makes_no_calls() {
    let h = Harness::new();
    h.store
        .upsert_device(&Device::new("done", "CC", -1).synced())
        .unwrap();

    let report = h.repo.synchronize_devices().await.unwrap();

    assert_eq!(report.attempted, 0);
    assert_eq!(h.remote.add_count(), 0);
    assert_eq!(h.upserts(), 0);
}

#[tokio::test]
async fn synchronize_reports_failures_and_can_rerun() {
    let h = Harness::new();
    h.store
        .upsert_device(&stamped("a", "AA", "2021-01-01T00:00:00.000z"))
        .unwrap();
    h.remote.set_fail_add(true);

    let report = h.repo.synchronize_devices().await.unwrap();
    assert_eq!(report.pending(), 1);
    assert_eq!(h.store.read_unsynced().unwrap().len(), 1);

    h.remote.set_fail_add(false);
    let report = h.repo.synchronize_devices().await.unwrap();
    assert_eq!(report.synced, 1);
    assert!(h.store.read_unsynced().unwrap().is_empty());
}

#[tokio::test]
async fn bonded_devices_are_fresh_and_unpersisted() {
    let radio = MockRadio::new().with_peers(vec![
        BondedPeer::new(Some("Headphones"), "11:22"),
        BondedPeer::new(None, "33:44"),
    ]);
    let h = Harness::with(MockRemote::new(), radio);

    let devices = h.repo.find_bonded_devices().await.unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].name, "Headphones");
    assert_eq!(devices[1].name, "");
    assert!(devices.iter().all(|d| d.strength == UNKNOWN_STRENGTH));
    assert!(devices.iter().all(|d| !d.sync_state));
    assert!(devices.iter().all(|d| !d.created_at.is_empty()));
    assert_eq!(h.store.count_devices().unwrap(), 0);
    assert_eq!(h.radio.bonded_calls(), 1);
}

#[tokio::test]
async fn bonded_devices_surface_radio_errors() {
    let h = Harness::new();
    h.radio.set_should_fail(true);

    let err = h.repo.find_bonded_devices().await.unwrap_err();
    assert!(matches!(err, Error::RadioUnavailable(_)));
}

#[tokio::test]
async fn discover_devices_folds_events() {
    use btmanager_core::DiscoveryEvent;
    use std::time::Duration;

    let radio = MockRadio::new().with_events(vec![
        DiscoveryEvent::new(Some("Speaker"), "AA", Some(-70)),
        DiscoveryEvent::new(None, "BB", None),
        DiscoveryEvent::new(Some("Speaker"), "AA", Some(-40)),
    ]);
    let h = Harness::with(MockRemote::new(), radio);

    let devices = h
        .repo
        .discover_devices(Duration::from_millis(10))
        .await
        .unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].strength, -40);
    assert_eq!(devices[1].strength, UNKNOWN_STRENGTH);
    assert_eq!(h.store.count_devices().unwrap(), 0);
}

#[test]
fn settings_trait_is_backed_by_store() {
    let store = Store::open_in_memory().unwrap();
    SettingsStore::put_i64(&store, "k", 7).unwrap();
    assert_eq!(SettingsStore::get_i64(&store, "k").unwrap(), Some(7));
}
