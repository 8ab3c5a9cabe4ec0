//! Test doubles for the remote backend and the radio.
//!
//! Both mocks are cheap to clone and share their state, so a test can hand
//! one clone to a [`DeviceRepository`](crate::DeviceRepository) and keep
//! another to inspect calls and inject failures.
//!
//! # Features
//!
//! - **Failure injection**: make `fetch_all`, `add` or the radio fail
//! - **Call counting**: assert how many round-trips an operation made
//! - **Shared call log**: interleave store and remote calls in one ordered log
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use btmanager_core::{CacheConfig, DeviceRepository, MockRadio, MockRemote, Store};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let remote = MockRemote::new();
//! remote.set_fail_fetch(true);
//!
//! let store = Arc::new(Store::open_in_memory().unwrap());
//! let repo = DeviceRepository::with_store(
//!     store,
//!     Arc::new(remote.clone()),
//!     Arc::new(MockRadio::new()),
//!     CacheConfig::default(),
//! );
//!
//! let feed = repo.fetch_devices().await.unwrap();
//! assert!(feed.current().is_empty());
//! assert_eq!(remote.fetch_count(), 1);
//! # }
//! ```

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use btmanager_types::Device;

use crate::discovery::{DiscoveryEvent, DiscoverySender};
use crate::error::{Error, Result};
use crate::radio::BondedPeer;
use crate::remote::{RemoteError, RemoteResult};
use crate::traits::{RadioAdapter, RemoteSyncClient};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Ordered record of calls made across several test doubles.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&self, entry: impl Into<String>) {
        lock(&self.entries).push(entry.into());
    }

    /// Every entry so far, oldest first.
    pub fn entries(&self) -> Vec<String> {
        lock(&self.entries).clone()
    }

    /// Number of entries starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        lock(&self.entries)
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }

    pub fn clear(&self) {
        lock(&self.entries).clear();
    }
}

#[derive(Debug, Default)]
struct RemoteState {
    devices: Mutex<Vec<Device>>,
    added: Mutex<Vec<Device>>,
    created_at_override: Mutex<Option<String>>,
    fail_fetch: AtomicBool,
    fail_add: AtomicBool,
    echo_none: AtomicBool,
    add_latency_ms: AtomicU32,
    fetch_count: AtomicU32,
    add_count: AtomicU32,
    log: Mutex<Option<CallLog>>,
}

/// In-memory stand-in for the HTTP backend.
///
/// Failing calls return [`RemoteError::Api`] with status 500, the same
/// shape a real server error takes.
#[derive(Debug, Clone, Default)]
pub struct MockRemote {
    state: Arc<RemoteState>,
}

impl MockRemote {
    /// An empty, always-succeeding backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the server-side list.
    pub fn with_devices(self, devices: Vec<Device>) -> Self {
        self.set_devices(devices);
        self
    }

    /// Log `fetch_all` and `add` calls into `log`.
    pub fn with_call_log(self, log: CallLog) -> Self {
        *lock(&self.state.log) = Some(log);
        self
    }

    pub fn set_devices(&self, devices: Vec<Device>) {
        *lock(&self.state.devices) = devices;
    }

    /// The server-side list.
    pub fn devices(&self) -> Vec<Device> {
        lock(&self.state.devices).clone()
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.state.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_add(&self, fail: bool) {
        self.state.fail_add.store(fail, Ordering::SeqCst);
    }

    /// Answer `add` with an empty body.
    pub fn set_echo_none(&self, echo_none: bool) {
        self.state.echo_none.store(echo_none, Ordering::SeqCst);
    }

    /// Rewrite `created_at` on every accepted device, as some servers do.
    pub fn set_created_at_override(&self, created_at: Option<&str>) {
        *lock(&self.state.created_at_override) = created_at.map(str::to_string);
    }

    /// Delay every `add` by `latency`.
    pub fn set_add_latency(&self, latency: Duration) {
        let ms = u32::try_from(latency.as_millis()).unwrap_or(u32::MAX);
        self.state.add_latency_ms.store(ms, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> u32 {
        self.state.fetch_count.load(Ordering::SeqCst)
    }

    pub fn add_count(&self) -> u32 {
        self.state.add_count.load(Ordering::SeqCst)
    }

    /// Devices submitted to `add`, in call order (including failed calls).
    pub fn added(&self) -> Vec<Device> {
        lock(&self.state.added).clone()
    }

    fn log(&self, entry: String) {
        if let Some(log) = lock(&self.state.log).as_ref() {
            log.record(entry);
        }
    }

    fn server_error() -> RemoteError {
        RemoteError::Api {
            status: 500,
            message: "Mock failure".to_string(),
        }
    }
}

#[async_trait]
impl RemoteSyncClient for MockRemote {
    async fn fetch_all(&self) -> RemoteResult<Vec<Device>> {
        self.state.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.log("remote.fetch_all".to_string());

        if self.state.fail_fetch.load(Ordering::SeqCst) {
            return Err(Self::server_error());
        }
        Ok(self.devices())
    }

    async fn add(&self, device: &Device) -> RemoteResult<Option<Device>> {
        self.state.add_count.fetch_add(1, Ordering::SeqCst);
        self.log(format!("remote.add {}", device.address));
        lock(&self.state.added).push(device.clone());

        let latency = self.state.add_latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(u64::from(latency))).await;
        }

        if self.state.fail_add.load(Ordering::SeqCst) {
            return Err(Self::server_error());
        }

        let mut stored = device.clone();
        stored.sync_state = false;
        if let Some(created_at) = lock(&self.state.created_at_override).clone() {
            stored.created_at = created_at;
        }

        {
            let mut devices = lock(&self.state.devices);
            devices.retain(|d| d.address != stored.address);
            devices.push(stored.clone());
        }

        if self.state.echo_none.load(Ordering::SeqCst) {
            Ok(None)
        } else {
            Ok(Some(stored))
        }
    }
}

#[derive(Debug, Default)]
struct RadioState {
    peers: Mutex<Vec<BondedPeer>>,
    events: Mutex<Vec<DiscoveryEvent>>,
    should_fail: AtomicBool,
    bonded_calls: AtomicU32,
    discover_calls: AtomicU32,
}

/// Scriptable radio adapter.
#[derive(Debug, Clone, Default)]
pub struct MockRadio {
    state: Arc<RadioState>,
}

impl MockRadio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bonded peers returned by `bonded_devices`.
    pub fn with_peers(self, peers: Vec<BondedPeer>) -> Self {
        *lock(&self.state.peers) = peers;
        self
    }

    /// Events replayed by `discover`, in order.
    pub fn with_events(self, events: Vec<DiscoveryEvent>) -> Self {
        *lock(&self.state.events) = events;
        self
    }

    /// Make every call fail with [`Error::RadioUnavailable`].
    pub fn set_should_fail(&self, fail: bool) {
        self.state.should_fail.store(fail, Ordering::SeqCst);
    }

    pub fn bonded_calls(&self) -> u32 {
        self.state.bonded_calls.load(Ordering::SeqCst)
    }

    pub fn discover_calls(&self) -> u32 {
        self.state.discover_calls.load(Ordering::SeqCst)
    }

    fn check_should_fail(&self) -> Result<()> {
        if self.state.should_fail.load(Ordering::SeqCst) {
            return Err(Error::radio_unavailable("Mock failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl RadioAdapter for MockRadio {
    async fn bonded_devices(&self) -> Result<Vec<BondedPeer>> {
        self.state.bonded_calls.fetch_add(1, Ordering::SeqCst);
        self.check_should_fail()?;
        Ok(lock(&self.state.peers).clone())
    }

    async fn discover(&self, _duration: Duration, sender: DiscoverySender) -> Result<()> {
        self.state.discover_calls.fetch_add(1, Ordering::SeqCst);
        self.check_should_fail()?;
        let events = lock(&self.state.events).clone();
        for event in events {
            sender.report(event);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_remote_add_stores_and_echoes() {
        let remote = MockRemote::new();
        let device = Device::new("a", "AA", -1);

        let echo = remote.add(&device).await.unwrap().unwrap();
        assert!(echo.same_contents(&device));
        assert_eq!(remote.devices().len(), 1);
        assert_eq!(remote.add_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_remote_created_at_override() {
        let remote = MockRemote::new();
        remote.set_created_at_override(Some("2020-01-01T00:00:00.000z"));

        let echo = remote
            .add(&Device::new("a", "AA", -1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(echo.created_at, "2020-01-01T00:00:00.000z");
    }

    #[tokio::test]
    async fn test_mock_remote_failures() {
        let remote = MockRemote::new();
        remote.set_fail_fetch(true);
        remote.set_fail_add(true);

        assert!(remote.fetch_all().await.is_err());
        assert!(remote.add(&Device::new("a", "AA", -1)).await.is_err());
        assert!(remote.devices().is_empty());
        assert_eq!(remote.added().len(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let remote = MockRemote::new();
        let other = remote.clone();
        other.fetch_all().await.unwrap();
        assert_eq!(remote.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_call_log() {
        let log = CallLog::new();
        let remote = MockRemote::new().with_call_log(log.clone());

        remote.fetch_all().await.unwrap();
        remote.add(&Device::new("a", "AA", -1)).await.unwrap();

        assert_eq!(log.entries(), ["remote.fetch_all", "remote.add AA"]);
        assert_eq!(log.count("remote."), 2);
    }

    #[tokio::test]
    async fn test_mock_radio() {
        let radio = MockRadio::new().with_peers(vec![BondedPeer::new(Some("hp"), "AA")]);
        assert_eq!(radio.bonded_devices().await.unwrap().len(), 1);

        radio.set_should_fail(true);
        assert!(radio.bonded_devices().await.is_err());
        assert_eq!(radio.bonded_calls(), 2);
    }
}
