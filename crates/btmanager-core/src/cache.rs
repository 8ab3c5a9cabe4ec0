//! Time-window cache policy.
//!
//! Local device data may be served without a network round-trip while the
//! stored expiration timestamp lies in the future. The expiration is kept
//! in the settings table under [`CACHE_EXPIRATION_KEY`] as milliseconds
//! since the Unix epoch.
//!
//! Invalidation and renewal are separate writes. A refresh that fails
//! midway leaves the cache marked expired and the device table empty,
//! which the next read repairs by fetching again.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::traits::{DeviceStore, SettingsStore};

/// Settings key holding the expiration in epoch milliseconds.
pub const CACHE_EXPIRATION_KEY: &str = "cache_expiration_ms";

/// Stored value meaning "already expired".
pub const EXPIRED_SENTINEL: i64 = -1;

/// Cache window configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long a successful refresh keeps the cache valid.
    pub duration: Duration,
}

impl CacheConfig {
    /// Default window length in minutes.
    pub const DEFAULT_MINUTES: u64 = 60;

    /// Window of `minutes` minutes.
    pub fn from_minutes(minutes: u64) -> Self {
        Self {
            duration: Duration::from_secs(minutes.saturating_mul(60)),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::from_minutes(Self::DEFAULT_MINUTES)
    }
}

/// Decides whether the local store may be served as-is.
pub struct CachePolicy {
    settings: Arc<dyn SettingsStore>,
    store: Arc<dyn DeviceStore>,
    config: CacheConfig,
    lock: Mutex<()>,
}

impl std::fmt::Debug for CachePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachePolicy")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CachePolicy {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        store: Arc<dyn DeviceStore>,
        config: CacheConfig,
    ) -> Self {
        Self {
            settings,
            store,
            config,
            lock: Mutex::new(()),
        }
    }

    /// The configured window.
    pub fn config(&self) -> CacheConfig {
        self.config
    }

    /// Whether the cache is valid right now.
    ///
    /// A settings read failure counts as invalid.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(now_millis())
    }

    /// Whether the cache is valid at `now_ms`.
    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        let _guard = self.guard();
        match self.settings.get_i64(CACHE_EXPIRATION_KEY) {
            Ok(Some(expiration)) => now_ms < expiration,
            Ok(None) => false,
            Err(e) => {
                warn!("Failed to read cache expiration: {}", e);
                false
            }
        }
    }

    /// The stored expiration, if any. The sentinel is returned as-is.
    pub fn expires_at(&self) -> Result<Option<i64>> {
        let _guard = self.guard();
        self.settings.get_i64(CACHE_EXPIRATION_KEY)
    }

    /// Mark the cache expired and wipe the device table.
    pub fn invalidate(&self) -> Result<()> {
        {
            let _guard = self.guard();
            self.settings
                .put_i64(CACHE_EXPIRATION_KEY, EXPIRED_SENTINEL)?;
        }
        self.store.delete_all()?;
        info!("Cache invalidated");
        Ok(())
    }

    /// Extend the cache by the configured window from now.
    pub fn renew(&self) -> Result<()> {
        self.renew_for(self.config.duration)
    }

    /// Extend the cache by `duration` from now.
    pub fn renew_for(&self, duration: Duration) -> Result<()> {
        let window = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        let expiration = now_millis().saturating_add(window);
        let _guard = self.guard();
        self.settings.put_i64(CACHE_EXPIRATION_KEY, expiration)?;
        debug!(expiration, "Cache renewed");
        Ok(())
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // Guards (); poisoning leaves nothing inconsistent.
        self.lock.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Current time in milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> i64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    i64::try_from(nanos / 1_000_000).unwrap_or(i64::MAX)
}
