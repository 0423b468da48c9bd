//! TTL cache over a pluggable key/value backend
//!
//! Entries are stored as JSON with their creation and expiry timestamps.
//! Expiry is checked lazily on read: an expired or unreadable entry is treated
//! as absent and removed from the backend as a side effect. No operation here
//! ever fails; the cache is an optimization, not a source of truth.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, de::IgnoredAny, Deserialize, Serialize};
use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};
use super::store::{FileStore, KeyValueStore, StorageError};
use crate::metrics::FetchMetrics;

/// Default time-to-live for cache entries in hours
pub const DEFAULT_TTL_HOURS: u64 = 24;

/// Prefix applied to every key this cache writes
pub const DEFAULT_NAMESPACE: &str = "portfolio.";

const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Wrapper struct for cached data as persisted in the backend
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    /// The cached data
    data: T,
    /// When the data was cached (ms since epoch)
    #[serde(rename = "timestamp")]
    stored_at: i64,
    /// When the cache entry expires (ms since epoch)
    #[serde(rename = "expiresAt")]
    expires_at: i64,
}

/// Freshness of a stored entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Valid,
    Expired,
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheStatus::Valid => write!(f, "Valid"),
            CacheStatus::Expired => write!(f, "Expired"),
        }
    }
}

/// Timestamps of a stored entry, read without touching its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheInfo {
    /// When the data was cached (ms since epoch)
    pub stored_at: i64,
    /// When the cache entry expires (ms since epoch)
    pub expires_at: i64,
}

impl CacheInfo {
    pub fn status(&self, now_millis: i64) -> CacheStatus {
        if now_millis > self.expires_at {
            CacheStatus::Expired
        } else {
            CacheStatus::Valid
        }
    }

    pub fn stored_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.stored_at)
    }

    /// Human-readable time left, e.g. "3h 12m remaining" or "Expired"
    pub fn remaining_label(&self, now_millis: i64) -> String {
        let diff = self.expires_at - now_millis;
        if diff <= 0 {
            return "Expired".to_string();
        }

        let hours = diff / MILLIS_PER_HOUR;
        let minutes = (diff % MILLIS_PER_HOUR) / 60_000;
        if hours > 0 {
            format!("{}h {}m remaining", hours, minutes)
        } else {
            format!("{}m remaining", minutes)
        }
    }
}

/// Key/value cache with per-entry expiry
///
/// Cloning is cheap and clones share the same backend, clock and metrics. A
/// cache built with [`TtlCache::unavailable`] has no backend at all: reads
/// return `None` and writes do nothing, which keeps callers portable to
/// environments without persistent storage.
#[derive(Clone)]
pub struct TtlCache {
    store: Option<Arc<dyn KeyValueStore>>,
    clock: Arc<dyn Clock>,
    namespace: String,
    metrics: Arc<FetchMetrics>,
}

impl fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("available", &self.store.is_some())
            .field("namespace", &self.namespace)
            .finish()
    }
}

impl TtlCache {
    /// Creates a cache over the given backend using wall-clock time
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store: Some(store),
            clock: Arc::new(SystemClock),
            namespace: DEFAULT_NAMESPACE.to_string(),
            metrics: Arc::new(FetchMetrics::new()),
        }
    }

    /// Creates a cache with no backend
    pub fn unavailable() -> Self {
        Self {
            store: None,
            clock: Arc::new(SystemClock),
            namespace: DEFAULT_NAMESPACE.to_string(),
            metrics: Arc::new(FetchMetrics::new()),
        }
    }

    /// Creates a file-backed cache in the XDG cache directory
    ///
    /// Falls back to an unavailable cache when no cache directory can be determined.
    pub fn from_env() -> Self {
        match FileStore::from_project_dirs() {
            Some(store) => Self::new(Arc::new(store)),
            None => {
                warn!("no cache directory available; caching disabled");
                Self::unavailable()
            }
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<FetchMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<FetchMetrics> {
        &self.metrics
    }

    pub fn is_available(&self) -> bool {
        self.store.is_some()
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    fn physical_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    fn storage_fault(&self, op: &str, key: &str, error: &StorageError) {
        self.metrics.record_storage_fault();
        warn!(op, key, error = %error, "cache storage fault");
    }

    fn evict(&self, store: &dyn KeyValueStore, key: &str) {
        if let Err(e) = store.remove_item(&self.physical_key(key)) {
            self.storage_fault("evict", key, &e);
        }
    }

    fn read_raw(&self, store: &dyn KeyValueStore, key: &str) -> Option<String> {
        match store.get_item(&self.physical_key(key)) {
            Ok(raw) => raw,
            Err(e) => {
                self.storage_fault("read", key, &e);
                None
            }
        }
    }

    /// Reads a live entry
    ///
    /// Returns `None` if the entry is missing, cannot be parsed as `T`, or has
    /// expired. Unparsable and expired entries are deleted from the backend.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let store = self.store.as_deref()?;
        let raw = self.read_raw(store, key)?;

        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable cache entry");
                self.evict(store, key);
                return None;
            }
        };

        if self.clock.now_millis() > entry.expires_at {
            debug!(key, expires_at = entry.expires_at, "cache entry expired");
            self.evict(store, key);
            return None;
        }

        Some(entry.data)
    }

    /// Writes an entry that expires `ttl_hours` from now, replacing any existing one
    ///
    /// # Arguments
    /// * `key` - Cache key (e.g., "youtube_latest_videos")
    /// * `data` - The data to cache
    /// * `ttl_hours` - How long the entry should be considered fresh; zero is ignored
    ///
    /// Failures are logged and swallowed.
    pub fn set<T: Serialize>(&self, key: &str, data: &T, ttl_hours: u64) {
        let Some(store) = self.store.as_deref() else {
            return;
        };

        let Some(ttl_millis) = i64::try_from(ttl_hours)
            .ok()
            .and_then(|h| h.checked_mul(MILLIS_PER_HOUR))
            .filter(|ms| *ms > 0)
        else {
            warn!(key, ttl_hours, "refusing to cache entry with unusable ttl");
            return;
        };

        let stored_at = self.clock.now_millis();
        let entry = CacheEntry {
            data,
            stored_at,
            expires_at: stored_at.saturating_add(ttl_millis),
        };

        let json = match serde_json::to_string(&entry) {
            Ok(json) => json,
            Err(e) => {
                self.metrics.record_storage_fault();
                warn!(key, error = %e, "failed to serialize cache entry");
                return;
            }
        };

        match store.set_item(&self.physical_key(key), &json) {
            Ok(()) => {
                self.metrics.record_cache_write();
                debug!(key, ttl_hours, "cached entry");
            }
            Err(e) => self.storage_fault("write", key, &e),
        }
    }

    /// Writes an entry with the default 24-hour TTL
    pub fn set_default<T: Serialize>(&self, key: &str, data: &T) {
        self.set(key, data, DEFAULT_TTL_HOURS);
    }

    pub fn remove(&self, key: &str) {
        if let Some(store) = self.store.as_deref() {
            self.evict(store, key);
        }
    }

    /// Removes every entry in this cache's namespace
    ///
    /// Keys written by anything else sharing the backend are left alone.
    pub fn clear(&self) {
        let Some(store) = self.store.as_deref() else {
            return;
        };

        let keys = match store.keys() {
            Ok(keys) => keys,
            Err(e) => {
                self.storage_fault("list", "*", &e);
                return;
            }
        };

        for physical in keys.iter().filter(|k| k.starts_with(&self.namespace)) {
            if let Err(e) = store.remove_item(physical) {
                self.storage_fault("clear", physical, &e);
            }
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.get::<IgnoredAny>(key).is_some()
    }

    /// Returns entry timestamps without evicting expired entries
    pub fn info(&self, key: &str) -> Option<CacheInfo> {
        let store = self.store.as_deref()?;
        let raw = self.read_raw(store, key)?;

        match serde_json::from_str::<CacheEntry<IgnoredAny>>(&raw) {
            Ok(entry) => Some(CacheInfo {
                stored_at: entry.stored_at,
                expires_at: entry.expires_at,
            }),
            Err(e) => {
                debug!(key, error = %e, "cache entry metadata unreadable");
                None
            }
        }
    }
}
