//! Cache-first fetch with fallback data and stale-response protection
//!
//! `CachedFetch` is what a display section holds: it answers from the TTL
//! cache when it can, goes to its source otherwise, and always ends up with
//! something to show when fallback data was supplied.
//!
//! Every invocation takes a generation number under the state lock. Results
//! are applied (and cached) only while their generation is still the newest,
//! so a slow response can never overwrite the outcome of a later call.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::source::{FetchError, Source};
use crate::cache::{TtlCache, DEFAULT_TTL_HOURS};

/// Default upper bound on a single source call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// What a consumer renders
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    /// Cached, fetched or fallback data
    pub data: Option<T>,
    /// Whether an invocation is still in flight
    pub loading: bool,
    /// Message of the last failure, shown alongside `data`
    pub error: Option<String>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

/// Construction parameters for a `CachedFetch`
pub struct FetchOptions<T> {
    pub cache_key: String,
    pub source: Arc<dyn Source<T>>,
    pub ttl_hours: u64,
    pub fallback: Option<T>,
    pub timeout: Duration,
}

impl<T> FetchOptions<T> {
    pub fn new(cache_key: impl Into<String>, source: Arc<dyn Source<T>>) -> Self {
        Self {
            cache_key: cache_key.into(),
            source,
            ttl_hours: DEFAULT_TTL_HOURS,
            fallback: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_ttl_hours(mut self, ttl_hours: u64) -> Self {
        self.ttl_hours = ttl_hours;
        self
    }

    pub fn with_fallback(mut self, fallback: T) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

struct Target<T> {
    key: String,
    source: Arc<dyn Source<T>>,
}

struct Tracked<T> {
    generation: u64,
    state: FetchState<T>,
}

struct Inner<T> {
    cache: TtlCache,
    ttl_hours: u64,
    fallback: Option<T>,
    timeout: Duration,
    target: Mutex<Target<T>>,
    tracked: Mutex<Tracked<T>>,
}

/// Cache-first loader for one display section
///
/// Clones share state, so a clone can be handed to another task to trigger
/// `refetch` while the original is still loading.
pub struct CachedFetch<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for CachedFetch<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn lock<X>(mutex: &Mutex<X>) -> MutexGuard<'_, X> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Ends `loading` for an invocation whose future is dropped before it finishes
///
/// Only acts while its generation is still the newest, since every older
/// call discards its own result.
struct InFlight<'a, T: Clone> {
    inner: &'a Inner<T>,
    generation: u64,
    finished: bool,
}

impl<T: Clone> InFlight<'_, T> {
    fn finish(&mut self) {
        self.finished = true;
    }
}

impl<T: Clone> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut tracked = lock(&self.inner.tracked);
        if tracked.generation != self.generation {
            return;
        }
        debug!(generation = self.generation, "latest invocation cancelled");
        tracked.state.loading = false;
        if tracked.state.data.is_none() {
            tracked.state.data = self.inner.fallback.clone();
        }
    }
}

impl<T> CachedFetch<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(cache: TtlCache, options: FetchOptions<T>) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache,
                ttl_hours: options.ttl_hours,
                fallback: options.fallback,
                timeout: options.timeout,
                target: Mutex::new(Target {
                    key: options.cache_key,
                    source: options.source,
                }),
                tracked: Mutex::new(Tracked {
                    generation: 0,
                    state: FetchState::default(),
                }),
            }),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> FetchState<T> {
        lock(&self.inner.tracked).state.clone()
    }

    pub fn cache_key(&self) -> String {
        lock(&self.inner.target).key.clone()
    }

    /// Loads from cache if fresh, from the source otherwise
    pub async fn load(&self) -> FetchState<T> {
        self.run(false).await
    }

    /// Loads from the source, skipping the cache read but still caching the result
    pub async fn refetch(&self) -> FetchState<T> {
        self.run(true).await
    }

    /// Deletes the cached entry for the current key; displayed data is untouched
    pub fn clear_cache(&self) {
        let key = self.cache_key();
        self.inner.cache.remove(&key);
        info!(key = %key, "cleared cached entry");
    }

    /// Points this loader at a new key or source and reloads if either changed
    ///
    /// Sources are compared by identity, not by value.
    pub async fn retarget(&self, key: impl Into<String>, source: Arc<dyn Source<T>>) -> FetchState<T> {
        let key = key.into();
        let changed = {
            let mut target = lock(&self.inner.target);
            let changed = target.key != key || !Arc::ptr_eq(&target.source, &source);
            if changed {
                target.key = key;
                target.source = source;
            }
            changed
        };

        if changed {
            self.load().await
        } else {
            self.state()
        }
    }

    fn begin(&self) -> u64 {
        let mut tracked = lock(&self.inner.tracked);
        tracked.generation += 1;
        tracked.state.loading = true;
        tracked.state.error = None;
        tracked.generation
    }

    async fn run(&self, force_refresh: bool) -> FetchState<T> {
        let generation = self.begin();
        let mut in_flight = InFlight {
            inner: &*self.inner,
            generation,
            finished: false,
        };
        let (key, source) = {
            let target = lock(&self.inner.target);
            (target.key.clone(), Arc::clone(&target.source))
        };
        let metrics = self.inner.cache.metrics();

        if !force_refresh {
            if let Some(cached) = self.inner.cache.get::<T>(&key) {
                in_flight.finish();
                let mut tracked = lock(&self.inner.tracked);
                if tracked.generation == generation {
                    metrics.record_cache_hit();
                    info!(key = %key, "using cached data");
                    tracked.state.data = Some(cached);
                    tracked.state.loading = false;
                } else {
                    metrics.record_stale_response();
                    debug!(key = %key, generation, "discarding superseded cache hit");
                }
                return tracked.state.clone();
            }
            metrics.record_cache_miss();
        }

        info!(key = %key, source = %source.describe(), force_refresh, "fetching data from source");
        let outcome = match tokio::time::timeout(self.inner.timeout, source.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.inner.timeout)),
        };

        in_flight.finish();
        let mut tracked = lock(&self.inner.tracked);
        if tracked.generation != generation {
            metrics.record_stale_response();
            debug!(
                key = %key,
                generation,
                latest = tracked.generation,
                "discarding stale response"
            );
            return tracked.state.clone();
        }

        match outcome {
            Ok(data) => {
                metrics.record_network_success();
                self.inner.cache.set(&key, &data, self.inner.ttl_hours);
                info!(key = %key, "fetched fresh data");
                tracked.state.data = Some(data);
                tracked.state.error = None;
            }
            Err(e) => {
                metrics.record_network_failure();
                let message = e.to_string();
                warn!(key = %key, error = %message, fallback = self.inner.fallback.is_some(), "fetch failed");
                if let Some(fallback) = &self.inner.fallback {
                    tracked.state.data = Some(fallback.clone());
                }
                tracked.state.error = Some(message);
            }
        }
        tracked.state.loading = false;
        tracked.state.clone()
    }
}
