//! Counters for cache and fetch activity
//!
//! A `FetchMetrics` handle is shared between the TTL cache and every
//! orchestrator built on top of it, so hit rate and failure rate can be
//! reported without tying the core logic to a particular logging backend.

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared, lock-free counters
#[derive(Debug, Default)]
pub struct FetchMetrics {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    cache_writes: AtomicU64,
    storage_faults: AtomicU64,
    network_successes: AtomicU64,
    network_failures: AtomicU64,
    stale_responses: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_writes: u64,
    pub storage_faults: u64,
    pub network_successes: u64,
    pub network_failures: u64,
    pub stale_responses: u64,
}

impl MetricsSnapshot {
    /// Fraction of cache lookups that were hits, if any lookups happened
    pub fn hit_rate(&self) -> Option<f64> {
        let lookups = self.cache_hits + self.cache_misses;
        (lookups > 0).then(|| self.cache_hits as f64 / lookups as f64)
    }
}

impl FetchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_write(&self) {
        self.cache_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_storage_fault(&self) {
        self.storage_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_network_success(&self) {
        self.network_successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_network_failure(&self) {
        self.network_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_response(&self) {
        self.stale_responses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            cache_writes: self.cache_writes.load(Ordering::Relaxed),
            storage_faults: self.storage_faults.load(Ordering::Relaxed),
            network_successes: self.network_successes.load(Ordering::Relaxed),
            network_failures: self.network_failures.load(Ordering::Relaxed),
            stale_responses: self.stale_responses.load(Ordering::Relaxed),
        }
    }
}
