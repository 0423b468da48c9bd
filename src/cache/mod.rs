//! Cache module for storing fetched feeds with a time-to-live
//!
//! A `TtlCache` keeps JSON entries with creation and expiry timestamps in a
//! pluggable key/value backend (`FileStore` on disk, `MemoryStore` in tests).
//! Expired or corrupt entries read as absent and are cleaned up on read.

mod clock;
mod store;
mod ttl;

pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use ttl::{CacheInfo, CacheStatus, TtlCache, DEFAULT_NAMESPACE, DEFAULT_TTL_HOURS};
