//! Cached fetch orchestration
//!
//! Combines a `TtlCache` with an injected `Source` so that display sections
//! read from cache when warm, fetch when cold, and fall back to placeholder
//! data when the source fails.

mod orchestrator;
mod source;

pub use orchestrator::{CachedFetch, FetchOptions, FetchState, DEFAULT_TIMEOUT};
pub use source::{envelope_error, interpret_envelope, FetchError, HttpSource, Source};
