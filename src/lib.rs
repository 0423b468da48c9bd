//! Portfolio Feeds Library
//!
//! TTL cache, cached fetch orchestration and YouTube feed building, exposed
//! for the binary and for integration tests.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod fetch;
pub mod metrics;
pub mod output;
pub mod video;
