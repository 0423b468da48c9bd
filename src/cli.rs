//! Command-line interface parsing for portfolio-feeds
//!
//! This module handles parsing of CLI arguments using clap: the `videos`
//! command that loads feeds through the cache, and the `cache` command that
//! inspects or clears stored entries.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use thiserror::Error;

use crate::cache::DEFAULT_TTL_HOURS;
use crate::video::{FeedKind, DEFAULT_CHANNEL_ID};

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified feed name is not recognized
    #[error("Invalid feed: '{0}'. Valid feeds: latest, most-viewed, all")]
    InvalidFeed(String),

    /// Entries must live for at least an hour
    #[error("Invalid ttl: --ttl-hours must be at least 1")]
    ZeroTtl,

    /// A zero timeout would fail every request
    #[error("Invalid timeout: --timeout-secs must be at least 1")]
    ZeroTimeout,
}

/// Portfolio feeds - cached YouTube listings for the portfolio site
#[derive(Parser, Debug)]
#[command(name = "portfolio-feeds")]
#[command(about = "Cached YouTube feeds for the portfolio site")]
#[command(version)]
pub struct Cli {
    /// Directory for cache files (defaults to the XDG cache directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Disable the cache entirely; every load goes to the network
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Hours a fetched feed stays fresh
    #[arg(long, global = true, value_name = "HOURS", default_value_t = DEFAULT_TTL_HOURS)]
    pub ttl_hours: u64,

    /// Seconds to wait for an upstream answer
    #[arg(long, global = true, value_name = "SECS", default_value_t = 5)]
    pub timeout_secs: u64,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show a video feed, from cache when fresh
    ///
    /// Examples:
    ///   portfolio-feeds videos latest
    ///   portfolio-feeds videos most-viewed --refresh
    ///   portfolio-feeds videos all --endpoint http://localhost:3000
    Videos(VideosArgs),

    /// Inspect or clear cached feeds
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Args, Debug)]
pub struct VideosArgs {
    /// Which feed to show: latest, most-viewed or all
    #[arg(value_name = "FEED")]
    pub feed: String,

    /// Bypass the cached copy and fetch again
    #[arg(long)]
    pub refresh: bool,

    /// Base URL of a proxy serving /api/youtube/* (used instead of the YouTube API)
    #[arg(long, env = "PORTFOLIO_FEEDS_ENDPOINT", value_name = "URL")]
    pub endpoint: Option<String>,

    /// YouTube channel to list
    #[arg(long, value_name = "ID", default_value = DEFAULT_CHANNEL_ID)]
    pub channel_id: String,

    /// YouTube Data API key
    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Print the feed as JSON instead of a listing
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show status and expiry of the reserved feed entries
    Info,
    /// Clear one entry, or everything this tool cached
    Clear {
        /// Key to clear (e.g. youtube_latest_videos); clears all when omitted
        #[arg(long, value_name = "KEY")]
        key: Option<String>,
    },
}

/// Which feeds a `videos` invocation covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSelection {
    One(FeedKind),
    All,
}

impl FeedSelection {
    pub fn kinds(self) -> Vec<FeedKind> {
        match self {
            FeedSelection::One(kind) => vec![kind],
            FeedSelection::All => FeedKind::all().to_vec(),
        }
    }
}

/// Parses a feed argument into a FeedSelection.
///
/// # Arguments
/// * `s` - The feed string from CLI
///
/// # Returns
/// * `Ok(FeedSelection)` if the string names a feed or "all"
/// * `Err(CliError::InvalidFeed)` if the string doesn't match
pub fn parse_feed_arg(s: &str) -> Result<FeedSelection, CliError> {
    if s.trim().eq_ignore_ascii_case("all") {
        return Ok(FeedSelection::All);
    }
    FeedKind::from_str(s)
        .map(FeedSelection::One)
        .ok_or_else(|| CliError::InvalidFeed(s.to_string()))
}
