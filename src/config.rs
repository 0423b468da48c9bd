//! Runtime configuration derived from CLI arguments

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{FileStore, TtlCache, DEFAULT_TTL_HOURS};
use crate::cli::{CacheAction, Cli, CliError, Command, FeedSelection, parse_feed_arg};
use crate::fetch::DEFAULT_TIMEOUT;
use crate::metrics::FetchMetrics;
use crate::video::DEFAULT_CHANNEL_ID;

/// Where feed data comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceMode {
    /// Call the YouTube Data API directly
    YouTubeApi { api_key: Option<String> },
    /// Call a proxy site exposing `/api/youtube/*`
    Proxy { base_url: String },
}

/// Settings shared by every feed section
#[derive(Debug, Clone)]
pub struct Config {
    /// Explicit cache directory; `None` uses the XDG cache directory
    pub cache_dir: Option<PathBuf>,
    /// Whether the cache is used at all
    pub use_cache: bool,
    pub ttl_hours: u64,
    pub timeout: Duration,
    pub channel_id: String,
    pub source: SourceMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: None,
            use_cache: true,
            ttl_hours: DEFAULT_TTL_HOURS,
            timeout: DEFAULT_TIMEOUT,
            channel_id: DEFAULT_CHANNEL_ID.to_string(),
            source: SourceMode::YouTubeApi { api_key: None },
        }
    }
}

/// What the binary should do once configured
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ShowVideos {
        feeds: FeedSelection,
        refresh: bool,
        json: bool,
    },
    CacheInfo,
    CacheClear { key: Option<String> },
}

impl Config {
    /// Creates a Config and the requested Action from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok((Config, Action))` with validated settings
    /// * `Err(CliError)` if a feed name, TTL or timeout is invalid
    pub fn from_cli(cli: &Cli) -> Result<(Self, Action), CliError> {
        if cli.ttl_hours == 0 {
            return Err(CliError::ZeroTtl);
        }
        if cli.timeout_secs == 0 {
            return Err(CliError::ZeroTimeout);
        }

        let mut config = Config {
            cache_dir: cli.cache_dir.clone(),
            use_cache: !cli.no_cache,
            ttl_hours: cli.ttl_hours,
            timeout: Duration::from_secs(cli.timeout_secs),
            ..Config::default()
        };

        let action = match &cli.command {
            Command::Videos(args) => {
                config.channel_id = args.channel_id.clone();
                config.source = match &args.endpoint {
                    Some(base_url) => SourceMode::Proxy {
                        base_url: base_url.trim_end_matches('/').to_string(),
                    },
                    None => SourceMode::YouTubeApi {
                        api_key: args.api_key.clone(),
                    },
                };
                Action::ShowVideos {
                    feeds: parse_feed_arg(&args.feed)?,
                    refresh: args.refresh,
                    json: args.json,
                }
            }
            Command::Cache { action } => match action {
                CacheAction::Info => Action::CacheInfo,
                CacheAction::Clear { key } => Action::CacheClear { key: key.clone() },
            },
        };

        Ok((config, action))
    }

    /// Builds the TTL cache these settings describe
    pub fn build_cache(&self, metrics: Arc<FetchMetrics>) -> TtlCache {
        let cache = if !self.use_cache {
            TtlCache::unavailable()
        } else if let Some(dir) = &self.cache_dir {
            TtlCache::new(Arc::new(FileStore::with_dir(dir.clone())))
        } else {
            TtlCache::from_env()
        };
        cache.with_metrics(metrics)
    }
}
