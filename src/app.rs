//! Application state: one cached loader per video section
//!
//! Mirrors the site's layout, where the "latest" and "most viewed" sections
//! each own a `CachedFetch` bound to their reserved cache key and share one
//! cache handle and one set of metrics.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;
use tracing::info;

use crate::cache::{CacheInfo, TtlCache};
use crate::config::{Config, SourceMode};
use crate::fetch::{CachedFetch, FetchOptions, FetchState, HttpSource, Source};
use crate::metrics::{FetchMetrics, MetricsSnapshot};
use crate::video::{fallback_feed, FeedKind, VideoFeed, YouTubeClient, YouTubeSource};

/// Cache status of one reserved feed, for `cache info`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheReport {
    pub kind: FeedKind,
    pub info: Option<CacheInfo>,
}

pub struct App {
    cache: TtlCache,
    metrics: Arc<FetchMetrics>,
    sections: HashMap<FeedKind, CachedFetch<VideoFeed>>,
}

/// Builds the source a section fetches from under the given settings
pub fn source_for(config: &Config, client: &Client, kind: FeedKind) -> Arc<dyn Source<VideoFeed>> {
    match &config.source {
        SourceMode::Proxy { base_url } => Arc::new(HttpSource::with_client(
            client.clone(),
            format!("{}{}", base_url, kind.proxy_path()),
        )),
        SourceMode::YouTubeApi { api_key } => {
            let youtube = YouTubeClient::new(api_key.clone(), config.channel_id.clone())
                .with_client(client.clone());
            Arc::new(YouTubeSource::new(youtube, kind))
        }
    }
}

impl App {
    /// Creates an App with sources and cache built from the configuration
    pub fn new(config: &Config) -> Self {
        let metrics = Arc::new(FetchMetrics::new());
        let cache = config.build_cache(Arc::clone(&metrics));
        let client = Client::new();
        Self::with_sources(config, cache, |kind| source_for(config, &client, kind))
    }

    /// Creates an App over an existing cache with custom sources
    pub fn with_sources(
        config: &Config,
        cache: TtlCache,
        mut source: impl FnMut(FeedKind) -> Arc<dyn Source<VideoFeed>>,
    ) -> Self {
        let metrics = Arc::clone(cache.metrics());
        let sections = FeedKind::all()
            .iter()
            .map(|&kind| {
                let options = FetchOptions::new(kind.cache_key(), source(kind))
                    .with_ttl_hours(config.ttl_hours)
                    .with_timeout(config.timeout)
                    .with_fallback(fallback_feed(kind));
                (kind, CachedFetch::new(cache.clone(), options))
            })
            .collect();

        Self {
            cache,
            metrics,
            sections,
        }
    }

    fn section(&self, kind: FeedKind) -> &CachedFetch<VideoFeed> {
        // Every FeedKind gets a section in with_sources
        &self.sections[&kind]
    }

    /// Loads one feed, forcing a network round trip when `refresh` is set
    pub async fn load(&self, kind: FeedKind, refresh: bool) -> FetchState<VideoFeed> {
        let section = self.section(kind);
        if refresh {
            section.refetch().await
        } else {
            section.load().await
        }
    }

    /// Loads several feeds concurrently, returning states in the order given
    pub async fn load_many(
        &self,
        kinds: &[FeedKind],
        refresh: bool,
    ) -> Vec<(FeedKind, FetchState<VideoFeed>)> {
        let futures = kinds.iter().map(|&kind| async move {
            let state = self.load(kind, refresh).await;
            (kind, state)
        });
        futures::future::join_all(futures).await
    }

    /// Cache status of every reserved feed
    pub fn cache_report(&self) -> Vec<CacheReport> {
        FeedKind::all()
            .iter()
            .map(|&kind| CacheReport {
                kind,
                info: self.cache.info(kind.cache_key()),
            })
            .collect()
    }

    /// Clears one key, or every entry in the cache namespace
    pub fn clear_cache(&self, key: Option<&str>) {
        match key {
            Some(key) => match FeedKind::all().iter().find(|k| k.cache_key() == key) {
                Some(&kind) => self.section(kind).clear_cache(),
                None => self.cache.remove(key),
            },
            None => {
                self.cache.clear();
                info!("cleared all cached feeds");
            }
        }
    }

    /// Whether cache operations reach a backend (false under `--no-cache`)
    pub fn cache_available(&self) -> bool {
        self.cache.is_available()
    }

    pub fn now_millis(&self) -> i64 {
        self.cache.now_millis()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
