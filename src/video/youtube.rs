//! YouTube Data API client
//!
//! Builds the full-video feeds: a channel search ordered by date or view
//! count, a details lookup for durations and statistics, then short-form
//! filtering and truncation to the feed's limit.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use super::classify::is_short_video;
use super::{FeedKind, Video, VideoFeed};
use crate::fetch::{FetchError, Source};

/// Base URL for the YouTube Data API v3
const YOUTUBE_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// How many search results are inspected before filtering out shorts
const SEARCH_MAX_RESULTS: u32 = 30;

/// Errors that can occur when building a video feed
#[derive(Debug, Error)]
pub enum YouTubeError {
    /// No API key was supplied
    #[error("YouTube API key not configured")]
    MissingApiKey,

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("YouTube {endpoint} request failed with status {status}")]
    Status { endpoint: &'static str, status: u16 },

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl From<YouTubeError> for FetchError {
    fn from(error: YouTubeError) -> Self {
        match error {
            YouTubeError::MissingApiKey => FetchError::Upstream(
                "Please add YOUTUBE_API_KEY to your environment variables".to_string(),
            ),
            YouTubeError::RequestFailed(e) => FetchError::Request(e),
            YouTubeError::ParseError(e) => FetchError::Parse(e),
            other @ YouTubeError::Status { .. } => FetchError::Upstream(other.to_string()),
        }
    }
}

/// Response from the `search` endpoint
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub id: SearchItemId,
    #[serde(default)]
    pub snippet: Snippet,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItemId {
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snippet {
    pub title: String,
    pub description: String,
    pub thumbnails: Thumbnails,
    pub published_at: String,
    pub channel_title: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Thumbnails {
    pub high: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

/// Response from the `videos` endpoint
#[derive(Debug, Default, Deserialize)]
pub struct VideosResponse {
    #[serde(default)]
    pub items: Vec<VideoDetails>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    pub id: String,
    #[serde(default)]
    pub statistics: Statistics,
    #[serde(default)]
    pub content_details: ContentDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub view_count: Option<String>,
    pub like_count: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentDetails {
    pub duration: Option<String>,
}

/// Keeps the full-length videos among search results, in search order
///
/// Search items are matched to their details by video id. Items without an
/// id or without details are dropped, as is anything [`is_short_video`]
/// flags. At most `limit` videos are returned.
pub fn select_full_videos(
    search: &[SearchItem],
    details: &[VideoDetails],
    limit: usize,
) -> Vec<Video> {
    let details_by_id: HashMap<&str, &VideoDetails> =
        details.iter().map(|d| (d.id.as_str(), d)).collect();

    search
        .iter()
        .filter_map(|item| {
            let video_id = item.id.video_id.as_deref()?;
            let Some(details) = details_by_id.get(video_id) else {
                debug!(video_id, "no details for video");
                return None;
            };

            let duration = details.content_details.duration.clone().unwrap_or_default();
            let snippet = &item.snippet;
            if is_short_video(&duration, &snippet.title) {
                debug!(title = %snippet.title, duration = %duration, "excluding short");
                return None;
            }

            let thumbnail = snippet
                .thumbnails
                .high
                .as_ref()
                .or(snippet.thumbnails.medium.as_ref())
                .map(|t| t.url.clone());

            Some(Video {
                id: video_id.to_string(),
                title: snippet.title.clone(),
                description: snippet.description.clone(),
                thumbnail,
                published_at: snippet.published_at.clone(),
                channel_title: snippet.channel_title.clone(),
                view_count: details
                    .statistics
                    .view_count
                    .clone()
                    .unwrap_or_else(|| "0".to_string()),
                like_count: details
                    .statistics
                    .like_count
                    .clone()
                    .unwrap_or_else(|| "0".to_string()),
                duration,
                url: format!("https://www.youtube.com/watch?v={}", video_id),
            })
        })
        .take(limit)
        .collect()
}

/// Client for building video feeds from the YouTube Data API
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    client: Client,
    api_key: Option<String>,
    channel_id: String,
    base_url: String,
}

impl YouTubeClient {
    /// Creates a new YouTubeClient for the given channel
    pub fn new(api_key: Option<String>, channel_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            channel_id: channel_id.into(),
            base_url: YOUTUBE_API_BASE_URL.to_string(),
        }
    }

    /// Create a new YouTubeClient with a custom HTTP client
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Points the client at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    async fn get_json<R: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &'static str,
        url: &str,
    ) -> Result<R, YouTubeError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(YouTubeError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Fetches a feed of full-length videos
    ///
    /// # Arguments
    /// * `kind` - Which listing to build (latest or most viewed)
    ///
    /// # Returns
    /// * `Ok(VideoFeed)` - Up to `kind.limit()` full-length videos
    /// * `Err(YouTubeError)` - If the key is missing or a request fails
    pub async fn fetch_feed(&self, kind: FeedKind) -> Result<VideoFeed, YouTubeError> {
        let api_key = self.api_key.as_deref().ok_or(YouTubeError::MissingApiKey)?;

        let search_url = format!(
            "{}/search?part=snippet&channelId={}&order={}&type=video&maxResults={}&key={}",
            self.base_url,
            self.channel_id,
            kind.search_order(),
            SEARCH_MAX_RESULTS,
            api_key
        );
        let search: SearchResponse = self.get_json("search", &search_url).await?;
        info!(feed = %kind, found = search.items.len(), "videos found by search");

        let videos = if search.items.is_empty() {
            Vec::new()
        } else {
            let ids: Vec<&str> = search
                .items
                .iter()
                .filter_map(|item| item.id.video_id.as_deref())
                .collect();
            let details_url = format!(
                "{}/videos?part=statistics,snippet,contentDetails&id={}&key={}",
                self.base_url,
                ids.join(","),
                api_key
            );
            let details: VideosResponse = self.get_json("videos", &details_url).await?;
            select_full_videos(&search.items, &details.items, kind.limit())
        };

        info!(feed = %kind, kept = videos.len(), "built video feed");
        Ok(VideoFeed {
            videos,
            channel_id: Some(self.channel_id.clone()),
            message: Some(kind.success_message().to_string()),
        })
    }
}

/// Feeds the orchestrator straight from the YouTube API
#[derive(Debug, Clone)]
pub struct YouTubeSource {
    client: YouTubeClient,
    kind: FeedKind,
}

impl YouTubeSource {
    pub fn new(client: YouTubeClient, kind: FeedKind) -> Self {
        Self { client, kind }
    }
}

#[async_trait]
impl Source<VideoFeed> for YouTubeSource {
    async fn fetch(&self) -> Result<VideoFeed, FetchError> {
        Ok(self.client.fetch_feed(self.kind).await?)
    }

    fn describe(&self) -> String {
        format!("youtube:{}:{}", self.client.channel_id(), self.kind.search_order())
    }
}
