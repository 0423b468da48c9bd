//! Video feed models and the YouTube feed pipeline
//!
//! This module contains the data types shared by the YouTube client, the
//! cache and the CLI output, plus the two reserved feeds the site shows.

pub mod classify;
pub mod youtube;

pub use classify::{is_short_video, parse_duration_secs};
pub use youtube::{select_full_videos, YouTubeClient, YouTubeError, YouTubeSource};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Channel the portfolio pulls videos from (@savagecarol)
pub const DEFAULT_CHANNEL_ID: &str = "UCKP5ZAwrOVCb1P6Mlhxjdmg";

/// Channel page used by placeholder videos
const CHANNEL_URL: &str = "https://youtube.com/@savagecarol";

/// A full-length video as shown on the site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    /// High-resolution thumbnail, or medium when high is missing
    pub thumbnail: Option<String>,
    pub published_at: String,
    pub channel_title: String,
    /// View count as reported by YouTube (a decimal string)
    pub view_count: String,
    pub like_count: String,
    /// ISO-8601 duration, e.g. "PT12M3S"
    #[serde(default)]
    pub duration: String,
    pub url: String,
}

/// Envelope returned by the feed endpoints and stored in the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoFeed {
    pub videos: Vec<Video>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// The two video listings the site shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    Latest,
    MostViewed,
}

impl FeedKind {
    pub fn all() -> &'static [FeedKind] {
        &[FeedKind::Latest, FeedKind::MostViewed]
    }

    /// Reserved cache key for this feed
    pub fn cache_key(self) -> &'static str {
        match self {
            FeedKind::Latest => "youtube_latest_videos",
            FeedKind::MostViewed => "youtube_most_viewed_videos",
        }
    }

    /// `order` parameter of the YouTube search API
    pub fn search_order(self) -> &'static str {
        match self {
            FeedKind::Latest => "date",
            FeedKind::MostViewed => "viewCount",
        }
    }

    /// How many full videos the listing keeps
    pub fn limit(self) -> usize {
        match self {
            FeedKind::Latest => 6,
            FeedKind::MostViewed => 3,
        }
    }

    /// Path of the proxy endpoint serving this feed
    pub fn proxy_path(self) -> &'static str {
        match self {
            FeedKind::Latest => "/api/youtube/latest",
            FeedKind::MostViewed => "/api/youtube/most-viewed",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            FeedKind::Latest => "Latest Videos",
            FeedKind::MostViewed => "Most Viewed Videos",
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            FeedKind::Latest => "Latest videos fetched successfully",
            FeedKind::MostViewed => "Most viewed videos fetched successfully",
        }
    }

    /// Parses a feed name from user input
    pub fn from_str(s: &str) -> Option<FeedKind> {
        match s.to_lowercase().trim() {
            "latest" | "recent" | "new" => Some(FeedKind::Latest),
            "most-viewed" | "most_viewed" | "popular" | "top" => Some(FeedKind::MostViewed),
            _ => None,
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

type Placeholder = (&'static str, &'static str, &'static str, u32, u32);

const LATEST_PLACEHOLDERS: &[Placeholder] = &[
    ("1", "Latest Video from @savagecarol", "Amazing content from your YouTube channel", 1000, 100),
    ("2", "Another Great Video", "More awesome content from your channel", 800, 80),
    ("3", "Must Watch Content", "Don't miss this amazing video", 600, 60),
    ("4", "Fourth Latest Video", "Another great video from your channel", 500, 50),
    ("5", "Fifth Latest Video", "More amazing content for you", 400, 40),
    ("6", "Sixth Latest Video", "The latest addition to your channel", 300, 30),
];

const MOST_VIEWED_PLACEHOLDERS: &[Placeholder] = &[
    (
        "1",
        "Most Popular Video from @savagecarol",
        "This is my most viewed video with amazing content and insights",
        50000,
        2500,
    ),
    ("2", "Second Most Popular Video", "Another highly viewed video from my channel", 35000, 1800),
    ("3", "Third Most Popular Video", "This video also performed really well", 25000, 1200),
];

/// Placeholder videos shown when a feed cannot be loaded
pub fn fallback_feed(kind: FeedKind) -> VideoFeed {
    let placeholders = match kind {
        FeedKind::Latest => LATEST_PLACEHOLDERS,
        FeedKind::MostViewed => MOST_VIEWED_PLACEHOLDERS,
    };

    let videos = placeholders
        .iter()
        .take(kind.limit())
        .map(|(id, title, description, views, likes)| Video {
            id: (*id).to_string(),
            title: (*title).to_string(),
            description: (*description).to_string(),
            thumbnail: Some(format!("/api/placeholder/youtube{}", id)),
            published_at: String::new(),
            channel_title: "@savagecarol".to_string(),
            view_count: views.to_string(),
            like_count: likes.to_string(),
            duration: String::new(),
            url: CHANNEL_URL.to_string(),
        })
        .collect();

    VideoFeed {
        videos,
        channel_id: None,
        message: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_cache_keys_are_distinct() {
        assert_eq!(FeedKind::Latest.cache_key(), "youtube_latest_videos");
        assert_eq!(FeedKind::MostViewed.cache_key(), "youtube_most_viewed_videos");
    }

    #[test]
    fn test_feed_kind_from_str_aliases() {
        assert_eq!(FeedKind::from_str("latest"), Some(FeedKind::Latest));
        assert_eq!(FeedKind::from_str(" Most-Viewed "), Some(FeedKind::MostViewed));
        assert_eq!(FeedKind::from_str("popular"), Some(FeedKind::MostViewed));
        assert_eq!(FeedKind::from_str("oldest"), None);
    }

    #[test]
    fn test_fallback_feed_respects_limit() {
        assert_eq!(fallback_feed(FeedKind::Latest).videos.len(), 6);
        let most_viewed = fallback_feed(FeedKind::MostViewed);
        assert_eq!(most_viewed.videos.len(), 3);
        assert_eq!(most_viewed.videos[0].title, "Most Popular Video from @savagecarol");
        assert_eq!(most_viewed.videos[0].view_count, "50000");
        assert_eq!(most_viewed.videos[0].like_count, "2500");
        assert_eq!(most_viewed.videos[2].title, "Third Most Popular Video");

        let latest = fallback_feed(FeedKind::Latest);
        assert_eq!(latest.videos[0].title, "Latest Video from @savagecarol");
        assert_eq!(latest.videos[5].like_count, "30");
    }

    #[test]
    fn test_feed_envelope_uses_camel_case() {
        let feed = VideoFeed {
            videos: vec![],
            channel_id: Some(DEFAULT_CHANNEL_ID.to_string()),
            message: Some("ok".to_string()),
        };
        let json = serde_json::to_value(&feed).unwrap();
        assert_eq!(json["channelId"], DEFAULT_CHANNEL_ID);

        let parsed: VideoFeed = serde_json::from_str(r#"{"videos":[]}"#).unwrap();
        assert!(parsed.channel_id.is_none());
    }
}
