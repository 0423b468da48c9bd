//! Plain-text rendering of feeds and cache status

use std::fmt::Write;

use chrono::Local;

use crate::app::CacheReport;
use crate::cache::CacheStatus;
use crate::fetch::FetchState;
use crate::metrics::MetricsSnapshot;
use crate::video::{FeedKind, VideoFeed};

/// Renders one feed section, with an error banner above the data when a load failed
pub fn render_feed(kind: FeedKind, state: &FetchState<VideoFeed>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", kind);

    if let Some(error) = &state.error {
        let _ = writeln!(out, "! {} (showing placeholder or cached content)", error);
    }

    match &state.data {
        Some(feed) if !feed.videos.is_empty() => {
            for (i, video) in feed.videos.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{:>2}. {}  [{} views]",
                    i + 1,
                    video.title,
                    video.view_count
                );
                let _ = writeln!(out, "    {}", video.url);
            }
        }
        Some(_) => {
            let _ = writeln!(out, "No videos found.");
        }
        None => {
            let _ = writeln!(out, "No data available.");
        }
    }

    out
}

/// Renders `cache info` output
pub fn render_cache_report(reports: &[CacheReport], now_millis: i64) -> String {
    let mut out = String::new();

    for report in reports {
        let status = match &report.info {
            None => "No cache".to_string(),
            Some(info) => info.status(now_millis).to_string(),
        };
        let _ = writeln!(
            out,
            "{} ({}): {}",
            report.kind,
            report.kind.cache_key(),
            status
        );

        if let Some(info) = &report.info {
            if let Some(stored_at) = info.stored_at_utc() {
                let _ = writeln!(
                    out,
                    "  Cached: {}",
                    stored_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
                );
            }
            if info.status(now_millis) == CacheStatus::Valid {
                let _ = writeln!(out, "  Expires: {}", info.remaining_label(now_millis));
            }
        }
    }

    out
}

/// One-line summary of cache and fetch counters, logged at the end of a run
pub fn render_metrics(snapshot: &MetricsSnapshot) -> String {
    let hit_rate = snapshot
        .hit_rate()
        .map(|r| format!("{:.0}%", r * 100.0))
        .unwrap_or_else(|| "n/a".to_string());
    format!(
        "cache hits {} / misses {} ({}), fetched {}, failed {}, stale {}",
        snapshot.cache_hits,
        snapshot.cache_misses,
        hit_rate,
        snapshot.network_successes,
        snapshot.network_failures,
        snapshot.stale_responses
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheInfo;
    use crate::video::fallback_feed;

    #[test]
    fn test_render_feed_shows_error_banner_and_fallback() {
        let state = FetchState {
            data: Some(fallback_feed(FeedKind::MostViewed)),
            loading: false,
            error: Some("HTTP error! status: 500".to_string()),
        };

        let text = render_feed(FeedKind::MostViewed, &state);

        assert!(text.starts_with("== Most Viewed Videos =="));
        assert!(text.contains("! HTTP error! status: 500"));
        assert!(text.contains(" 1. Most Popular Video from @savagecarol  [50000 views]"));
        assert!(text.contains(" 3. Third Most Popular Video"));
    }

    #[test]
    fn test_render_feed_without_data() {
        let text = render_feed(FeedKind::Latest, &FetchState::default());
        assert!(text.contains("No data available."));
    }

    #[test]
    fn test_render_cache_report_statuses() {
        let hour = 3_600_000;
        let reports = vec![
            CacheReport {
                kind: FeedKind::Latest,
                info: Some(CacheInfo {
                    stored_at: 0,
                    expires_at: 24 * hour,
                }),
            },
            CacheReport {
                kind: FeedKind::MostViewed,
                info: None,
            },
        ];

        let text = render_cache_report(&reports, 2 * hour);

        assert!(text.contains("Latest Videos (youtube_latest_videos): Valid"));
        assert!(text.contains("Expires: 22h 0m remaining"));
        assert!(text.contains("Most Viewed Videos (youtube_most_viewed_videos): No cache"));

        let expired = render_cache_report(&reports, 25 * hour);
        assert!(expired.contains("Latest Videos (youtube_latest_videos): Expired"));
        assert!(!expired.contains("Expires:"));
    }

    #[test]
    fn test_render_metrics_without_lookups() {
        let text = render_metrics(&MetricsSnapshot::default());
        assert!(text.contains("(n/a)"));
    }
}
