//! Short-form video detection
//!
//! The full-video listings exclude anything that looks like a short, judged
//! by title markers first and by duration second.

use once_cell::sync::Lazy;
use regex::Regex;

/// Title substrings that mark a video as short-form (matched case-insensitively)
pub const SHORT_TITLE_MARKERS: &[&str] = &["short", "#shorts", "shorts", "quick", "tip", "hack"];

/// Videos strictly shorter than this are short-form
pub const SHORT_THRESHOLD_SECS: u64 = 90;

/// `PT#H#M#S`, unanchored; every component is optional
///
/// Digits are ASCII only (`\d` would also accept other Unicode digits).
static DURATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"PT(?:([0-9]+)H)?(?:([0-9]+)M)?(?:([0-9]+)S)?")
        .expect("Invalid duration pattern regex")
});

/// Parses a `PT#H#M#S` duration into total seconds
///
/// The first `PT` in the string starts the duration; each of the hour,
/// minute and second components is optional but must appear in that order.
/// Returns `None` if there is no `PT` at all.
pub fn parse_duration_secs(duration: &str) -> Option<u64> {
    let captures = DURATION_PATTERN.captures(duration)?;

    let component = |index: usize| -> u64 {
        captures
            .get(index)
            .map(|m| m.as_str().parse::<u64>().unwrap_or(u64::MAX))
            .unwrap_or(0)
    };

    let total = component(1)
        .saturating_mul(3600)
        .saturating_add(component(2).saturating_mul(60))
        .saturating_add(component(3));
    Some(total)
}

/// Whether a video is short-form and should be left out of full-video listings
///
/// True when the lowercased title contains any of [`SHORT_TITLE_MARKERS`], or
/// when the duration parses to fewer than [`SHORT_THRESHOLD_SECS`] seconds.
/// An unparsable duration keeps the video.
pub fn is_short_video(duration: &str, title: &str) -> bool {
    let title_lower = title.to_lowercase();
    if SHORT_TITLE_MARKERS
        .iter()
        .any(|marker| title_lower.contains(marker))
    {
        return true;
    }

    match parse_duration_secs(duration) {
        Some(total) => total < SHORT_THRESHOLD_SECS,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_just_under_threshold_is_short() {
        assert!(is_short_video("PT1M29S", "Full Tutorial"));
    }

    #[test]
    fn test_just_over_threshold_is_not_short() {
        assert!(!is_short_video("PT1M31S", "Full Tutorial"));
    }

    #[test]
    fn test_exactly_threshold_is_not_short() {
        assert!(!is_short_video("PT1M30S", "Full Tutorial"));
    }

    #[test]
    fn test_title_marker_overrides_duration() {
        assert!(is_short_video("PT10M0S", "Quick tip on Git"));
        assert!(is_short_video("PT45M", "My #Shorts compilation"));
        assert!(is_short_video("PT1H", "Life HACKS for developers"));
    }

    #[test]
    fn test_marker_matches_inside_words() {
        // "tip" inside "multiple" is still a marker hit
        assert!(is_short_video("PT20M", "Multiple services in one repo"));
    }

    #[test]
    fn test_unparsable_duration_keeps_video() {
        assert!(!is_short_video("", "Deep dive"));
        assert!(!is_short_video("P0D", "Live stream"));
        assert_eq!(parse_duration_secs("garbage"), None);
    }

    #[test]
    fn test_parse_duration_components() {
        assert_eq!(parse_duration_secs("PT1H2M3S"), Some(3723));
        assert_eq!(parse_duration_secs("PT2H"), Some(7200));
        assert_eq!(parse_duration_secs("PT45S"), Some(45));
        assert_eq!(parse_duration_secs("PT15M"), Some(900));
        assert_eq!(parse_duration_secs("PT1H30S"), Some(3630));
    }

    #[test]
    fn test_bare_pt_is_zero_seconds() {
        assert_eq!(parse_duration_secs("PT"), Some(0));
        assert!(is_short_video("PT", "Full Tutorial"));
    }

    #[test]
    fn test_day_component_is_not_understood() {
        // "P1DT2H" has no "PT" substring, so it does not parse
        assert_eq!(parse_duration_secs("P1DT2H"), None);
    }

    #[test]
    fn test_out_of_order_components_stop_parsing() {
        // Components are read in H, M, S order; minutes after seconds are ignored
        assert_eq!(parse_duration_secs("PT30S5M"), Some(30));
    }

    #[test]
    fn test_duration_found_inside_longer_string() {
        assert_eq!(parse_duration_secs("xxPT2M5Syy"), Some(125));
        assert_eq!(parse_duration_secs("PTxyz"), Some(0));
    }

    #[test]
    fn test_non_ascii_digits_are_not_components() {
        // Arabic-Indic digits do not count as a minutes component
        assert_eq!(parse_duration_secs("PT\u{0665}M"), Some(0));
    }

    #[test]
    fn test_oversized_component_saturates() {
        assert_eq!(parse_duration_secs("PT99999999999999999999999H"), Some(u64::MAX));
        assert!(!is_short_video("PT99999999999999999999999S", "Full Tutorial"));
    }
}
