use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;

use crate::models::MonthBucket;

/// Formats tried against the whole token when it does not start with an
/// eight-digit stem. First match wins.
const DELIMITED_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

fn stem_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d{8})").expect("regex is valid"))
}

/// Resolve a video's free-text date token into a calendar date.
///
/// Tokens starting with eight digits are read as `YYYYMMDD`; whatever
/// follows (`-1`, `_02`, `b`, `_video1`, ...) only distinguishes videos
/// posted on the same day and is ignored. Other tokens are tried against
/// `YYYY-MM-DD`, `YYYY/MM/DD` and `YYYY.MM.DD`.
///
/// Returns `None` when nothing matches. Such videos belong to no month.
pub fn resolve_date(token: &str) -> Option<NaiveDate> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    if let Some(stem) = stem_pattern().captures(token).and_then(|c| c.get(1)) {
        let parsed = NaiveDate::parse_from_str(stem.as_str(), "%Y%m%d").ok();
        if parsed.is_none() {
            debug!("date stem {:?} in {:?} is not a calendar date", stem.as_str(), token);
        }
        return parsed;
    }

    let parsed = DELIMITED_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(token, fmt).ok());
    if parsed.is_none() {
        debug!("unrecognised date token {:?}", token);
    }
    parsed
}

/// The month bucket a token falls into, if it resolves at all.
pub fn resolve_bucket(token: &str) -> Option<MonthBucket> {
    resolve_date(token).map(MonthBucket::of)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn ymd(date: NaiveDate) -> (i32, u32, u32) {
        (date.year(), date.month(), date.day())
    }

    #[test]
    fn test_compact_stem() {
        assert_eq!(ymd(resolve_date("20251114").unwrap()), (2025, 11, 14));
    }

    #[test]
    fn test_disambiguator_suffixes_are_ignored() {
        let expected = resolve_date("20251114").unwrap();
        for token in [
            "20251114-1",
            "20251114-2",
            "20251114_01",
            "20251114a",
            "20251114b",
            "20251114_video1",
        ] {
            assert_eq!(resolve_date(token), Some(expected), "token {token:?}");
        }
    }

    #[test]
    fn test_delimited_formats() {
        for token in ["2025-11-14", "2025/11/14", "2025.11.14"] {
            assert_eq!(ymd(resolve_date(token).unwrap()), (2025, 11, 14), "token {token:?}");
        }
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert_eq!(ymd(resolve_date(" 20251114").unwrap()), (2025, 11, 14));
        assert_eq!(ymd(resolve_date("2025-11-14\n").unwrap()), (2025, 11, 14));
    }

    #[test]
    fn test_mixed_delimiters_are_rejected() {
        assert!(resolve_date("2025-11/14").is_none());
    }

    #[test]
    fn test_invalid_tokens() {
        for token in ["invalid", "", "2025", "   ", "20251399-1", "14/11/2025"] {
            assert!(resolve_date(token).is_none(), "token {token:?}");
        }
    }

    #[test]
    fn test_resolve_bucket() {
        assert_eq!(
            resolve_bucket("20251114-3"),
            Some(MonthBucket::new(2025, 11).unwrap())
        );
        assert_eq!(resolve_bucket("no date"), None);
    }
}
