use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{PayoutError, Result};
use crate::tiers::Tier;

/// A single video row as exported by the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    /// Opaque row identifier from the workspace.
    #[serde(default)]
    pub id: String,
    /// Free-text date token, e.g. `"20251114-2"` or `"2025/11/14"`.
    #[serde(default, alias = "dateToken", alias = "name")]
    pub date_token: String,
    /// Platform URLs for this video. Treated as an unordered set.
    #[serde(default)]
    pub links: Vec<String>,
    /// View count recorded in the workspace, already summed across links.
    #[serde(default, alias = "currentViews")]
    pub current_views: u64,
}

/// A creator and the snapshot of their videos for one computation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    /// Opaque page identifier from the workspace.
    #[serde(default)]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Unvalidated tier label, e.g. `"Core UGC"`.
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub videos: Vec<Video>,
}

/// A calendar (year, month) pair used to select videos for a settlement run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthBucket {
    pub year: i32,
    pub month: u32,
}

impl MonthBucket {
    /// Build a bucket, rejecting months outside `1..=12`.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(PayoutError::InvalidBucket { year, month });
        }
        Ok(Self { year, month })
    }

    /// The bucket a calendar date falls into.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Whether `date` lies inside this bucket.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for MonthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Pay breakdown for one creator's video set, before it is attached to a
/// creator and a bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub tier: Tier,
    pub video_count: u64,
    pub total_views: u64,
    pub base_pay: f64,
    pub commission: f64,
    pub total: f64,
}

/// One row of a monthly ledger.
///
/// Field order is the persisted column order:
/// `creator, label, ugc_type, video_count, total_views, base_pay,
/// commission, total, year, month`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementLine {
    pub creator: String,
    pub label: String,
    /// Serialised as the human-readable tier descriptor.
    #[serde(rename = "ugc_type")]
    pub tier: Tier,
    pub video_count: u64,
    pub total_views: u64,
    pub base_pay: f64,
    pub commission: f64,
    pub total: f64,
    pub year: i32,
    pub month: u32,
}

impl SettlementLine {
    pub fn new(creator: &Creator, bucket: MonthBucket, settlement: Settlement) -> Self {
        Self {
            creator: creator.name.clone(),
            label: creator.label.clone(),
            tier: settlement.tier,
            video_count: settlement.video_count,
            total_views: settlement.total_views,
            base_pay: settlement.base_pay,
            commission: settlement.commission,
            total: settlement.total,
            year: bucket.year,
            month: bucket.month,
        }
    }

    pub fn bucket(&self) -> MonthBucket {
        MonthBucket {
            year: self.year,
            month: self.month,
        }
    }
}

/// Column names of a persisted ledger, in order.
pub const LEDGER_COLUMNS: [&str; 10] = [
    "creator",
    "label",
    "ugc_type",
    "video_count",
    "total_views",
    "base_pay",
    "commission",
    "total",
    "year",
    "month",
];

/// All settlement lines for one bucket, in creator input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub bucket: MonthBucket,
    pub lines: Vec<SettlementLine>,
}

impl Ledger {
    pub fn new(bucket: MonthBucket, lines: Vec<SettlementLine>) -> Self {
        Self { bucket, lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Look up the line for a creator by display name.
    pub fn line_for(&self, creator: &str) -> Option<&SettlementLine> {
        self.lines.iter().find(|l| l.creator == creator)
    }

    /// Sum every line into a single summary row.
    pub fn totals(&self) -> LedgerTotals {
        let mut totals = LedgerTotals::default();
        for line in &self.lines {
            totals.creators += 1;
            totals.videos = totals.videos.saturating_add(line.video_count);
            totals.views = totals.views.saturating_add(line.total_views);
            totals.base_pay += line.base_pay;
            totals.commission += line.commission;
            totals.total += line.total;
        }
        totals
    }
}

/// Summary figures across a whole ledger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerTotals {
    pub creators: usize,
    pub videos: u64,
    pub views: u64,
    pub base_pay: f64,
    pub commission: f64,
    pub total: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(creator: &str, videos: u64, views: u64, base: f64, commission: f64) -> SettlementLine {
        SettlementLine {
            creator: creator.to_string(),
            label: String::new(),
            tier: Tier::Secondary,
            video_count: videos,
            total_views: views,
            base_pay: base,
            commission,
            total: base + commission,
            year: 2025,
            month: 11,
        }
    }

    #[test]
    fn test_month_bucket_rejects_out_of_range_month() {
        assert!(MonthBucket::new(2025, 0).is_err());
        assert!(MonthBucket::new(2025, 13).is_err());
        assert!(MonthBucket::new(2025, 12).is_ok());
    }

    #[test]
    fn test_month_bucket_contains_and_display() {
        let bucket = MonthBucket::new(2025, 3).unwrap();
        assert!(bucket.contains(NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()));
        assert!(!bucket.contains(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()));
        assert!(!bucket.contains(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()));
        assert_eq!(bucket.to_string(), "2025-03");
    }

    #[test]
    fn test_month_bucket_orders_chronologically() {
        let mut buckets = vec![
            MonthBucket::new(2025, 2).unwrap(),
            MonthBucket::new(2024, 12).unwrap(),
            MonthBucket::new(2025, 11).unwrap(),
        ];
        buckets.sort();
        assert_eq!(buckets[0], MonthBucket::new(2024, 12).unwrap());
        assert_eq!(buckets[2], MonthBucket::new(2025, 11).unwrap());
    }

    #[test]
    fn test_ledger_totals() {
        let bucket = MonthBucket::new(2025, 11).unwrap();
        let ledger = Ledger::new(
            bucket,
            vec![line("Sora", 1, 791, 20.0, 0.0), line("Jeon", 2, 2835, 20.0, 2.0)],
        );
        let totals = ledger.totals();
        assert_eq!(totals.creators, 2);
        assert_eq!(totals.videos, 3);
        assert_eq!(totals.views, 3626);
        assert_eq!(totals.commission, 2.0);
        assert_eq!(totals.total, 42.0);
    }

    #[test]
    fn test_ledger_line_for() {
        let bucket = MonthBucket::new(2025, 11).unwrap();
        let ledger = Ledger::new(bucket, vec![line("Sora", 1, 791, 20.0, 0.0)]);
        assert!(ledger.line_for("Sora").is_some());
        assert!(ledger.line_for("Jeon").is_none());
    }

    #[test]
    fn test_video_deserializes_workspace_aliases() {
        let json = r#"{"id":"v1","dateToken":"20251114-1","links":["https://tiktok.com/x"],"currentViews":42}"#;
        let video: Video = serde_json::from_str(json).unwrap();
        assert_eq!(video.date_token, "20251114-1");
        assert_eq!(video.current_views, 42);
        assert_eq!(video.links.len(), 1);
    }

    #[test]
    fn test_creator_missing_fields_default() {
        let creator: Creator = serde_json::from_str(r#"{"name":"Sora"}"#).unwrap();
        assert_eq!(creator.label, "");
        assert!(creator.videos.is_empty());
    }
}
