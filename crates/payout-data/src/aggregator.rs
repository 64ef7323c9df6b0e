//! Per-link view aggregation.
//!
//! A video may be posted on several platforms; its view count is the sum of
//! every link that could be fetched. Links that fail contribute nothing and
//! are reported, never retried here.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use payout_core::calculations::SettlementCalculator;
use payout_core::models::{Creator, Settlement, Video};
use serde::Serialize;
use tracing::{debug, warn};

// ── ViewSource ────────────────────────────────────────────────────────────────

/// The scraping boundary: a view count for one URL, or `None` on failure.
pub trait ViewSource {
    fn fetch_views(&mut self, url: &str) -> Option<u64>;
}

impl<F> ViewSource for F
where
    F: FnMut(&str) -> Option<u64>,
{
    fn fetch_views(&mut self, url: &str) -> Option<u64> {
        self(url)
    }
}

// ── Platform ──────────────────────────────────────────────────────────────────

/// Platform a link points at, recognised from its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    TikTok,
    Unknown,
}

impl Platform {
    pub fn from_url(url: &str) -> Self {
        let url = url.to_lowercase();
        if url.contains("instagram.com") || url.contains("instagr.am") {
            Platform::Instagram
        } else if url.contains("tiktok.com") {
            Platform::TikTok
        } else {
            Platform::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::TikTok => "tiktok",
            Platform::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── VideoViews ────────────────────────────────────────────────────────────────

/// Fetch result for one link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkViews {
    pub url: String,
    pub platform: Platform,
    pub views: Option<u64>,
}

/// Per-link results for one video.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoViews {
    pub links: Vec<LinkViews>,
}

impl VideoViews {
    /// Sum of every successfully fetched link, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.links
            .iter()
            .filter_map(|l| l.views)
            .fold(0u64, u64::saturating_add)
    }

    pub fn succeeded(&self) -> usize {
        self.links.iter().filter(|l| l.views.is_some()).count()
    }

    pub fn failed_links(&self) -> Vec<String> {
        self.links
            .iter()
            .filter(|l| l.views.is_none())
            .map(|l| l.url.clone())
            .collect()
    }

    /// At least one link succeeded.
    pub fn is_updatable(&self) -> bool {
        self.succeeded() > 0
    }

    /// Some links succeeded and some failed.
    pub fn is_shortfall(&self) -> bool {
        self.is_updatable() && self.succeeded() < self.links.len()
    }

    /// Successful views summed per platform.
    pub fn by_platform(&self) -> BTreeMap<Platform, u64> {
        let mut map = BTreeMap::new();
        for link in &self.links {
            if let Some(views) = link.views {
                let sum = map.entry(link.platform).or_insert(0u64);
                *sum = sum.saturating_add(views);
            }
        }
        map
    }
}

// ── Refresh outcomes ──────────────────────────────────────────────────────────

/// Something worth telling the operator about a single video.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RefreshIssue {
    /// Some links failed; the total covers only the rest.
    Shortfall {
        creator: String,
        video: String,
        failed_links: Vec<String>,
        partial_total: u64,
    },
    /// Every link failed; the stored count was left as it was.
    AllLinksFailed { creator: String, video: String },
    /// The fetched total was below the stored count, which was kept.
    Regression {
        creator: String,
        video: String,
        stored: u64,
        fetched: u64,
    },
}

impl fmt::Display for RefreshIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshIssue::Shortfall {
                creator,
                video,
                failed_links,
                partial_total,
            } => write!(
                f,
                "{creator} / {video}: {} link(s) failed, partial total {partial_total}",
                failed_links.len()
            ),
            RefreshIssue::AllLinksFailed { creator, video } => {
                write!(f, "{creator} / {video}: all links failed")
            }
            RefreshIssue::Regression {
                creator,
                video,
                stored,
                fetched,
            } => write!(
                f,
                "{creator} / {video}: fetched {fetched} is below stored {stored}, kept {stored}"
            ),
        }
    }
}

/// Refresh result for one creator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatorRefresh {
    pub name: String,
    pub label: String,
    pub videos_updated: u64,
    /// Stored views of the updated videos after the refresh.
    pub total_views: u64,
    pub warnings: Vec<RefreshIssue>,
    pub errors: Vec<RefreshIssue>,
}

/// Totals for a whole refresh pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RefreshReport {
    pub creators_processed: usize,
    pub videos_updated: u64,
    pub total_views: u64,
    pub warnings: Vec<RefreshIssue>,
    pub errors: Vec<RefreshIssue>,
    pub creator_details: Vec<CreatorRefresh>,
}

impl RefreshReport {
    pub fn absorb(&mut self, creator: CreatorRefresh) {
        self.creators_processed += 1;
        self.videos_updated = self.videos_updated.saturating_add(creator.videos_updated);
        self.total_views = self.total_views.saturating_add(creator.total_views);
        self.warnings.extend(creator.warnings.iter().cloned());
        self.errors.extend(creator.errors.iter().cloned());
        self.creator_details.push(creator);
    }

    /// Settlement preview for every creator with at least one updated video,
    /// treating the updated videos as the month's set.
    pub fn previews(&self, calculator: &SettlementCalculator) -> Vec<(String, Settlement)> {
        self.creator_details
            .iter()
            .filter(|c| c.videos_updated > 0)
            .map(|c| {
                let settlement =
                    calculator.compute_settlement(c.videos_updated, c.total_views, &c.label);
                (c.name.clone(), settlement)
            })
            .collect()
    }
}

// ── ViewAggregator ────────────────────────────────────────────────────────────

/// Stateless helper that sums per-link counts into per-video totals.
pub struct ViewAggregator;

impl ViewAggregator {
    /// Fetch every distinct link of `video` once and collect the results.
    pub fn aggregate<S: ViewSource + ?Sized>(video: &Video, source: &mut S) -> VideoViews {
        let mut seen = HashSet::new();
        let links = video
            .links
            .iter()
            .filter(|url| seen.insert(url.as_str()))
            .map(|url| {
                let platform = Platform::from_url(url);
                let views = source.fetch_views(url);
                match views {
                    Some(v) => debug!("  {} [{}]: {} views", url, platform, v),
                    None => debug!("  {} [{}]: fetch failed", url, platform),
                }
                LinkViews {
                    url: url.clone(),
                    platform,
                    views,
                }
            })
            .collect();
        VideoViews { links }
    }

    /// Refresh every linked video of `creator` in place.
    ///
    /// Updatable videos get the aggregated total unless that is lower than
    /// the stored count; stored counts are never decremented. Videos whose
    /// links all fail keep their stored count and are reported as errors.
    /// Videos without links are skipped.
    pub fn refresh_creator<S: ViewSource + ?Sized>(
        creator: &mut Creator,
        source: &mut S,
    ) -> CreatorRefresh {
        let mut result = CreatorRefresh {
            name: creator.name.clone(),
            label: creator.label.clone(),
            videos_updated: 0,
            total_views: 0,
            warnings: Vec::new(),
            errors: Vec::new(),
        };

        for video in creator.videos.iter_mut().filter(|v| !v.links.is_empty()) {
            let video_name = video_display_name(video);
            let views = Self::aggregate(video, source);

            if !views.is_updatable() {
                warn!("{} / {}: all links failed", creator.name, video_name);
                result.errors.push(RefreshIssue::AllLinksFailed {
                    creator: creator.name.clone(),
                    video: video_name,
                });
                continue;
            }

            let fetched = views.total();
            if views.is_shortfall() {
                warn!(
                    "{} / {}: partial total {} ({} link(s) failed)",
                    creator.name,
                    video_name,
                    fetched,
                    views.links.len() - views.succeeded()
                );
                result.warnings.push(RefreshIssue::Shortfall {
                    creator: creator.name.clone(),
                    video: video_name.clone(),
                    failed_links: views.failed_links(),
                    partial_total: fetched,
                });
            }

            if fetched < video.current_views {
                result.warnings.push(RefreshIssue::Regression {
                    creator: creator.name.clone(),
                    video: video_name.clone(),
                    stored: video.current_views,
                    fetched,
                });
            } else {
                video.current_views = fetched;
            }

            debug!("{} / {} -> {} views", creator.name, video_name, video.current_views);
            result.videos_updated += 1;
            result.total_views = result.total_views.saturating_add(video.current_views);
        }

        result
    }
}

/// Name used in diagnostics: the date token, or the row id when it is blank.
fn video_display_name(video: &Video) -> String {
    if video.date_token.trim().is_empty() {
        video.id.clone()
    } else {
        video.date_token.clone()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn video(token: &str, links: &[&str], current: u64) -> Video {
        Video {
            id: format!("row-{token}"),
            date_token: token.to_string(),
            links: links.iter().map(|s| s.to_string()).collect(),
            current_views: current,
        }
    }

    fn source(counts: &[(&str, u64)]) -> impl FnMut(&str) -> Option<u64> {
        let map: HashMap<String, u64> = counts.iter().map(|(u, v)| (u.to_string(), *v)).collect();
        move |url: &str| map.get(url).copied()
    }

    const IG: &str = "https://www.instagram.com/reel/abc/";
    const TT: &str = "https://www.tiktok.com/@sora/video/1";

    #[test]
    fn test_platform_from_url() {
        assert_eq!(Platform::from_url(IG), Platform::Instagram);
        assert_eq!(Platform::from_url("https://INSTAGR.AM/p/x"), Platform::Instagram);
        assert_eq!(Platform::from_url(TT), Platform::TikTok);
        assert_eq!(Platform::from_url("https://youtube.com/shorts/x"), Platform::Unknown);
    }

    #[test]
    fn test_aggregate_sums_all_links() {
        let v = video("20251114-1", &[IG, TT], 0);
        let views = ViewAggregator::aggregate(&v, &mut source(&[(IG, 500), (TT, 291)]));
        assert_eq!(views.total(), 791);
        assert!(views.is_updatable());
        assert!(!views.is_shortfall());
        assert_eq!(views.by_platform()[&Platform::TikTok], 291);
    }

    #[test]
    fn test_aggregate_failed_link_contributes_zero() {
        let v = video("20251114-1", &[IG, TT], 0);
        let views = ViewAggregator::aggregate(&v, &mut source(&[(TT, 291)]));
        assert_eq!(views.total(), 291);
        assert!(views.is_shortfall());
        assert_eq!(views.failed_links(), vec![IG.to_string()]);
    }

    #[test]
    fn test_aggregate_total_saturates() {
        let v = video("20251114-1", &[IG, TT], 0);
        let views = ViewAggregator::aggregate(&v, &mut source(&[(IG, u64::MAX), (TT, 10)]));
        assert_eq!(views.total(), u64::MAX);
    }

    #[test]
    fn test_refresh_totals_saturate() {
        let mut creator = Creator {
            id: "c1".into(),
            name: "Huge".into(),
            label: "Core UGC".into(),
            videos: vec![video("20251101", &[IG], 0), video("20251102", &[TT], 0)],
        };
        let half = u64::MAX / 2 + 1;
        let result =
            ViewAggregator::refresh_creator(&mut creator, &mut source(&[(IG, half), (TT, half)]));
        assert_eq!(result.total_views, u64::MAX);

        let mut report = RefreshReport::default();
        report.absorb(result.clone());
        report.absorb(result);
        assert_eq!(report.total_views, u64::MAX);
    }

    #[test]
    fn test_aggregate_duplicate_links_fetched_once() {
        let v = video("20251114-1", &[TT, TT], 0);
        let mut calls = 0;
        let views = ViewAggregator::aggregate(&v, &mut |_: &str| -> Option<u64> {
            calls += 1;
            Some(100)
        });
        assert_eq!(views.total(), 100);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_refresh_creator_updates_and_reports() {
        let mut creator = Creator {
            id: "c1".into(),
            name: "Sora".into(),
            label: "Core UGC".into(),
            videos: vec![
                video("20251114-1", &[IG, TT], 100),
                video("20251115", &["https://www.tiktok.com/@sora/video/dead"], 40),
                video("20251116", &[], 999),
            ],
        };
        let result =
            ViewAggregator::refresh_creator(&mut creator, &mut source(&[(IG, 500), (TT, 291)]));

        assert_eq!(creator.videos[0].current_views, 791);
        assert_eq!(creator.videos[1].current_views, 40, "all-failed keeps stored count");
        assert_eq!(creator.videos[2].current_views, 999, "unlinked video untouched");
        assert_eq!(result.videos_updated, 1);
        assert_eq!(result.total_views, 791);
        assert_eq!(result.errors.len(), 1);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_refresh_creator_never_decrements() {
        let mut creator = Creator {
            id: "c1".into(),
            name: "Jeon".into(),
            label: "discord ugc".into(),
            videos: vec![video("20251116", &[IG, TT], 2_835)],
        };
        let result = ViewAggregator::refresh_creator(&mut creator, &mut source(&[(TT, 1_200)]));

        assert_eq!(creator.videos[0].current_views, 2_835);
        assert_eq!(result.videos_updated, 1);
        assert_eq!(result.total_views, 2_835);
        assert_eq!(result.warnings.len(), 2, "shortfall plus regression");
        assert!(matches!(result.warnings[1], RefreshIssue::Regression { stored: 2_835, .. }));
    }

    #[test]
    fn test_report_absorb_and_previews() {
        let mut report = RefreshReport::default();
        report.absorb(CreatorRefresh {
            name: "Sora".into(),
            label: "Core UGC".into(),
            videos_updated: 2,
            total_views: 3_500,
            warnings: vec![],
            errors: vec![RefreshIssue::AllLinksFailed {
                creator: "Sora".into(),
                video: "20251101".into(),
            }],
        });
        report.absorb(CreatorRefresh {
            name: "Idle".into(),
            label: String::new(),
            videos_updated: 0,
            total_views: 0,
            warnings: vec![],
            errors: vec![],
        });

        assert_eq!(report.creators_processed, 2);
        assert_eq!(report.videos_updated, 2);
        assert_eq!(report.errors.len(), 1);

        let previews = report.previews(&SettlementCalculator::default());
        assert_eq!(previews.len(), 1);
        assert_eq!(previews[0].0, "Sora");
        assert_eq!(previews[0].1.total, 43.0);
    }

    #[test]
    fn test_issue_display() {
        let issue = RefreshIssue::AllLinksFailed {
            creator: "Sora".into(),
            video: "20251114-1".into(),
        };
        assert_eq!(issue.to_string(), "Sora / 20251114-1: all links failed");
    }
}
