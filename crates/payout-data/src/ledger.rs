//! Monthly ledger construction.
//!
//! Buckets each creator's videos by the month their date token resolves to
//! and settles the ones that fall in the requested month.

use std::fmt;

use payout_core::calculations::SettlementCalculator;
use payout_core::dates::resolve_date;
use payout_core::models::{Creator, Ledger, MonthBucket, SettlementLine};
use serde::Serialize;
use tracing::{debug, info};

// ── Diagnostics ───────────────────────────────────────────────────────────────

/// Per-video note raised while building a ledger. None of these stop the
/// build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerDiagnostic {
    /// The date token did not resolve, so the video is in no month.
    UnparseableDate { creator: String, token: String },
    /// The video has no platform links and is never settled.
    NoLinks { creator: String, token: String },
}

impl fmt::Display for LedgerDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerDiagnostic::UnparseableDate { creator, token } => {
                write!(f, "{creator}: unparseable date token {token:?}")
            }
            LedgerDiagnostic::NoLinks { creator, token } => {
                write!(f, "{creator}: video {token:?} has no links")
            }
        }
    }
}

/// A ledger plus everything noticed while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerReport {
    pub ledger: Ledger,
    pub diagnostics: Vec<LedgerDiagnostic>,
}

// ── MonthlyLedgerBuilder ──────────────────────────────────────────────────────

/// Builds one month's ledger from a creator snapshot.
pub struct MonthlyLedgerBuilder {
    calculator: SettlementCalculator,
}

impl MonthlyLedgerBuilder {
    pub fn new(calculator: SettlementCalculator) -> Self {
        Self { calculator }
    }

    /// Ledger for `bucket`, in creator input order.
    pub fn build(&self, creators: &[Creator], bucket: MonthBucket) -> Ledger {
        self.build_report(creators, bucket).ledger
    }

    /// Same as [`MonthlyLedgerBuilder::build`], also returning per-video
    /// diagnostics.
    ///
    /// A creator with no linked video dated inside `bucket` gets no line.
    /// Videos with an unparseable date token are excluded from every month
    /// and reported.
    pub fn build_report(&self, creators: &[Creator], bucket: MonthBucket) -> LedgerReport {
        let mut lines = Vec::new();
        let mut diagnostics = Vec::new();

        for creator in creators {
            let mut video_count = 0u64;
            let mut total_views = 0u64;

            for video in &creator.videos {
                if video.links.is_empty() {
                    diagnostics.push(LedgerDiagnostic::NoLinks {
                        creator: creator.name.clone(),
                        token: video.date_token.clone(),
                    });
                    continue;
                }
                match resolve_date(&video.date_token) {
                    Some(date) if bucket.contains(date) => {
                        video_count += 1;
                        total_views = total_views.saturating_add(video.current_views);
                    }
                    Some(_) => {}
                    None => diagnostics.push(LedgerDiagnostic::UnparseableDate {
                        creator: creator.name.clone(),
                        token: video.date_token.clone(),
                    }),
                }
            }

            if video_count == 0 {
                debug!("{}: no qualifying videos in {}", creator.name, bucket);
                continue;
            }

            let settlement =
                self.calculator
                    .compute_settlement(video_count, total_views, &creator.label);
            lines.push(SettlementLine::new(creator, bucket, settlement));
        }

        info!(
            "built ledger for {}: {} line(s) from {} creator(s), {} diagnostic(s)",
            bucket,
            lines.len(),
            creators.len(),
            diagnostics.len()
        );

        LedgerReport {
            ledger: Ledger::new(bucket, lines),
            diagnostics,
        }
    }
}

impl Default for MonthlyLedgerBuilder {
    fn default() -> Self {
        Self::new(SettlementCalculator::default())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
