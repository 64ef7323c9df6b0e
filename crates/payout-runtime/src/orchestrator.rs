//! Settlement and refresh runs.
//!
//! [`PayoutOrchestrator`] owns the ledger store and run log for one data
//! directory. A settlement run builds and saves a month's ledger; a refresh
//! run walks creators through a [`ViewSource`], optionally pausing between
//! creators so a live scraper is not hammered. Both runs append to the run
//! log.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use payout_core::calculations::SettlementCalculator;
use payout_core::error::Result;
use payout_core::models::{Creator, MonthBucket};
use payout_data::aggregator::{RefreshReport, ViewAggregator, ViewSource};
use payout_data::ledger::{LedgerReport, MonthlyLedgerBuilder};
use payout_data::run_log::{RunLog, RunLogEntry};
use payout_data::store::LedgerStore;
use serde_json::json;
use tracing::{info, warn};

// ── Public types ──────────────────────────────────────────────────────────────

/// Outcome of a settlement run.
#[derive(Debug, Clone)]
pub struct SettlementRun {
    pub report: LedgerReport,
    /// Where the ledger was written.
    pub path: PathBuf,
}

// ── PayoutOrchestrator ────────────────────────────────────────────────────────

pub struct PayoutOrchestrator {
    store: LedgerStore,
    run_log: RunLog,
    calculator: SettlementCalculator,
    /// Pause between consecutive creators during a refresh.
    creator_delay: Duration,
}

impl PayoutOrchestrator {
    /// Create an orchestrator over `data_dir`, creating the directory if
    /// needed.
    pub fn new(data_dir: &Path, calculator: SettlementCalculator) -> Result<Self> {
        let store = LedgerStore::open(data_dir)?;
        let run_log = RunLog::in_dir(store.data_dir());
        Ok(Self {
            store,
            run_log,
            calculator,
            creator_delay: Duration::ZERO,
        })
    }

    pub fn with_creator_delay(mut self, delay: Duration) -> Self {
        self.creator_delay = delay;
        self
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub fn run_log(&self) -> &RunLog {
        &self.run_log
    }

    pub fn calculator(&self) -> &SettlementCalculator {
        &self.calculator
    }

    // ── Runs ──────────────────────────────────────────────────────────────

    /// Build the ledger for `bucket` from `creators` and save it, replacing
    /// any ledger already stored for that month.
    pub fn settle(&self, creators: &[Creator], bucket: MonthBucket) -> Result<SettlementRun> {
        let builder = MonthlyLedgerBuilder::new(self.calculator.clone());
        let report = builder.build_report(creators, bucket);
        let path = self.store.save(&report.ledger)?;

        let totals = report.ledger.totals();
        self.record(RunLogEntry::now(
            "settle",
            json!({
                "year": bucket.year,
                "month": bucket.month,
                "creators": totals.creators,
                "videos": totals.videos,
                "views": totals.views,
                "total": totals.total,
                "diagnostics": report.diagnostics.len(),
            }),
        ));

        info!(
            "settled {}: {} creator(s), total {:.2}",
            bucket, totals.creators, totals.total
        );
        Ok(SettlementRun { report, path })
    }

    /// Refresh every creator's view counts in place, in input order.
    ///
    /// Failures are collected into the report; the run itself never fails.
    pub fn refresh<S: ViewSource + ?Sized>(
        &self,
        creators: &mut [Creator],
        source: &mut S,
    ) -> RefreshReport {
        let mut report = RefreshReport::default();
        let count = creators.len();

        for (idx, creator) in creators.iter_mut().enumerate() {
            info!("refreshing {} ({}/{})", creator.name, idx + 1, count);
            report.absorb(ViewAggregator::refresh_creator(creator, source));

            if idx + 1 < count && !self.creator_delay.is_zero() {
                thread::sleep(self.creator_delay);
            }
        }

        self.record(RunLogEntry::now(
            "refresh",
            json!({
                "creators_processed": report.creators_processed,
                "videos_updated": report.videos_updated,
                "total_views": report.total_views,
                "warnings": report.warnings.len(),
                "errors": report.errors.len(),
            }),
        ));

        info!(
            "refresh done: {} creator(s), {} video(s) updated, {} error(s)",
            report.creators_processed,
            report.videos_updated,
            report.errors.len()
        );
        report
    }

    // ── Private helpers ───────────────────────────────────────────────────

    /// Append to the run log. A failed append does not undo the run.
    fn record(&self, entry: RunLogEntry) {
        if let Err(e) = self.run_log.append(&entry) {
            warn!(error = %e, "failed to append run log entry");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
