//! Plain-text rendering for the CLI.

use std::fmt::Write;

use payout_core::formatting::{format_currency, format_views};
use payout_core::models::{Ledger, MonthBucket, Settlement};
use payout_data::aggregator::RefreshReport;
use payout_data::ledger::LedgerDiagnostic;
use payout_data::run_log::RunLogEntry;

const RULE_WIDTH: usize = 78;

fn rule() -> String {
    "─".repeat(RULE_WIDTH)
}

// ── Ledgers ────────────────────────────────────────────────────────────────────

pub fn render_ledger(ledger: &Ledger) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Settlement {}", ledger.bucket);
    let _ = writeln!(out, "{}", rule());

    if ledger.is_empty() {
        let _ = writeln!(out, "No qualifying videos.");
        return out;
    }

    let _ = writeln!(
        out,
        "{:<20} {:<12} {:>6} {:>10} {:>9} {:>11} {:>11}",
        "Creator", "Tier", "Videos", "Views", "Base", "Commission", "Total"
    );
    for line in &ledger.lines {
        let _ = writeln!(
            out,
            "{:<20} {:<12} {:>6} {:>10} {:>9} {:>11} {:>11}",
            truncate(&line.creator, 20),
            line.tier.descriptor(),
            line.video_count,
            format_views(line.total_views),
            format_currency(line.base_pay),
            format_currency(line.commission),
            format_currency(line.total)
        );
    }

    let totals = ledger.totals();
    let _ = writeln!(out, "{}", rule());
    let _ = writeln!(
        out,
        "{:<20} {:<12} {:>6} {:>10} {:>9} {:>11} {:>11}",
        format!("{} creator(s)", totals.creators),
        "",
        totals.videos,
        format_views(totals.views),
        format_currency(totals.base_pay),
        format_currency(totals.commission),
        format_currency(totals.total)
    );
    out
}

pub fn render_diagnostics(diagnostics: &[LedgerDiagnostic]) -> String {
    let mut out = String::new();
    if diagnostics.is_empty() {
        return out;
    }
    let _ = writeln!(out, "\n{} video(s) skipped:", diagnostics.len());
    for d in diagnostics {
        let _ = writeln!(out, "  - {d}");
    }
    out
}

/// One line per stored month, most recent first.
pub fn render_records(records: &[(MonthBucket, Option<Ledger>)]) -> String {
    let mut out = String::new();
    if records.is_empty() {
        let _ = writeln!(out, "No stored settlements.");
        return out;
    }
    let _ = writeln!(out, "{:<8} {:>9} {:>7} {:>12} {:>12}", "Month", "Creators", "Videos", "Views", "Total");
    for (bucket, ledger) in records {
        match ledger {
            Some(ledger) => {
                let t = ledger.totals();
                let _ = writeln!(
                    out,
                    "{:<8} {:>9} {:>7} {:>12} {:>12}",
                    bucket.to_string(),
                    t.creators,
                    t.videos,
                    format_views(t.views),
                    format_currency(t.total)
                );
            }
            None => {
                let _ = writeln!(out, "{:<8} (unreadable)", bucket.to_string());
            }
        }
    }
    out
}

// ── Refresh ────────────────────────────────────────────────────────────────────

pub fn render_refresh(report: &RefreshReport, previews: &[(String, Settlement)]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Refresh");
    let _ = writeln!(out, "{}", rule());
    let _ = writeln!(out, "Creators processed: {}", report.creators_processed);
    let _ = writeln!(out, "Videos updated:     {}", report.videos_updated);
    let _ = writeln!(out, "Total views:        {}", format_views(report.total_views));

    if !report.warnings.is_empty() {
        let _ = writeln!(out, "\nWarnings ({}):", report.warnings.len());
        for w in &report.warnings {
            let _ = writeln!(out, "  - {w}");
        }
    }
    if !report.errors.is_empty() {
        let _ = writeln!(out, "\nErrors ({}):", report.errors.len());
        for e in &report.errors {
            let _ = writeln!(out, "  - {e}");
        }
    }

    if !previews.is_empty() {
        let _ = writeln!(out, "\nSettlement preview:");
        for (name, s) in previews {
            let _ = writeln!(
                out,
                "  {:<20} {:<12} {:>3} video(s) {:>10} views  {}",
                truncate(name, 20),
                s.tier.descriptor(),
                s.video_count,
                format_views(s.total_views),
                format_currency(s.total)
            );
        }
    }
    out
}

// ── History ────────────────────────────────────────────────────────────────────

pub fn render_history(entries: &[RunLogEntry]) -> String {
    let mut out = String::new();
    if entries.is_empty() {
        let _ = writeln!(out, "No runs recorded.");
        return out;
    }
    for entry in entries {
        let _ = writeln!(
            out,
            "{}  {:<8} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.action,
            entry.details
        );
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(max.saturating_sub(1)).collect();
        t.push('…');
        t
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use payout_core::calculations::SettlementCalculator;
    use payout_core::models::{Creator, SettlementLine};
    use payout_data::aggregator::CreatorRefresh;

    fn november() -> MonthBucket {
        MonthBucket::new(2025, 11).unwrap()
    }

    fn ledger() -> Ledger {
        let calc = SettlementCalculator::default();
        let line = |name: &str, label: &str, views: u64| {
            let creator = Creator {
                id: String::new(),
                name: name.to_string(),
                label: label.to_string(),
                videos: Vec::new(),
            };
            SettlementLine::new(&creator, november(), calc.compute_settlement(1, views, label))
        };
        Ledger::new(
            november(),
            vec![line("Sora", "Core UGC", 791), line("Jeon", "discord ugc", 2_835)],
        )
    }

    #[test]
    fn test_render_ledger() {
        let text = render_ledger(&ledger());
        assert!(text.starts_with("Settlement 2025-11"));
        assert!(text.contains("Sora"));
        assert!(text.contains("Core UGC"));
        assert!(text.contains("Discord UGC"));
        assert!(text.contains("2,835"));
        assert!(text.contains("$12.00"));
        assert!(text.contains("$32.00"), "grand total");
    }

    #[test]
    fn test_render_empty_ledger() {
        let text = render_ledger(&Ledger::new(november(), Vec::new()));
        assert!(text.contains("No qualifying videos."));
    }

    #[test]
    fn test_render_records() {
        let text = render_records(&[(november(), Some(ledger())), (MonthBucket::new(2025, 10).unwrap(), None)]);
        assert!(text.contains("2025-11"));
        assert!(text.contains("$32.00"));
        assert!(text.contains("2025-10  (unreadable)"));
        assert!(render_records(&[]).contains("No stored settlements."));
    }

    #[test]
    fn test_render_refresh() {
        let mut report = RefreshReport::default();
        report.absorb(CreatorRefresh {
            name: "Sora".into(),
            label: "Core UGC".into(),
            videos_updated: 2,
            total_views: 3_500,
            warnings: vec![],
            errors: vec![],
        });
        let previews = report.previews(&SettlementCalculator::default());
        let text = render_refresh(&report, &previews);
        assert!(text.contains("Creators processed: 1"));
        assert!(text.contains("3,500"));
        assert!(text.contains("$43.00"));
        assert!(!text.contains("Errors"));
    }

    #[test]
    fn test_render_diagnostics() {
        assert!(render_diagnostics(&[]).is_empty());
        let text = render_diagnostics(&[LedgerDiagnostic::NoLinks {
            creator: "Sora".into(),
            token: "20251105".into(),
        }]);
        assert!(text.contains("1 video(s) skipped"));
        assert!(text.contains("Sora"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Sora", 20), "Sora");
        assert_eq!(truncate("abcdef", 4), "abc…");
    }
}
