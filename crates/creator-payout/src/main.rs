mod bootstrap;
mod display;

use std::time::Duration;

use anyhow::{Context, Result};
use payout_core::calculations::SettlementCalculator;
use payout_core::settings::{resolve_bucket, Command, Settings};
use payout_data::snapshot::{load_creators, save_creators, RecordedViews};
use payout_runtime::orchestrator::PayoutOrchestrator;

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();
    let data_dir = settings.resolved_data_dir();

    bootstrap::ensure_directories(&data_dir)?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("creator-payout v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::debug!("data dir: {}", data_dir.display());

    let calculator = SettlementCalculator::new(settings.pay_rates()?);
    let orchestrator = PayoutOrchestrator::new(&data_dir, calculator)?;

    match settings.command {
        Command::Settle {
            year,
            month,
            snapshot,
        } => {
            let bucket = resolve_bucket(year, month)?;
            let creators = load_creators(&snapshot)?;
            let run = orchestrator.settle(&creators, bucket)?;

            print!("{}", display::render_ledger(&run.report.ledger));
            print!("{}", display::render_diagnostics(&run.report.diagnostics));
            println!("\nSaved to {}", run.path.display());
        }

        Command::Show {
            year,
            month,
            export,
        } => {
            let bucket = resolve_bucket(year, month)?;
            let store = orchestrator.store();
            match store.load(bucket) {
                Some(ledger) => {
                    print!("{}", display::render_ledger(&ledger));
                    if let Some(dest) = export {
                        store
                            .export(bucket, &dest)
                            .with_context(|| format!("exporting {bucket}"))?;
                        println!("\nExported to {}", dest.display());
                    }
                }
                None => println!("No record for {bucket}."),
            }
        }

        Command::Records => {
            let store = orchestrator.store();
            let records: Vec<_> = store
                .list()
                .into_iter()
                .map(|bucket| (bucket, store.load(bucket)))
                .collect();
            print!("{}", display::render_records(&records));
        }

        Command::Refresh {
            snapshot,
            views,
            delay_ms,
        } => {
            let mut creators = load_creators(&snapshot)?;
            let mut source = RecordedViews::load(&views)?;
            tracing::info!("{} recorded link count(s) loaded", source.len());

            let orchestrator = orchestrator.with_creator_delay(Duration::from_millis(delay_ms));
            let report = orchestrator.refresh(&mut creators, &mut source);
            save_creators(&snapshot, &creators)
                .with_context(|| format!("writing {}", snapshot.display()))?;

            let previews = report.previews(orchestrator.calculator());
            print!("{}", display::render_refresh(&report, &previews));
        }

        Command::History { limit } => {
            let entries = orchestrator.run_log().load_recent(limit);
            print!("{}", display::render_history(&entries));
        }
    }

    Ok(())
}
