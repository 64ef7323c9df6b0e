use chrono::Datelike;
use clap::{CommandFactory, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::MonthBucket;
use crate::tiers::{PayRates, DEFAULT_COMMISSION_RATE, DEFAULT_PRIMARY_RATE, DEFAULT_SECONDARY_RATE};

/// Name of the per-user directory under `$HOME`.
pub const APP_DIR_NAME: &str = ".creator-payout";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Monthly creator settlement from workspace view counts
#[derive(Parser, Debug, Clone)]
#[command(
    name = "creator-payout",
    about = "Monthly creator settlement from workspace view counts",
    version
)]
pub struct Settings {
    /// Directory holding stored ledgers and the run log
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Base pay per video for Core UGC creators
    #[arg(long, default_value_t = DEFAULT_PRIMARY_RATE)]
    pub primary_rate: f64,

    /// Base pay per video for all other creators
    #[arg(long, default_value_t = DEFAULT_SECONDARY_RATE)]
    pub secondary_rate: f64,

    /// Commission per full thousand views
    #[arg(long, default_value_t = DEFAULT_COMMISSION_RATE)]
    pub commission_rate: f64,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path (logs go to stderr when unset)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Operations exposed by the binary.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Compute the ledger for one month and store it, replacing any prior ledger
    Settle {
        /// Year of the bucket (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,
        /// Month of the bucket (defaults to the current month)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
        /// Workspace snapshot (JSON array of creators)
        #[arg(long)]
        snapshot: PathBuf,
    },
    /// Print a stored ledger
    Show {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
        /// Also write the ledger as CSV to this path
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// List stored ledgers, most recent first
    Records,
    /// Re-aggregate per-link view counts into the workspace snapshot
    Refresh {
        /// Workspace snapshot to update in place
        #[arg(long)]
        snapshot: PathBuf,
        /// Recorded per-link view counts (JSON object of url -> count)
        #[arg(long)]
        views: PathBuf,
        /// Pause between creators, in milliseconds
        #[arg(long, default_value = "0")]
        delay_ms: u64,
    },
    /// Show recent run-log entries
    History {
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.creator-payout/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<f64>,
}

impl LastUsedParams {
    /// Default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&home_dir())
    }

    /// The config path rooted at `base_dir`.
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(APP_DIR_NAME).join("last_used.json")
    }

    /// Load persisted params. Returns `Default` when the file is absent or
    /// cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params, creating parent directories if needed.
    pub fn save_to(&self, path: &Path) -> std::result::Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file if it exists.
    pub fn clear_at(path: &Path) -> std::result::Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, fill unset values from the last run, and persist
    /// the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(std::env::args_os().collect(), &LastUsedParams::config_path())
    }

    /// Same as [`Settings::load_with_last_used`] with explicit arguments and
    /// config path.
    pub fn load_with_last_used_impl(args: Vec<std::ffi::OsString>, config_path: &Path) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!("could not clear {}: {}", config_path.display(), e);
            }
            return settings.apply_debug();
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins over persisted values.
        if settings.data_dir.is_none() {
            settings.data_dir = last.data_dir;
        }
        if !is_arg_explicitly_set(&matches, "primary_rate") {
            if let Some(v) = last.primary_rate {
                settings.primary_rate = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "secondary_rate") {
            if let Some(v) = last.secondary_rate {
                settings.secondary_rate = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "commission_rate") {
            if let Some(v) = last.commission_rate {
                settings.commission_rate = v;
            }
        }

        settings = settings.apply_debug();

        // Invalid rates are never persisted.
        if let Err(e) = settings.pay_rates() {
            tracing::warn!("not persisting settings: {}", e);
            return settings;
        }
        if let Err(e) = LastUsedParams::from(&settings).save_to(config_path) {
            tracing::warn!("could not persist settings to {}: {}", config_path.display(), e);
        }

        settings
    }

    /// `--debug` overrides the log level.
    fn apply_debug(mut self) -> Self {
        if self.debug {
            self.log_level = "DEBUG".to_string();
        }
        self
    }

    /// Directory for ledgers and the run log.
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| home_dir().join(APP_DIR_NAME).join("data"))
    }

    /// Validated rate table from the three rate flags.
    pub fn pay_rates(&self) -> Result<PayRates> {
        PayRates::new(self.primary_rate, self.secondary_rate, self.commission_rate)
    }
}

/// Build a bucket from optional CLI values, defaulting to the current local
/// year and month.
pub fn resolve_bucket(year: Option<i32>, month: Option<u32>) -> Result<MonthBucket> {
    let today = chrono::Local::now().date_naive();
    MonthBucket::new(year.unwrap_or(today.year()), month.unwrap_or(today.month()))
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            data_dir: s.data_dir.clone(),
            primary_rate: Some(s.primary_rate),
            secondary_rate: Some(s.secondary_rate),
            commission_rate: Some(s.commission_rate),
        }
    }
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Returns `true` when `name` was supplied explicitly on the command line.
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
