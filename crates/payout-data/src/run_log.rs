//! Append-only run log.
//!
//! Every settlement and refresh run appends one JSON line to
//! `update_log.jsonl` in the data directory.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use payout_core::error::{PayoutError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const RUN_LOG_FILE: &str = "update_log.jsonl";

/// One line of the run log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    #[serde(default)]
    pub details: serde_json::Value,
}

impl RunLogEntry {
    pub fn now(action: impl Into<String>, details: serde_json::Value) -> Self {
        Self {
            timestamp: Utc::now(),
            action: action.into(),
            details,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    /// Run log stored in `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(RUN_LOG_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `entry` as a single line.
    pub fn append(&self, entry: &RunLogEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| PayoutError::FileWrite {
                path: self.path.clone(),
                source,
            })?;
        file.write_all(line.as_bytes())
            .map_err(|source| PayoutError::FileWrite {
                path: self.path.clone(),
                source,
            })?;

        debug!("run log: appended {:?}", entry.action);
        Ok(())
    }

    /// The last `limit` readable entries, oldest first.
    ///
    /// Malformed lines are skipped. A missing log reads as empty.
    pub fn load_recent(&self, limit: usize) -> Vec<RunLogEntry> {
        let file = match std::fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("Failed to open run log {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };

        let mut entries = Vec::new();
        for (idx, line) in std::io::BufReader::new(file).lines().enumerate() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    warn!("Failed to read run log line {}: {}", idx + 1, e);
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RunLogEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => debug!("skipping malformed run log line {}: {}", idx + 1, e),
            }
        }

        let skip = entries.len().saturating_sub(limit);
        entries.split_off(skip)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
