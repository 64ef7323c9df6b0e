//! Creator snapshots and recorded view counts on disk.
//!
//! A snapshot is the workspace export: a JSON array of creators with their
//! videos. Recorded views are a JSON object from URL to the count a scraper
//! saw, either as an integer or as display text such as `"1.2K"`.

use std::collections::HashMap;
use std::path::Path;

use payout_core::error::{PayoutError, Result};
use payout_core::models::Creator;
use payout_core::view_count::parse_view_count;
use serde::Deserialize;
use tracing::{debug, info};

use crate::aggregator::ViewSource;

// ── Snapshot ──────────────────────────────────────────────────────────────────

/// Read a creator snapshot. Missing fields fall back to their defaults.
pub fn load_creators(path: &Path) -> Result<Vec<Creator>> {
    let content = std::fs::read_to_string(path).map_err(|source| PayoutError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let creators: Vec<Creator> = serde_json::from_str(&content)?;
    info!(
        "loaded {} creator(s) from {}",
        creators.len(),
        path.display()
    );
    Ok(creators)
}

/// Write a creator snapshot, replacing `path` atomically.
pub fn save_creators(path: &Path, creators: &[Creator]) -> Result<()> {
    let json = serde_json::to_string_pretty(creators)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|source| PayoutError::FileWrite {
        path: tmp.clone(),
        source,
    })?;
    std::fs::rename(&tmp, path).map_err(|source| PayoutError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

// ── RecordedViews ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RecordedCount {
    Number(u64),
    Text(String),
}

/// A [`ViewSource`] backed by counts captured ahead of time.
///
/// Unknown URLs and text that does not parse as a view count are failed
/// fetches.
#[derive(Debug, Clone, Default)]
pub struct RecordedViews {
    counts: HashMap<String, Option<u64>>,
}

impl RecordedViews {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| PayoutError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let raw: HashMap<String, RecordedCount> = serde_json::from_str(content)?;
        let counts = raw
            .into_iter()
            .map(|(url, count)| {
                let views = match count {
                    RecordedCount::Number(n) => Some(n),
                    RecordedCount::Text(text) => match parse_view_count(&text) {
                        Ok(n) => Some(n),
                        Err(e) => {
                            debug!("{}: {}", url, e);
                            None
                        }
                    },
                };
                (url, views)
            })
            .collect();
        Ok(Self { counts })
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl ViewSource for RecordedViews {
    fn fetch_views(&mut self, url: &str) -> Option<u64> {
        self.counts.get(url).copied().flatten()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
