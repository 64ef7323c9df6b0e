//! File-backed ledger storage.
//!
//! One CSV file per month, `settlement_YYYY_MM.csv`, in the data directory.
//! Saving a month replaces its file wholesale: recomputing a month discards
//! any earlier ledger for it, including hand edits. Writes go through a
//! temporary file and a rename so a reader never sees half a ledger.
//!
//! Each CSV has a `.csv.meta` manifest next to it recording its byte length
//! and row count. A ledger whose manifest is missing or disagrees with the
//! CSV is treated as absent, which catches files cut off at a row boundary.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use payout_core::error::{PayoutError, Result};
use payout_core::models::{Ledger, MonthBucket, SettlementLine, LEDGER_COLUMNS};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const FILE_PREFIX: &str = "settlement_";
const FILE_EXTENSION: &str = "csv";
const MANIFEST_EXTENSION: &str = "csv.meta";

/// Shape of a saved ledger file, written after the CSV itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct LedgerManifest {
    bytes: u64,
    rows: usize,
}

/// Ledgers keyed by (year, month).
#[derive(Debug, Clone)]
pub struct LedgerStore {
    data_dir: PathBuf,
}

impl LedgerStore {
    /// Open a store rooted at `data_dir`, creating the directory if needed.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir).map_err(|source| PayoutError::FileWrite {
            path: data_dir.clone(),
            source,
        })?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// File holding the ledger for `bucket`.
    pub fn path_for(&self, bucket: MonthBucket) -> PathBuf {
        self.data_dir.join(format!(
            "{FILE_PREFIX}{}_{:02}.{FILE_EXTENSION}",
            bucket.year, bucket.month
        ))
    }

    /// Manifest file for the ledger of `bucket`.
    pub fn manifest_path_for(&self, bucket: MonthBucket) -> PathBuf {
        self.path_for(bucket).with_extension(MANIFEST_EXTENSION)
    }

    /// Persist `ledger` under its own bucket, replacing whatever was there.
    pub fn save(&self, ledger: &Ledger) -> Result<PathBuf> {
        let path = self.path_for(ledger.bucket);

        let mut csv_bytes = Vec::new();
        write_csv(ledger, &mut csv_bytes)?;
        let manifest = LedgerManifest {
            bytes: csv_bytes.len() as u64,
            rows: ledger.lines.len(),
        };

        write_atomically(&path, &csv_bytes)?;
        write_atomically(
            &self.manifest_path_for(ledger.bucket),
            &serde_json::to_vec(&manifest)?,
        )?;

        info!(
            "saved ledger {} ({} line(s)) to {}",
            ledger.bucket,
            ledger.lines.len(),
            path.display()
        );
        Ok(path)
    }

    /// Load the ledger for `bucket`.
    ///
    /// Missing, empty and unreadable files, and files that disagree with
    /// their manifest, all come back as `None`; a ledger is either returned
    /// whole or not at all.
    pub fn load(&self, bucket: MonthBucket) -> Option<Ledger> {
        let path = self.path_for(bucket);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no ledger stored for {}", bucket);
                return None;
            }
            Err(e) => {
                warn!("Failed to read ledger {}: {}", path.display(), e);
                return None;
            }
        };

        if bytes.is_empty() {
            warn!("ledger file {} is empty", path.display());
            return None;
        }

        let checked = self
            .read_manifest(bucket)
            .and_then(|manifest| {
                if manifest.bytes != bytes.len() as u64 {
                    return Err(format!(
                        "{} bytes on disk, manifest records {}",
                        bytes.len(),
                        manifest.bytes
                    ));
                }
                let ledger = read_csv(bytes.as_slice(), bucket)?;
                if ledger.lines.len() != manifest.rows {
                    return Err(format!(
                        "{} row(s) on disk, manifest records {}",
                        ledger.lines.len(),
                        manifest.rows
                    ));
                }
                Ok(ledger)
            });

        match checked {
            Ok(ledger) => Some(ledger),
            Err(reason) => {
                let err = PayoutError::CorruptLedger {
                    path: path.clone(),
                    reason,
                };
                warn!("{}", err);
                None
            }
        }
    }

    fn read_manifest(&self, bucket: MonthBucket) -> std::result::Result<LedgerManifest, String> {
        let path = self.manifest_path_for(bucket);
        let content = std::fs::read(&path)
            .map_err(|e| format!("manifest {}: {}", path.display(), e))?;
        serde_json::from_slice(&content).map_err(|e| format!("manifest {}: {}", path.display(), e))
    }

    /// Every stored bucket, most recent first.
    pub fn list(&self) -> Vec<MonthBucket> {
        let mut buckets: Vec<MonthBucket> = walkdir::WalkDir::new(&self.data_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| bucket_from_file_name(&entry.file_name().to_string_lossy()))
            .collect();

        buckets.sort_unstable_by(|a, b| b.cmp(a));
        buckets.dedup();
        buckets
    }

    /// Copy the stored ledger for `bucket` to `dest` as CSV.
    ///
    /// Returns `false` when there is no usable ledger to export.
    pub fn export(&self, bucket: MonthBucket, dest: &Path) -> Result<bool> {
        let Some(ledger) = self.load(bucket) else {
            return Ok(false);
        };
        let file = std::fs::File::create(dest).map_err(|source| PayoutError::FileWrite {
            path: dest.to_path_buf(),
            source,
        })?;
        write_csv(&ledger, file)?;
        Ok(true)
    }
}

/// Write `bytes` to `path` through a temporary file and a rename.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, bytes).map_err(|source| PayoutError::FileWrite {
        path: tmp.clone(),
        source,
    })?;
    std::fs::rename(&tmp, path).map_err(|source| PayoutError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}

// ── CSV encoding ──────────────────────────────────────────────────────────────

/// Write `ledger` as CSV: the fixed header row, then one row per line.
///
/// The header is written even for an empty ledger, so an empty month is
/// distinguishable from a missing or empty file.
pub fn write_csv<W: Write>(ledger: &Ledger, writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(LEDGER_COLUMNS)?;
    for line in &ledger.lines {
        wtr.serialize(line)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Decode a ledger, rejecting anything that does not match the schema or
/// carries lines from another month.
fn read_csv<R: Read>(reader: R, bucket: MonthBucket) -> std::result::Result<Ledger, String> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers = rdr.headers().map_err(|e| e.to_string())?;
    if !headers.iter().eq(LEDGER_COLUMNS.iter().copied()) {
        return Err(format!("unexpected header {:?}", headers.iter().collect::<Vec<_>>()));
    }

    let mut lines = Vec::new();
    for (idx, record) in rdr.deserialize::<SettlementLine>().enumerate() {
        let line = record.map_err(|e| format!("row {}: {}", idx + 2, e))?;
        if line.bucket() != bucket {
            return Err(format!(
                "row {} belongs to {}, not {}",
                idx + 2,
                line.bucket(),
                bucket
            ));
        }
        lines.push(line);
    }

    Ok(Ledger::new(bucket, lines))
}

/// Parse `settlement_YYYY_MM.csv` into its bucket.
fn bucket_from_file_name(name: &str) -> Option<MonthBucket> {
    let stem = name
        .strip_prefix(FILE_PREFIX)?
        .strip_suffix(FILE_EXTENSION)?
        .strip_suffix('.')?;
    let (year, month) = stem.split_once('_')?;
    MonthBucket::new(year.parse().ok()?, month.parse().ok()?).ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
