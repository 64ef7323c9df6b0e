use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the payout crates.
#[derive(Error, Debug)]
pub enum PayoutError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be written (or atomically renamed into place).
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A ledger table could not be encoded or decoded.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A persisted ledger exists but cannot be trusted.
    #[error("Corrupt ledger {path}: {reason}")]
    CorruptLedger { path: PathBuf, reason: String },

    /// A free-text view count did not parse to a non-negative integer.
    #[error("Invalid view count: {0:?}")]
    ViewCountParse(String),

    /// A (year, month) pair that is not a calendar month.
    #[error("Invalid month bucket: {year}-{month}")]
    InvalidBucket { year: i32, month: u32 },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the payout crates.
pub type Result<T> = std::result::Result<T, PayoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = PayoutError::FileRead {
            path: PathBuf::from("/data/creators.json"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/data/creators.json"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_file_write() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = PayoutError::FileWrite {
            path: PathBuf::from("/data/settlement_2025_11.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to write file /data/settlement_2025_11.csv"));
        assert!(msg.contains("read-only"));
    }

    #[test]
    fn test_error_display_corrupt_ledger() {
        let err = PayoutError::CorruptLedger {
            path: PathBuf::from("settlement_2025_11.csv"),
            reason: "unexpected header".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Corrupt ledger settlement_2025_11.csv: unexpected header"
        );
    }

    #[test]
    fn test_error_display_view_count_parse() {
        let err = PayoutError::ViewCountParse("12abc".to_string());
        assert_eq!(err.to_string(), "Invalid view count: \"12abc\"");
    }

    #[test]
    fn test_error_display_invalid_bucket() {
        let err = PayoutError::InvalidBucket {
            year: 2025,
            month: 13,
        };
        assert_eq!(err.to_string(), "Invalid month bucket: 2025-13");
    }

    #[test]
    fn test_error_display_config() {
        let err = PayoutError::Config("negative pay rate".to_string());
        assert_eq!(err.to_string(), "Configuration error: negative pay rate");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: PayoutError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: PayoutError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
