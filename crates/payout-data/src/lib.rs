//! Data layer for the creator payout engine.
//!
//! Aggregates per-link view counts, builds monthly ledgers from a creator
//! snapshot, and persists ledgers and the run log in the data directory.

pub mod aggregator;
pub mod ledger;
pub mod run_log;
pub mod snapshot;
pub mod store;

pub use payout_core as core;
