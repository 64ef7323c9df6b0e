//! Runtime orchestration layer for the creator payout engine.
//!
//! Ties the data layer together into the two runs an operator triggers:
//! settling a month and refreshing view counts.

pub mod orchestrator;

pub use payout_core as core;
pub use payout_data as data;
