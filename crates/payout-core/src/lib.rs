//! Domain core for Creator Payout.
//!
//! Holds the settlement models, the free-text normalisers (view counts and
//! date tokens), tier classification, the settlement calculator and the
//! shared error type. Nothing in this crate performs I/O except the
//! last-used settings file.

pub mod calculations;
pub mod dates;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod tiers;
pub mod view_count;

pub use error::{PayoutError, Result};
