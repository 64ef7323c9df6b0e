use crate::error::{PayoutError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pay class of a creator, derived from their free-text label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// Core UGC creators, paid the primary per-video rate.
    #[serde(rename = "Core UGC")]
    Primary,
    /// Everyone else, including creators with no label at all.
    #[serde(rename = "Discord UGC")]
    Secondary,
}

/// Normalised substring that marks a label as [`Tier::Primary`].
const PRIMARY_MARKER: &str = "coreugc";

impl Tier {
    /// Classify an unvalidated label.
    ///
    /// The label is lower-cased and stripped of all whitespace, then checked
    /// for the `"coreugc"` marker anywhere inside it. Empty and unknown
    /// labels fall through to [`Tier::Secondary`].
    pub fn classify(label: &str) -> Self {
        let normalised: String = label
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();
        if normalised.contains(PRIMARY_MARKER) {
            Tier::Primary
        } else {
            Tier::Secondary
        }
    }

    /// Human-readable descriptor used in ledgers and exports.
    pub fn descriptor(&self) -> &'static str {
        match self {
            Tier::Primary => "Core UGC",
            Tier::Secondary => "Discord UGC",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor())
    }
}

impl FromStr for Tier {
    type Err = PayoutError;

    /// Parse a descriptor back into a tier. Exact match only; free-text
    /// labels go through [`Tier::classify`].
    fn from_str(value: &str) -> Result<Self> {
        match value {
            "Core UGC" => Ok(Tier::Primary),
            "Discord UGC" => Ok(Tier::Secondary),
            other => Err(PayoutError::Config(format!("unknown tier descriptor {other:?}"))),
        }
    }
}

// ── Rates ─────────────────────────────────────────────────────────────────────

/// Per-video base pay for [`Tier::Primary`].
pub const DEFAULT_PRIMARY_RATE: f64 = 20.0;

/// Per-video base pay for [`Tier::Secondary`].
pub const DEFAULT_SECONDARY_RATE: f64 = 10.0;

/// Commission paid per full thousand views.
pub const DEFAULT_COMMISSION_RATE: f64 = 1.0;

/// Views per commission unit.
pub const VIEWS_PER_COMMISSION_UNIT: u64 = 1_000;

/// Currency amounts used by the settlement calculator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PayRates {
    pub primary: f64,
    pub secondary: f64,
    pub commission_per_thousand: f64,
}

impl Default for PayRates {
    fn default() -> Self {
        Self {
            primary: DEFAULT_PRIMARY_RATE,
            secondary: DEFAULT_SECONDARY_RATE,
            commission_per_thousand: DEFAULT_COMMISSION_RATE,
        }
    }
}

impl PayRates {
    /// Build a rate table, rejecting negative or non-finite amounts.
    pub fn new(primary: f64, secondary: f64, commission_per_thousand: f64) -> Result<Self> {
        for (name, value) in [
            ("primary rate", primary),
            ("secondary rate", secondary),
            ("commission rate", commission_per_thousand),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PayoutError::Config(format!("{name} must be >= 0, got {value}")));
            }
        }
        Ok(Self {
            primary,
            secondary,
            commission_per_thousand,
        })
    }

    /// Base pay per video for `tier`.
    pub fn base_rate(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Primary => self.primary,
            Tier::Secondary => self.secondary,
        }
    }
}
