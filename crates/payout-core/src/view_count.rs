//! Free-text view-count parsing.
//!
//! Scraped counts arrive as strings such as `"1,234,567"`, `"1.2K"`,
//! `"2.5M"` or `"3.4万"`. [`parse_view_count`] turns them into an exact
//! integer using [`Decimal`] arithmetic, so `"0.57K"` is 570 rather than
//! the 569 a float multiply would give.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::{PayoutError, Result};

/// Recognised unit suffixes and their multipliers.
///
/// Ordered longest-first so that `"百万"` is tried before `"万"`.
const UNIT_SUFFIXES: &[(&str, u64)] = &[
    ("百万", 1_000_000),
    ("K", 1_000),
    ("M", 1_000_000),
    ("B", 1_000_000_000),
    ("千", 1_000),
    ("万", 10_000),
    ("亿", 100_000_000),
];

/// Parse a free-text count into a non-negative integer.
///
/// Whitespace and `,` separators are removed first. A trailing unit suffix
/// (case-insensitive) scales the numeric prefix; the product is truncated
/// toward zero. Anything else that is not a decimal number yields
/// [`PayoutError::ViewCountParse`].
pub fn parse_view_count(text: &str) -> Result<u64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect::<String>()
        .to_uppercase();

    let (number, multiplier) = UNIT_SUFFIXES
        .iter()
        .find_map(|(suffix, multiplier)| {
            cleaned
                .strip_suffix(suffix)
                .map(|number| (number, *multiplier))
        })
        .unwrap_or((cleaned.as_str(), 1));

    scale_decimal(number, multiplier).ok_or_else(|| PayoutError::ViewCountParse(text.to_string()))
}

/// Multiply a decimal string by `multiplier`, truncating toward zero.
///
/// Plain decimals and scientific notation (`1e3`) are accepted. Returns
/// `None` for empty or signed-negative input, anything else `Decimal`
/// cannot read, or a result outside `u64`.
fn scale_decimal(number: &str, multiplier: u64) -> Option<u64> {
    if number.is_empty() || number.starts_with('-') {
        return None;
    }
    let value = Decimal::from_str(number)
        .or_else(|_| Decimal::from_scientific(&number.to_ascii_lowercase()))
        .ok()?;
    if value.is_sign_negative() {
        return None;
    }
    value.checked_mul(Decimal::from(multiplier))?.trunc().to_u64()
}
