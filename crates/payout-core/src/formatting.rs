//! Display helpers for ledgers and refresh reports.

/// Format a view count with thousands separators.
///
/// # Examples
///
/// ```
/// use payout_core::formatting::format_views;
///
/// assert_eq!(format_views(0), "0");
/// assert_eq!(format_views(2835), "2,835");
/// assert_eq!(format_views(1_234_567), "1,234,567");
/// ```
pub fn format_views(views: u64) -> String {
    group_thousands(&views.to_string())
}

/// Format a pay amount with thousands separators and two decimals.
///
/// Amounts are rounded half away from zero at the cent.
///
/// # Examples
///
/// ```
/// use payout_core::formatting::format_amount;
///
/// assert_eq!(format_amount(43.0), "43.00");
/// assert_eq!(format_amount(12_345.5), "12,345.50");
/// ```
pub fn format_amount(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let body = format!("{}.{:02}", group_thousands(&(cents / 100).to_string()), cents % 100);
    if amount < 0.0 && cents > 0 {
        format!("-{body}")
    } else {
        body
    }
}

/// Format a pay amount as a dollar string.
///
/// # Examples
///
/// ```
/// use payout_core::formatting::format_currency;
///
/// assert_eq!(format_currency(20.0), "$20.00");
/// assert_eq!(format_currency(1_000_000.0), "$1,000,000.00");
/// ```
pub fn format_currency(amount: f64) -> String {
    format!("${}", format_amount(amount))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert a comma between every group of three digits, counting from the right.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_views_small() {
        assert_eq!(format_views(5), "5");
        assert_eq!(format_views(999), "999");
    }

    #[test]
    fn test_format_views_grouping() {
        assert_eq!(format_views(1_000), "1,000");
        assert_eq!(format_views(100_000), "100,000");
        assert_eq!(format_views(u64::MAX), "18,446,744,073,709,551,615");
    }

    #[test]
    fn test_format_amount_rounding() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(0.125), "0.13");
        assert_eq!(format_amount(1_234.5), "1,234.50");
    }

    #[test]
    fn test_format_amount_negative() {
        assert_eq!(format_amount(-9.99), "-9.99");
        assert_eq!(format_amount(-0.001), "0.00");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(43.0), "$43.00");
        assert_eq!(format_currency(0.5), "$0.50");
    }
}
