use tracing::debug;

use crate::models::Settlement;
use crate::tiers::{PayRates, Tier, VIEWS_PER_COMMISSION_UNIT};

// ── SettlementCalculator ──────────────────────────────────────────────────────

/// Tiered base pay plus view commission.
///
/// Holds no state beyond its rate table, so one instance can settle any
/// number of creators.
#[derive(Debug, Clone, Default)]
pub struct SettlementCalculator {
    rates: PayRates,
}

impl SettlementCalculator {
    pub fn new(rates: PayRates) -> Self {
        Self { rates }
    }

    pub fn rates(&self) -> &PayRates {
        &self.rates
    }

    /// Map a free-text label to its pay tier.
    pub fn classify(&self, label: &str) -> Tier {
        Tier::classify(label)
    }

    /// Commission for `total_views`.
    ///
    /// Views are counted in whole thousands using integer floor division:
    /// 999 views earn nothing, 1 000 earn one unit, 2 999 earn two.
    pub fn compute_commission(&self, total_views: u64) -> f64 {
        let units = total_views / VIEWS_PER_COMMISSION_UNIT;
        units as f64 * self.rates.commission_per_thousand
    }

    /// Base pay, commission and total for one creator's video set.
    pub fn compute_settlement(&self, video_count: u64, total_views: u64, label: &str) -> Settlement {
        let tier = self.classify(label);
        let base_pay = video_count as f64 * self.rates.base_rate(tier);
        let commission = self.compute_commission(total_views);
        let total = base_pay + commission;

        debug!(
            %tier,
            video_count,
            total_views,
            base_pay,
            commission,
            "settlement computed"
        );

        Settlement {
            tier,
            video_count,
            total_views,
            base_pay,
            commission,
            total,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn calculator() -> SettlementCalculator {
        SettlementCalculator::default()
    }

    // ── compute_commission ───────────────────────────────────────────────────

    #[test]
    fn test_commission_is_floor_based() {
        let calc = calculator();
        assert_eq!(calc.compute_commission(0), 0.0);
        assert_eq!(calc.compute_commission(999), 0.0);
        assert_eq!(calc.compute_commission(1_000), 1.0);
        assert_eq!(calc.compute_commission(1_999), 1.0);
        assert_eq!(calc.compute_commission(2_999), 2.0);
        assert_eq!(calc.compute_commission(2_488), 2.0);
    }

    #[test]
    fn test_commission_uses_configured_rate() {
        let calc = SettlementCalculator::new(PayRates::new(20.0, 10.0, 0.5).unwrap());
        assert_eq!(calc.compute_commission(4_200), 2.0);
    }

    // ── compute_settlement ───────────────────────────────────────────────────

    #[test]
    fn test_settlement_primary_tier() {
        let s = calculator().compute_settlement(2, 3_500, "Core UGC");
        assert_eq!(s.tier, Tier::Primary);
        assert_eq!(s.base_pay, 40.0);
        assert_eq!(s.commission, 3.0);
        assert_eq!(s.total, 43.0);
        assert_eq!(s.video_count, 2);
        assert_eq!(s.total_views, 3_500);
    }

    #[test]
    fn test_settlement_secondary_tier() {
        let s = calculator().compute_settlement(1, 2_839, "discord ugc");
        assert_eq!(s.tier, Tier::Secondary);
        assert_eq!(s.base_pay, 10.0);
        assert_eq!(s.commission, 2.0);
        assert_eq!(s.total, 12.0);
    }

    #[test]
    fn test_settlement_empty_label_defaults_to_secondary() {
        let s = calculator().compute_settlement(3, 0, "");
        assert_eq!(s.tier, Tier::Secondary);
        assert_eq!(s.total, 30.0);
    }

    #[test]
    fn test_settlement_under_a_thousand_views() {
        let s = calculator().compute_settlement(1, 806, "Core UGC");
        assert_eq!(s.commission, 0.0);
        assert_eq!(s.total, 20.0);
    }
}
