use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::supplier::ShippingTerms;

/// Cost precision used throughout the comparison (matches NUMERIC(10,4)).
pub const COST_DP: u32 = 4;

fn round(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Unit cost plus the per-unit share of the supplier's per-case fee.
///
/// Flat fees and free-shipping thresholds depend on the whole order and are
/// not spread over single units.
pub fn landed_cost_per_unit(
    unit_cost: Decimal,
    case_pack: i32,
    shipping: Option<&ShippingTerms>,
) -> Decimal {
    let per_case_fee = match shipping.and_then(|s| s.per_case_fee) {
        Some(fee) if case_pack > 0 => fee,
        _ => return unit_cost,
    };

    round(unit_cost + per_case_fee / Decimal::from(case_pack), COST_DP)
}

/// Hours since the quote took effect, to one decimal place.
pub fn price_age_hours(effective_date: DateTime<Utc>, now: DateTime<Utc>) -> Decimal {
    let seconds = (now - effective_date).num_seconds();
    round(Decimal::from(seconds) / Decimal::from(3600), 1)
}

/// Savings per unit against what the store pays today.
pub fn savings_vs_current(current_cost: Option<Decimal>, unit_cost: Decimal) -> Option<Decimal> {
    current_cost.map(|current| round(current - unit_cost, COST_DP))
}

/// `savings` as a percentage of the current cost, to two places.
pub fn savings_percent(current_cost: Option<Decimal>, savings: Option<Decimal>) -> Option<Decimal> {
    match (current_cost, savings) {
        (Some(current), Some(savings)) if current > Decimal::ZERO => {
            Some(round(savings / current * Decimal::ONE_HUNDRED, 2))
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceStatistics {
    pub min_cost: Decimal,
    pub max_cost: Decimal,
    pub avg_cost: Decimal,
    pub spread: Decimal,
    /// Present only when the best quote beats the current cost
    pub potential_savings: Option<Decimal>,
}

impl PriceStatistics {
    pub fn from_costs(costs: &[Decimal], current_cost: Option<Decimal>) -> Option<Self> {
        let min_cost = costs.iter().copied().min()?;
        let max_cost = costs.iter().copied().max()?;
        let total: Decimal = costs.iter().copied().sum();
        let avg_cost = round(total / Decimal::from(costs.len()), COST_DP);

        let potential_savings = current_cost
            .map(|current| round(current - min_cost, COST_DP))
            .filter(|savings| *savings > Decimal::ZERO);

        Some(Self {
            min_cost,
            max_cost,
            avg_cost,
            spread: round(max_cost - min_cost, COST_DP),
            potential_savings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_landed_cost_without_shipping() {
        let cost = Decimal::new(199, 2);
        assert_eq!(landed_cost_per_unit(cost, 12, None), cost);
    }

    #[test]
    fn test_landed_cost_spreads_case_fee() {
        let shipping = ShippingTerms {
            per_case_fee: Some(Decimal::new(100, 2)),
            ..Default::default()
        };
        // 1.99 + 1.00 / 3 = 2.3233...
        assert_eq!(
            landed_cost_per_unit(Decimal::new(199, 2), 3, Some(&shipping)),
            Decimal::new(23233, 4)
        );
    }

    #[test]
    fn test_statistics() {
        let costs = [Decimal::new(450, 2), Decimal::new(399, 2), Decimal::new(420, 2)];
        let stats = PriceStatistics::from_costs(&costs, Some(Decimal::new(500, 2))).unwrap();

        assert_eq!(stats.min_cost, Decimal::new(399, 2));
        assert_eq!(stats.max_cost, Decimal::new(450, 2));
        assert_eq!(stats.avg_cost, Decimal::new(42300, 4));
        assert_eq!(stats.spread, Decimal::new(51, 2));
        assert_eq!(stats.potential_savings, Some(Decimal::new(101, 2)));
    }

    #[test]
    fn test_no_savings_when_current_is_cheaper() {
        let stats = PriceStatistics::from_costs(&[Decimal::new(300, 2)], Some(Decimal::new(250, 2)))
            .unwrap();
        assert_eq!(stats.potential_savings, None);
        assert!(PriceStatistics::from_costs(&[], None).is_none());
    }

    #[test]
    fn test_price_age_hours() {
        let now = Utc::now();
        assert_eq!(
            price_age_hours(now - Duration::minutes(90), now),
            Decimal::new(15, 1)
        );
    }

    #[test]
    fn test_savings_percent() {
        let current = Some(Decimal::new(500, 2));
        assert_eq!(
            savings_percent(current, Some(Decimal::new(101, 2))),
            Some(Decimal::new(2020, 2))
        );
        assert_eq!(savings_percent(Some(Decimal::ZERO), Some(Decimal::ONE)), None);
        assert_eq!(savings_percent(current, None), None);
    }
}
