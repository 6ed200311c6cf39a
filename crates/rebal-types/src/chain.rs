use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Snapshot of one lending market, as used by a single optimization run.
///
/// Rates (`current_apy`, `current_utilization`) are percentages, e.g. `6.5` for 6.5%.
/// The optimizer mutates `current_apy` and `current_allocation` in place while it
/// reallocates, so a snapshot should never be reused across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainMetric {
    pub chain_name: String,
    pub current_apy: Decimal,
    pub current_utilization: Decimal,
    pub total_liquidity: Decimal,
    /// APY percentage points gained per 1% utilization change.
    pub elasticity_factor: Decimal,
    pub current_allocation: Decimal,
}

impl ChainMetric {
    /// Expected daily dollar return of the current allocation at the current APY.
    pub fn daily_return(&self) -> Decimal {
        self.current_allocation * self.current_apy / Decimal::ONE_HUNDRED / Decimal::from(365)
    }
}

/// Baseline (non-rebalanced) allocation in force for a given date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineAllocation {
    pub effective_from: Option<NaiveDate>,
    pub allocations: BTreeMap<String, Decimal>,
}

impl BaselineAllocation {
    pub fn new(effective_from: Option<NaiveDate>, allocations: BTreeMap<String, Decimal>) -> Self {
        Self {
            effective_from,
            allocations,
        }
    }

    /// Baseline amount for a chain, zero when the chain is not part of the baseline.
    pub fn amount_for(&self, chain_name: &str) -> Decimal {
        self.allocations
            .get(chain_name)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn total(&self) -> Decimal {
        self.allocations.values().copied().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    #[test]
    fn test_baseline_amount_for_missing_chain_is_zero() {
        let baseline = BaselineAllocation::new(
            None,
            BTreeMap::from([
                ("ethereum".to_string(), dec!(3_000_000)),
                ("arbitrum".to_string(), dec!(2_000_000)),
            ]),
        );

        assert_eq!(baseline.amount_for("ethereum"), dec!(3_000_000));
        assert_eq!(baseline.amount_for("base"), Decimal::ZERO);
        assert_eq!(baseline.total(), dec!(5_000_000));
    }

    #[test]
    fn test_daily_return() {
        let metric = ChainMetric {
            chain_name: "ethereum".to_string(),
            current_apy: dec!(3.65),
            current_utilization: dec!(80),
            total_liquidity: dec!(10_000_000),
            elasticity_factor: dec!(0.1),
            current_allocation: dec!(1_000_000),
        };

        // 1M at 3.65% a year earns 100 a day
        assert_eq!(metric.daily_return(), dec!(100));
    }
}
