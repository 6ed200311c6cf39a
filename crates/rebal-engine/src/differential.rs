use chrono::NaiveDate;
use rust_decimal::Decimal;

use rebal_types::{
    BaselineAllocation, ChainMetric, ChainPerformanceEntry, DailyPerformanceRecord,
    FundFlowSummary,
};

use crate::error::EngineError;
use crate::optimizer::OptimizationOutcome;

const DAYS_PER_YEAR: i64 = 365;

/// Baseline and optimized totals after the fund-flow adjustment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Differential {
    pub adjusted_baseline: Decimal,
    pub adjusted_optimized: Decimal,
    pub differential: Decimal,
    pub differential_percentage: Decimal,
}

/// Everything needed to turn one optimization run into a daily record.
#[derive(Debug, Clone, Copy)]
pub struct DailyPerformanceInputs<'a> {
    pub date: NaiveDate,
    /// Chain metrics as fetched, before the optimizer touched them.
    pub snapshot: &'a [ChainMetric],
    pub baseline: &'a BaselineAllocation,
    pub outcome: &'a OptimizationOutcome,
    pub flows: FundFlowSummary,
    pub total_fund_size: Decimal,
    pub previous_day_total: Option<Decimal>,
}

/// Value of `allocation` after one day at `apy` percent a year.
pub fn compound_one_day(allocation: Decimal, apy: Decimal) -> Decimal {
    allocation * (Decimal::ONE + apy / Decimal::from(DAYS_PER_YEAR) / Decimal::ONE_HUNDRED)
}

/// Scale factor applied to both scenarios for the day's net flow.
pub fn calculate_fund_flow_multiplier(total_fund_size: Decimal, net_flow: Decimal) -> Decimal {
    if total_fund_size.is_zero() {
        return Decimal::ONE;
    }
    (total_fund_size + net_flow) / total_fund_size
}

pub fn calculate_differential(
    baseline_value: Decimal,
    optimized_value: Decimal,
    total_fund_size: Decimal,
    net_flow: Decimal,
) -> Differential {
    let multiplier = calculate_fund_flow_multiplier(total_fund_size, net_flow);
    let adjusted_baseline = baseline_value * multiplier;
    let adjusted_optimized = optimized_value * multiplier;
    let differential = adjusted_optimized - adjusted_baseline;

    let differential_percentage = if adjusted_baseline.is_zero() {
        Decimal::ZERO
    } else {
        differential / adjusted_baseline * Decimal::ONE_HUNDRED
    };

    Differential {
        adjusted_baseline,
        adjusted_optimized,
        differential,
        differential_percentage,
    }
}

/// Build the day's record from the pre-optimization snapshot and the optimizer outcome.
///
/// The baseline scenario compounds each chain's baseline amount at its current APY,
/// the optimized scenario compounds the optimizer's allocation at its predicted APY.
pub fn calculate_daily_performance(
    inputs: DailyPerformanceInputs<'_>,
) -> Result<DailyPerformanceRecord, EngineError> {
    let mut baseline_value = Decimal::ZERO;
    let mut optimized_value = Decimal::ZERO;
    let mut chains = Vec::with_capacity(inputs.snapshot.len());

    for metric in inputs.snapshot {
        let optimized = inputs.outcome.chain(&metric.chain_name).ok_or_else(|| {
            EngineError::InvalidInput(format!(
                "chain {} missing from optimizer outcome",
                metric.chain_name
            ))
        })?;
        let allocation_baseline = inputs.baseline.amount_for(&metric.chain_name);

        baseline_value += compound_one_day(allocation_baseline, metric.current_apy);
        optimized_value += compound_one_day(optimized.allocation, optimized.predicted_apy);

        chains.push(ChainPerformanceEntry {
            chain_name: metric.chain_name.clone(),
            apy_baseline: metric.current_apy,
            apy_optimized: optimized.predicted_apy,
            allocation_baseline,
            allocation_optimized: optimized.allocation,
            utilization_ratio: metric.current_utilization,
            total_supply: metric.total_liquidity,
        });
    }

    let differential = calculate_differential(
        baseline_value,
        optimized_value,
        inputs.total_fund_size,
        inputs.flows.net_flow,
    );

    Ok(DailyPerformanceRecord {
        date: inputs.date,
        total_fund_allocation_baseline: differential.adjusted_baseline,
        total_fund_allocation_optimized: differential.adjusted_optimized,
        differential: differential.differential,
        differential_percentage: differential.differential_percentage,
        total_inflows: inputs.flows.total_inflows,
        total_outflows: inputs.flows.total_outflows,
        net_flow: inputs.flows.net_flow,
        previous_day_total: inputs.previous_day_total,
        chains,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::OptimizedChain;
    use rust_decimal::dec;
    use std::collections::BTreeMap;

    #[test]
    fn test_differential_without_flows() {
        let result = calculate_differential(
            dec!(5_010_000),
            dec!(5_025_000),
            dec!(5_000_000),
            Decimal::ZERO,
        );

        assert_eq!(result.adjusted_baseline, dec!(5_010_000));
        assert_eq!(result.adjusted_optimized, dec!(5_025_000));
        assert_eq!(result.differential, dec!(15_000));
        assert!((result.differential_percentage - dec!(0.2994)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_flows_scale_both_scenarios() {
        // +10% net inflow
        let result = calculate_differential(
            dec!(5_010_000),
            dec!(5_025_000),
            dec!(5_000_000),
            dec!(500_000),
        );

        assert_eq!(result.adjusted_baseline, dec!(5_511_000));
        assert_eq!(result.adjusted_optimized, dec!(5_527_500));
        assert_eq!(result.differential, dec!(16_500));
        // the percentage is unaffected by a uniform scale
        assert!((result.differential_percentage - dec!(0.2994)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_zero_fund_size_uses_unit_multiplier() {
        assert_eq!(
            calculate_fund_flow_multiplier(Decimal::ZERO, dec!(1_000)),
            Decimal::ONE
        );
        let result = calculate_differential(dec!(100), dec!(110), Decimal::ZERO, dec!(1_000));
        assert_eq!(result.differential, dec!(10));
    }

    #[test]
    fn test_zero_baseline_has_zero_percentage() {
        let result = calculate_differential(Decimal::ZERO, dec!(1_000), dec!(5_000), Decimal::ZERO);
        assert_eq!(result.differential, dec!(1_000));
        assert_eq!(result.differential_percentage, Decimal::ZERO);
    }

    #[test]
    fn test_sign_consistency() {
        for (baseline, optimized) in [
            (dec!(1_000_000), dec!(1_000_500)),
            (dec!(1_000_000), dec!(999_000)),
            (dec!(1_000_000), dec!(1_000_000)),
        ] {
            let result = calculate_differential(baseline, optimized, dec!(1_000_000), dec!(-250_000));
            assert_eq!(
                result.differential.is_sign_negative() && !result.differential.is_zero(),
                result.differential_percentage.is_sign_negative()
                    && !result.differential_percentage.is_zero()
            );
            assert_eq!(result.differential.is_zero(), result.differential_percentage.is_zero());
        }
    }

    #[test]
    fn test_compound_one_day() {
        assert_eq!(compound_one_day(dec!(3_650_000), dec!(3.65)), dec!(3_650_365));
        assert!((compound_one_day(dec!(3_650_000), dec!(10)) - dec!(3_651_000)).abs() < dec!(0.000001));
        assert_eq!(compound_one_day(Decimal::ZERO, dec!(10)), Decimal::ZERO);
    }

    #[test]
    fn test_daily_record_breakdown() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let snapshot = vec![
            ChainMetric {
                chain_name: "ethereum".to_string(),
                current_apy: dec!(3.65),
                current_utilization: dec!(82),
                total_liquidity: dec!(300_000_000),
                elasticity_factor: dec!(0.05),
                current_allocation: dec!(3_650_000),
            },
            ChainMetric {
                chain_name: "base".to_string(),
                current_apy: dec!(7.3),
                current_utilization: dec!(64),
                total_liquidity: dec!(20_000_000),
                elasticity_factor: dec!(0.2),
                current_allocation: dec!(1_460_000),
            },
        ];
        let baseline = BaselineAllocation::new(
            None,
            BTreeMap::from([
                ("ethereum".to_string(), dec!(3_650_000)),
                ("base".to_string(), dec!(1_460_000)),
            ]),
        );
        let outcome = OptimizationOutcome {
            chains: vec![
                OptimizedChain {
                    chain_name: "ethereum".to_string(),
                    allocation: dec!(3_650_000),
                    predicted_apy: dec!(3.65),
                },
                OptimizedChain {
                    chain_name: "base".to_string(),
                    allocation: dec!(1_460_000),
                    predicted_apy: dec!(7.3),
                },
            ],
            iterations: 1,
            moves: 0,
            converged: true,
            daily_return_before: Decimal::ZERO,
            daily_return_after: Decimal::ZERO,
        };
        let flows = FundFlowSummary {
            total_inflows: dec!(20_000),
            total_outflows: dec!(5_000),
            net_flow: dec!(15_000),
        };

        let record = calculate_daily_performance(DailyPerformanceInputs {
            date,
            snapshot: &snapshot,
            baseline: &baseline,
            outcome: &outcome,
            flows,
            total_fund_size: dec!(5_110_000),
            previous_day_total: Some(dec!(5_100_000)),
        })
        .unwrap();

        assert_eq!(record.date, date);
        assert_eq!(record.chains.len(), 2);
        assert_eq!(record.differential, Decimal::ZERO);
        assert_eq!(record.differential_percentage, Decimal::ZERO);
        assert_eq!(record.total_inflows, dec!(20_000));
        assert_eq!(record.net_flow, dec!(15_000));
        assert_eq!(record.previous_day_total, Some(dec!(5_100_000)));

        let base = record.chain("base").unwrap();
        assert_eq!(base.utilization_ratio, dec!(64));
        assert_eq!(base.total_supply, dec!(20_000_000));
        // 3_650_000 * 1.0001 + 1_460_000 * 1.0002 = 5_110_657, then scaled by (5_125_000 / 5_110_000)
        let expected = dec!(5_110_657) * dec!(5_125_000) / dec!(5_110_000);
        assert!((record.total_fund_allocation_baseline - expected).abs() < dec!(0.000001));
    }

    #[test]
    fn test_missing_outcome_chain_is_rejected() {
        let snapshot = vec![ChainMetric {
            chain_name: "polygon".to_string(),
            current_apy: dec!(4),
            current_utilization: dec!(50),
            total_liquidity: dec!(1_000_000),
            elasticity_factor: dec!(0.1),
            current_allocation: Decimal::ZERO,
        }];
        let outcome = OptimizationOutcome {
            chains: Vec::new(),
            iterations: 0,
            moves: 0,
            converged: true,
            daily_return_before: Decimal::ZERO,
            daily_return_after: Decimal::ZERO,
        };

        let result = calculate_daily_performance(DailyPerformanceInputs {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            snapshot: &snapshot,
            baseline: &BaselineAllocation::default(),
            outcome: &outcome,
            flows: FundFlowSummary::default(),
            total_fund_size: dec!(1_000_000),
            previous_day_total: None,
        });

        assert!(matches!(result, Err(EngineError::InvalidInput(_))));
    }
}
