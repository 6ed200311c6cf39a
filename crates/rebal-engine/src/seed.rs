use std::collections::HashSet;

use rust_decimal::Decimal;

use rebal_types::{BaselineAllocation, ChainMetric};

use crate::config::SeedPolicy;

/// Build the optimizer's working set from a metric snapshot.
///
/// Every chain starts from its baseline amount (zero when it is not part of the
/// baseline), optionally rescaled to the fund size after the day's net flow.
/// Duplicate chain names keep their first occurrence.
pub fn seed_working_set(
    snapshot: &[ChainMetric],
    baseline: &BaselineAllocation,
    policy: SeedPolicy,
    total_fund_size: Decimal,
    net_flow: Decimal,
) -> Vec<ChainMetric> {
    let scale = match policy {
        SeedPolicy::Fixed => Decimal::ONE,
        SeedPolicy::ScaleToAvailableFunds => {
            available_funds_scale(baseline.total(), total_fund_size + net_flow)
        }
    };

    let mut seen = HashSet::with_capacity(snapshot.len());
    snapshot
        .iter()
        .filter(|metric| {
            let first = seen.insert(metric.chain_name.as_str());
            if !first {
                tracing::warn!(chain = %metric.chain_name, "Ignoring duplicate chain metric");
            }
            first
        })
        .map(|metric| ChainMetric {
            current_allocation: baseline.amount_for(&metric.chain_name) * scale,
            ..metric.clone()
        })
        .collect()
}

fn available_funds_scale(baseline_total: Decimal, available_funds: Decimal) -> Decimal {
    if baseline_total <= Decimal::ZERO {
        return Decimal::ONE;
    }
    (available_funds / baseline_total).max(Decimal::ZERO)
}
