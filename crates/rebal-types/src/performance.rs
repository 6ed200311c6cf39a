use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One chain's row of a daily performance record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainPerformanceEntry {
    pub chain_name: String,
    pub apy_baseline: Decimal,
    pub apy_optimized: Decimal,
    pub allocation_baseline: Decimal,
    pub allocation_optimized: Decimal,
    pub utilization_ratio: Decimal,
    pub total_supply: Decimal,
}

/// The persisted result of one day's baseline vs optimized comparison.
///
/// Both totals are already adjusted by the day's fund-flow multiplier, so
/// `differential == total_fund_allocation_optimized - total_fund_allocation_baseline`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPerformanceRecord {
    pub date: NaiveDate,
    pub total_fund_allocation_baseline: Decimal,
    pub total_fund_allocation_optimized: Decimal,
    pub differential: Decimal,
    pub differential_percentage: Decimal,
    pub total_inflows: Decimal,
    pub total_outflows: Decimal,
    pub net_flow: Decimal,
    pub previous_day_total: Option<Decimal>,
    pub chains: Vec<ChainPerformanceEntry>,
}

impl DailyPerformanceRecord {
    pub fn chain(&self, chain_name: &str) -> Option<&ChainPerformanceEntry> {
        self.chains.iter().find(|c| c.chain_name == chain_name)
    }
}
