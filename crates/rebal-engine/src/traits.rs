use chrono::NaiveDate;
use rust_decimal::Decimal;

use rebal_types::{BaselineAllocation, ChainMetric, DailyPerformanceRecord, FundFlow};

use crate::error::EngineError;

/// Current metrics of every configured chain. Chains that could not be fetched are
/// left out of the result rather than failing the whole call.
#[async_trait::async_trait]
pub trait ChainDataProvider: Send + Sync {
    async fn fetch_all(&self) -> Vec<ChainMetric>;
}

/// Metrics of a single chain.
#[async_trait::async_trait]
pub trait ChainMetricSource: Send + Sync {
    fn chain_name(&self) -> &str;

    async fn fetch(&self) -> Result<ChainMetric, EngineError>;
}

#[async_trait::async_trait]
pub trait FundFlowStore: Send + Sync {
    async fn flows_for_date(&self, date: NaiveDate) -> Result<Vec<FundFlow>, EngineError>;

    /// Record a flow. Returns `false` when a flow with the same
    /// `(date, chain_name, tx_hash)` was already recorded.
    async fn record_flow(&self, flow: &FundFlow) -> Result<bool, EngineError>;
}

#[async_trait::async_trait]
pub trait TotalFundSizeOracle: Send + Sync {
    async fn current_pool_value(&self) -> Result<Decimal, EngineError>;
}

#[async_trait::async_trait]
pub trait BaselineAllocationConfig: Send + Sync {
    /// Baseline allocation in force on `date`.
    async fn allocation_for(&self, date: NaiveDate) -> Result<BaselineAllocation, EngineError>;
}

#[async_trait::async_trait]
pub trait PerformanceStore: Send + Sync {
    /// Insert or replace the record for `record.date` and all of its chain rows,
    /// atomically. Calling it twice with the same record leaves the store unchanged.
    async fn upsert_daily_performance(
        &self,
        record: &DailyPerformanceRecord,
    ) -> Result<(), EngineError>;

    async fn find_daily_performance(
        &self,
        date: NaiveDate,
    ) -> Result<Option<DailyPerformanceRecord>, EngineError>;

    /// Records between `from` and `to` inclusive, oldest first.
    async fn list_daily_performance(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyPerformanceRecord>, EngineError>;
}
