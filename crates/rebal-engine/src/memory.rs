//! In-process collaborators, used for dry runs and tests.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use rebal_types::{BaselineAllocation, DailyPerformanceRecord, FundFlow};

use crate::error::EngineError;
use crate::traits::{
    BaselineAllocationConfig, FundFlowStore, PerformanceStore, TotalFundSizeOracle,
};

#[derive(Debug, Default)]
pub struct InMemoryPerformanceStore {
    records: RwLock<BTreeMap<NaiveDate, DailyPerformanceRecord>>,
}

impl InMemoryPerformanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl PerformanceStore for InMemoryPerformanceStore {
    async fn upsert_daily_performance(
        &self,
        record: &DailyPerformanceRecord,
    ) -> Result<(), EngineError> {
        self.records
            .write()
            .await
            .insert(record.date, record.clone());
        Ok(())
    }

    async fn find_daily_performance(
        &self,
        date: NaiveDate,
    ) -> Result<Option<DailyPerformanceRecord>, EngineError> {
        Ok(self.records.read().await.get(&date).cloned())
    }

    async fn list_daily_performance(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyPerformanceRecord>, EngineError> {
        if from > to {
            return Ok(Vec::new());
        }
        Ok(self
            .records
            .read()
            .await
            .range(from..=to)
            .map(|(_, record)| record.clone())
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryFundFlowStore {
    inner: RwLock<FlowsInner>,
}

#[derive(Debug, Default)]
struct FlowsInner {
    flows: Vec<FundFlow>,
    seen: HashSet<(NaiveDate, String, String)>,
}

impl InMemoryFundFlowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl FundFlowStore for InMemoryFundFlowStore {
    async fn flows_for_date(&self, date: NaiveDate) -> Result<Vec<FundFlow>, EngineError> {
        Ok(self
            .inner
            .read()
            .await
            .flows
            .iter()
            .filter(|flow| flow.date == date)
            .cloned()
            .collect())
    }

    async fn record_flow(&self, flow: &FundFlow) -> Result<bool, EngineError> {
        let mut inner = self.inner.write().await;

        // flows without a tx hash cannot be deduplicated
        if let Some(tx_hash) = &flow.tx_hash {
            let key = (flow.date, flow.chain_name.clone(), tx_hash.clone());
            if !inner.seen.insert(key) {
                return Ok(false);
            }
        }

        inner.flows.push(flow.clone());
        Ok(true)
    }
}

/// Effective-dated baseline allocations held in memory.
#[derive(Debug, Default, Clone)]
pub struct StaticBaselineAllocation {
    /// chain name -> (effective from -> amount)
    entries: BTreeMap<String, BTreeMap<NaiveDate, Decimal>>,
}

impl StaticBaselineAllocation {
    pub fn new() -> Self {
        Self::default()
    }

    /// A baseline that applies to every date.
    pub fn constant(allocations: impl IntoIterator<Item = (String, Decimal)>) -> Self {
        let mut baseline = Self::new();
        for (chain_name, amount) in allocations {
            baseline.set(chain_name, NaiveDate::MIN, amount);
        }
        baseline
    }

    pub fn set(&mut self, chain_name: impl Into<String>, effective_from: NaiveDate, amount: Decimal) {
        self.entries
            .entry(chain_name.into())
            .or_default()
            .insert(effective_from, amount);
    }

    /// Latest entry per chain whose `effective_from` is on or before `date`.
    pub fn resolve(&self, date: NaiveDate) -> BaselineAllocation {
        let mut effective_from: Option<NaiveDate> = None;
        let mut allocations = BTreeMap::new();

        for (chain_name, history) in &self.entries {
            if let Some((from, amount)) = history.range(..=date).next_back() {
                allocations.insert(chain_name.clone(), *amount);
                effective_from = Some(effective_from.map_or(*from, |current| current.max(*from)));
            }
        }

        BaselineAllocation::new(effective_from, allocations)
    }
}

#[async_trait::async_trait]
impl BaselineAllocationConfig for StaticBaselineAllocation {
    async fn allocation_for(&self, date: NaiveDate) -> Result<BaselineAllocation, EngineError> {
        Ok(self.resolve(date))
    }
}

/// Oracle returning a fixed pool value.
#[derive(Debug, Clone, Copy)]
pub struct FixedFundSizeOracle(pub Decimal);

#[async_trait::async_trait]
impl TotalFundSizeOracle for FixedFundSizeOracle {
    async fn current_pool_value(&self) -> Result<Decimal, EngineError> {
        Ok(self.0)
    }
}
