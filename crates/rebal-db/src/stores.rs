use std::collections::BTreeMap;

use chrono::NaiveDate;
use deadpool_diesel::postgres::Pool;
use diesel::Connection;
use rust_decimal::Decimal;

use rebal_engine::{
    BaselineAllocationConfig, EngineError, FundFlowStore, PerformanceStore,
};
use rebal_types::{BaselineAllocation, ChainPerformanceEntry, DailyPerformanceRecord, FundFlow};

use crate::errors::DatabaseError;
use crate::models::{
    BaselineAllocationEntry, ChainPerformance, DailyPerformance, NewBaselineAllocationEntry,
    NewChainPerformance, NewDailyPerformance, NewFundFlow, StoredFundFlow,
};
use crate::pool::RebalPool;

/// Replace the record of `record.date` and its chain rows in one transaction.
///
/// Chains no longer part of the record are removed so a re-run never leaves rows
/// from a previous computation behind.
pub fn replace_daily_performance(
    record: &DailyPerformanceRecord,
    conn: &mut diesel::PgConnection,
) -> diesel::QueryResult<()> {
    let daily = NewDailyPerformance::from(record);
    let chains = NewChainPerformance::from_record(record);
    let chain_names: Vec<String> = chains.iter().map(|c| c.chain_name.clone()).collect();

    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        DailyPerformance::upsert(&daily, conn)?;
        ChainPerformance::delete_stale(record.date, &chain_names, conn)?;
        ChainPerformance::upsert_many(&chains, conn)?;
        Ok(())
    })
}

#[derive(Clone)]
pub struct PgPerformanceStore {
    pool: Pool,
}

impl PgPerformanceStore {
    pub const fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PerformanceStore for PgPerformanceStore {
    async fn upsert_daily_performance(
        &self,
        record: &DailyPerformanceRecord,
    ) -> Result<(), EngineError> {
        let record = record.clone();
        let date = record.date;
        self.pool
            .run_query(format!("upsert daily performance for {date}"), move |conn| {
                replace_daily_performance(&record, conn)
            })
            .await?;

        tracing::debug!(date = %date, "Daily performance stored");
        Ok(())
    }

    async fn find_daily_performance(
        &self,
        date: NaiveDate,
    ) -> Result<Option<DailyPerformanceRecord>, EngineError> {
        let found = self
            .pool
            .run_query(format!("find daily performance for {date}"), move |conn| {
                let Some(daily) = DailyPerformance::find_by_date(date, conn)? else {
                    return Ok::<_, diesel::result::Error>(None);
                };
                let chains = ChainPerformance::find_by_date(date, conn)?;
                Ok(Some((daily, chains)))
            })
            .await?;

        Ok(found.map(|(daily, chains)| {
            daily.into_record(chains.into_iter().map(ChainPerformanceEntry::from).collect())
        }))
    }

    async fn list_daily_performance(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyPerformanceRecord>, EngineError> {
        if from > to {
            return Ok(Vec::new());
        }

        let (days, chains) = self
            .pool
            .run_query(
                format!("list daily performance from {from} to {to}"),
                move |conn| {
                    let days = DailyPerformance::find_range(from, to, conn)?;
                    let chains = ChainPerformance::find_range(from, to, conn)?;
                    Ok::<_, diesel::result::Error>((days, chains))
                },
            )
            .await?;

        let mut chains_by_date: BTreeMap<NaiveDate, Vec<ChainPerformanceEntry>> = BTreeMap::new();
        for chain in chains {
            chains_by_date
                .entry(chain.date)
                .or_default()
                .push(chain.into());
        }

        Ok(days
            .into_iter()
            .map(|daily| {
                let chains = chains_by_date.remove(&daily.date).unwrap_or_default();
                daily.into_record(chains)
            })
            .collect())
    }
}

#[derive(Clone)]
pub struct PgFundFlowStore {
    pool: Pool,
}

impl PgFundFlowStore {
    pub const fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl FundFlowStore for PgFundFlowStore {
    async fn flows_for_date(&self, date: NaiveDate) -> Result<Vec<FundFlow>, EngineError> {
        let rows = self
            .pool
            .run_query(format!("fetch fund flows for {date}"), move |conn| {
                StoredFundFlow::find_by_date(date, conn)
            })
            .await?;

        let flows = rows
            .into_iter()
            .map(FundFlow::try_from)
            .collect::<Result<Vec<_>, DatabaseError>>()?;
        Ok(flows)
    }

    async fn record_flow(&self, flow: &FundFlow) -> Result<bool, EngineError> {
        let new = NewFundFlow::from(flow);
        let inserted = self
            .pool
            .run_query(
                format!("record {} fund flow on {}", new.flow_type, new.chain_name),
                move |conn| StoredFundFlow::insert_if_new(&new, conn),
            )
            .await?;
        Ok(inserted)
    }
}

#[derive(Clone)]
pub struct PgBaselineAllocations {
    pool: Pool,
}

impl PgBaselineAllocations {
    pub const fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Set the baseline amount of a chain from `effective_from` onwards.
    pub async fn set_allocation(
        &self,
        chain_name: &str,
        effective_from: NaiveDate,
        amount: Decimal,
    ) -> Result<(), DatabaseError> {
        let new = NewBaselineAllocationEntry {
            chain_name: chain_name.to_string(),
            effective_from,
            amount,
        };
        self.pool
            .run_query(
                format!("set baseline allocation for {chain_name}"),
                move |conn| BaselineAllocationEntry::upsert(&new, conn),
            )
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl BaselineAllocationConfig for PgBaselineAllocations {
    async fn allocation_for(&self, date: NaiveDate) -> Result<BaselineAllocation, EngineError> {
        let entries = self
            .pool
            .run_query(format!("resolve baseline allocation for {date}"), move |conn| {
                BaselineAllocationEntry::effective_on(date, conn)
            })
            .await?;

        let allocation = BaselineAllocationEntry::into_allocation(entries);
        if allocation.is_empty() {
            tracing::warn!(date = %date, "No baseline allocation configured");
        }
        Ok(allocation)
    }
}
