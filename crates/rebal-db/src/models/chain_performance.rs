use chrono::{DateTime, NaiveDate, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_builder::{QueryFragment, QueryId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rebal_types::{ChainPerformanceEntry, DailyPerformanceRecord};

use crate::schema::chain_performance;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = chain_performance)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChainPerformance {
    pub id: i32,
    pub date: NaiveDate,
    pub chain_name: String,
    pub position: i32,
    pub apy_baseline: Decimal,
    pub apy_optimized: Decimal,
    pub allocation_baseline: Decimal,
    pub allocation_optimized: Decimal,
    pub utilization_ratio: Decimal,
    pub total_supply: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = chain_performance)]
pub struct NewChainPerformance {
    pub date: NaiveDate,
    pub chain_name: String,
    pub position: i32,
    pub apy_baseline: Decimal,
    pub apy_optimized: Decimal,
    pub allocation_baseline: Decimal,
    pub allocation_optimized: Decimal,
    pub utilization_ratio: Decimal,
    pub total_supply: Decimal,
}

impl NewChainPerformance {
    /// One row per chain of the record, keeping the record's chain order
    pub fn from_record(record: &DailyPerformanceRecord) -> Vec<Self> {
        record
            .chains
            .iter()
            .enumerate()
            .map(|(position, entry)| Self {
                date: record.date,
                chain_name: entry.chain_name.clone(),
                position: position as i32,
                apy_baseline: entry.apy_baseline,
                apy_optimized: entry.apy_optimized,
                allocation_baseline: entry.allocation_baseline,
                allocation_optimized: entry.allocation_optimized,
                utilization_ratio: entry.utilization_ratio,
                total_supply: entry.total_supply,
            })
            .collect()
    }
}

impl From<ChainPerformance> for ChainPerformanceEntry {
    fn from(row: ChainPerformance) -> Self {
        Self {
            chain_name: row.chain_name,
            apy_baseline: row.apy_baseline,
            apy_optimized: row.apy_optimized,
            allocation_baseline: row.allocation_baseline,
            allocation_optimized: row.allocation_optimized,
            utilization_ratio: row.utilization_ratio,
            total_supply: row.total_supply,
        }
    }
}

impl ChainPerformance {
    pub fn find_by_date(date: NaiveDate, conn: &mut diesel::PgConnection) -> QueryResult<Vec<Self>> {
        chain_performance::table
            .filter(chain_performance::date.eq(date))
            .order(chain_performance::position.asc())
            .select(Self::as_select())
            .load(conn)
    }

    pub fn find_range(
        from: NaiveDate,
        to: NaiveDate,
        conn: &mut diesel::PgConnection,
    ) -> QueryResult<Vec<Self>> {
        chain_performance::table
            .filter(chain_performance::date.ge(from))
            .filter(chain_performance::date.le(to))
            .order((chain_performance::date.asc(), chain_performance::position.asc()))
            .select(Self::as_select())
            .load(conn)
    }

    /// Upsert rows on `(date, chain_name)`, leaving rows with unchanged values untouched
    pub fn upsert_many(
        rows: &[NewChainPerformance],
        conn: &mut diesel::PgConnection,
    ) -> QueryResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        upsert_many_query(rows).execute(conn)
    }

    /// Delete the rows of `date` whose chain is not in `keep`
    pub fn delete_stale(
        date: NaiveDate,
        keep: &[String],
        conn: &mut diesel::PgConnection,
    ) -> QueryResult<usize> {
        diesel::delete(
            chain_performance::table
                .filter(chain_performance::date.eq(date))
                .filter(chain_performance::chain_name.ne_all(keep)),
        )
        .execute(conn)
    }
}

fn upsert_many_query(
    rows: &[NewChainPerformance],
) -> impl QueryFragment<Pg> + QueryId + RunQueryDsl<diesel::PgConnection> + '_ {
    use chain_performance::{
        allocation_baseline, allocation_optimized, apy_baseline, apy_optimized, chain_name, date,
        position, table, total_supply, updated_at, utilization_ratio,
    };
    use diesel::pg::upsert::excluded;
    use diesel::query_dsl::methods::FilterDsl;

    let changed = position
        .is_distinct_from(excluded(position))
        .or(apy_baseline.is_distinct_from(excluded(apy_baseline)))
        .or(apy_optimized.is_distinct_from(excluded(apy_optimized)))
        .or(allocation_baseline.is_distinct_from(excluded(allocation_baseline)))
        .or(allocation_optimized.is_distinct_from(excluded(allocation_optimized)))
        .or(utilization_ratio.is_distinct_from(excluded(utilization_ratio)))
        .or(total_supply.is_distinct_from(excluded(total_supply)));

    diesel::insert_into(table)
        .values(rows)
        .on_conflict((date, chain_name))
        .do_update()
        .set((
            position.eq(excluded(position)),
            apy_baseline.eq(excluded(apy_baseline)),
            apy_optimized.eq(excluded(apy_optimized)),
            allocation_baseline.eq(excluded(allocation_baseline)),
            allocation_optimized.eq(excluded(allocation_optimized)),
            utilization_ratio.eq(excluded(utilization_ratio)),
            total_supply.eq(excluded(total_supply)),
            updated_at.eq(diesel::dsl::now),
        ))
        .filter(changed)
}
