use chrono::{DateTime, NaiveDate, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_builder::{QueryFragment, QueryId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rebal_types::{ChainPerformanceEntry, DailyPerformanceRecord};

use crate::schema::daily_performance;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = daily_performance, primary_key(date))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DailyPerformance {
    pub date: NaiveDate,
    pub total_fund_allocation_baseline: Decimal,
    pub total_fund_allocation_optimized: Decimal,
    pub differential: Decimal,
    pub differential_percentage: Decimal,
    pub total_inflows: Decimal,
    pub total_outflows: Decimal,
    pub net_flow: Decimal,
    pub previous_day_total: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = daily_performance)]
pub struct NewDailyPerformance {
    pub date: NaiveDate,
    pub total_fund_allocation_baseline: Decimal,
    pub total_fund_allocation_optimized: Decimal,
    pub differential: Decimal,
    pub differential_percentage: Decimal,
    pub total_inflows: Decimal,
    pub total_outflows: Decimal,
    pub net_flow: Decimal,
    pub previous_day_total: Option<Decimal>,
}

impl From<&DailyPerformanceRecord> for NewDailyPerformance {
    fn from(record: &DailyPerformanceRecord) -> Self {
        Self {
            date: record.date,
            total_fund_allocation_baseline: record.total_fund_allocation_baseline,
            total_fund_allocation_optimized: record.total_fund_allocation_optimized,
            differential: record.differential,
            differential_percentage: record.differential_percentage,
            total_inflows: record.total_inflows,
            total_outflows: record.total_outflows,
            net_flow: record.net_flow,
            previous_day_total: record.previous_day_total,
        }
    }
}

impl DailyPerformance {
    pub fn find_by_date(date: NaiveDate, conn: &mut diesel::PgConnection) -> QueryResult<Option<Self>> {
        daily_performance::table
            .find(date)
            .select(Self::as_select())
            .first(conn)
            .optional()
    }

    /// Rows between `from` and `to` inclusive, oldest first
    pub fn find_range(
        from: NaiveDate,
        to: NaiveDate,
        conn: &mut diesel::PgConnection,
    ) -> QueryResult<Vec<Self>> {
        daily_performance::table
            .filter(daily_performance::date.ge(from))
            .filter(daily_performance::date.le(to))
            .order(daily_performance::date.asc())
            .select(Self::as_select())
            .load(conn)
    }

    /// Insert the row for `new.date` or overwrite every computed column of the
    /// existing one. A row whose values are unchanged is left untouched, `updated_at`
    /// included.
    pub fn upsert(new: &NewDailyPerformance, conn: &mut diesel::PgConnection) -> QueryResult<usize> {
        upsert_query(new).execute(conn)
    }

    pub fn into_record(self, chains: Vec<ChainPerformanceEntry>) -> DailyPerformanceRecord {
        DailyPerformanceRecord {
            date: self.date,
            total_fund_allocation_baseline: self.total_fund_allocation_baseline,
            total_fund_allocation_optimized: self.total_fund_allocation_optimized,
            differential: self.differential,
            differential_percentage: self.differential_percentage,
            total_inflows: self.total_inflows,
            total_outflows: self.total_outflows,
            net_flow: self.net_flow,
            previous_day_total: self.previous_day_total,
            chains,
        }
    }
}

fn upsert_query(
    new: &NewDailyPerformance,
) -> impl QueryFragment<Pg> + QueryId + RunQueryDsl<diesel::PgConnection> + '_ {
    use daily_performance::{
        date, differential, differential_percentage, net_flow, previous_day_total, table,
        total_fund_allocation_baseline, total_fund_allocation_optimized, total_inflows,
        total_outflows, updated_at,
    };
    use diesel::pg::upsert::excluded;
    use diesel::query_dsl::methods::FilterDsl;

    let changed = total_fund_allocation_baseline
        .is_distinct_from(excluded(total_fund_allocation_baseline))
        .or(total_fund_allocation_optimized
            .is_distinct_from(excluded(total_fund_allocation_optimized)))
        .or(differential.is_distinct_from(excluded(differential)))
        .or(differential_percentage.is_distinct_from(excluded(differential_percentage)))
        .or(total_inflows.is_distinct_from(excluded(total_inflows)))
        .or(total_outflows.is_distinct_from(excluded(total_outflows)))
        .or(net_flow.is_distinct_from(excluded(net_flow)))
        .or(previous_day_total.is_distinct_from(excluded(previous_day_total)));

    diesel::insert_into(table)
        .values(new)
        .on_conflict(date)
        .do_update()
        .set((
            total_fund_allocation_baseline.eq(excluded(total_fund_allocation_baseline)),
            total_fund_allocation_optimized.eq(excluded(total_fund_allocation_optimized)),
            differential.eq(excluded(differential)),
            differential_percentage.eq(excluded(differential_percentage)),
            total_inflows.eq(excluded(total_inflows)),
            total_outflows.eq(excluded(total_outflows)),
            net_flow.eq(excluded(net_flow)),
            previous_day_total.eq(excluded(previous_day_total)),
            updated_at.eq(diesel::dsl::now),
        ))
        .filter(changed)
}
