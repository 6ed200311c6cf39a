use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rebal_types::BaselineAllocation;

use crate::schema::baseline_allocations;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = baseline_allocations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BaselineAllocationEntry {
    pub id: i32,
    pub chain_name: String,
    pub effective_from: NaiveDate,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = baseline_allocations)]
pub struct NewBaselineAllocationEntry {
    pub chain_name: String,
    pub effective_from: NaiveDate,
    pub amount: Decimal,
}

impl BaselineAllocationEntry {
    /// Latest entry per chain that is effective on `date`
    pub fn effective_on(date: NaiveDate, conn: &mut diesel::PgConnection) -> QueryResult<Vec<Self>> {
        baseline_allocations::table
            .filter(baseline_allocations::effective_from.le(date))
            .distinct_on(baseline_allocations::chain_name)
            .order((
                baseline_allocations::chain_name.asc(),
                baseline_allocations::effective_from.desc(),
            ))
            .select(Self::as_select())
            .load(conn)
    }

    pub fn upsert(
        new: &NewBaselineAllocationEntry,
        conn: &mut diesel::PgConnection,
    ) -> QueryResult<Self> {
        use diesel::pg::upsert::excluded;

        diesel::insert_into(baseline_allocations::table)
            .values(new)
            .on_conflict((
                baseline_allocations::chain_name,
                baseline_allocations::effective_from,
            ))
            .do_update()
            .set(baseline_allocations::amount.eq(excluded(baseline_allocations::amount)))
            .returning(Self::as_returning())
            .get_result(conn)
    }

    /// Fold the rows returned by [`Self::effective_on`] into one allocation
    pub fn into_allocation(entries: Vec<Self>) -> BaselineAllocation {
        let effective_from = entries.iter().map(|entry| entry.effective_from).max();
        let allocations: BTreeMap<String, Decimal> = entries
            .into_iter()
            .map(|entry| (entry.chain_name, entry.amount))
            .collect();
        BaselineAllocation::new(effective_from, allocations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    fn entry(chain_name: &str, day: u32, amount: Decimal) -> BaselineAllocationEntry {
        BaselineAllocationEntry {
            id: 1,
            chain_name: chain_name.to_string(),
            effective_from: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            amount,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_entries_fold_into_allocation() {
        let allocation = BaselineAllocationEntry::into_allocation(vec![
            entry("arbitrum", 1, dec!(1_000_000)),
            entry("ethereum", 15, dec!(4_000_000)),
        ]);

        assert_eq!(allocation.total(), dec!(5_000_000));
        assert_eq!(allocation.amount_for("ethereum"), dec!(4_000_000));
        assert_eq!(
            allocation.effective_from,
            NaiveDate::from_ymd_opt(2024, 6, 15)
        );
    }

    #[test]
    fn test_no_entries_is_empty() {
        let allocation = BaselineAllocationEntry::into_allocation(Vec::new());
        assert!(allocation.is_empty());
        assert!(allocation.effective_from.is_none());
    }
}
