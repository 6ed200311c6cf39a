use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rebal_types::{FlowType, FundFlow};

use crate::errors::DatabaseError;
use crate::schema::fund_flows;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = fund_flows)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StoredFundFlow {
    pub id: i64,
    pub date: NaiveDate,
    pub chain_name: String,
    pub flow_type: String,
    pub amount: Decimal,
    pub user_address: Option<String>,
    pub tx_hash: Option<String>,
    pub block_number: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = fund_flows)]
pub struct NewFundFlow {
    pub date: NaiveDate,
    pub chain_name: String,
    pub flow_type: String,
    pub amount: Decimal,
    pub user_address: Option<String>,
    pub tx_hash: Option<String>,
    pub block_number: Option<i64>,
}

impl From<&FundFlow> for NewFundFlow {
    fn from(flow: &FundFlow) -> Self {
        Self {
            date: flow.date,
            chain_name: flow.chain_name.clone(),
            flow_type: flow.flow_type.to_string(),
            amount: flow.amount,
            user_address: flow.user_address.clone(),
            tx_hash: flow.tx_hash.clone(),
            block_number: flow.block_number,
        }
    }
}

impl TryFrom<StoredFundFlow> for FundFlow {
    type Error = DatabaseError;

    fn try_from(row: StoredFundFlow) -> Result<Self, Self::Error> {
        let flow_type = FlowType::from_str(&row.flow_type).map_err(|_| {
            DatabaseError::invalid_data(
                format!("read fund flow {}", row.id),
                format!("unknown flow type '{}'", row.flow_type),
            )
        })?;

        Ok(Self {
            date: row.date,
            chain_name: row.chain_name,
            flow_type,
            amount: row.amount,
            user_address: row.user_address,
            tx_hash: row.tx_hash,
            block_number: row.block_number,
        })
    }
}

impl StoredFundFlow {
    pub fn find_by_date(date: NaiveDate, conn: &mut diesel::PgConnection) -> QueryResult<Vec<Self>> {
        fund_flows::table
            .filter(fund_flows::date.eq(date))
            .order(fund_flows::id.asc())
            .select(Self::as_select())
            .load(conn)
    }

    /// Insert a flow unless the same `(date, chain_name, tx_hash)` already exists.
    /// Returns whether a row was written.
    pub fn insert_if_new(new: &NewFundFlow, conn: &mut diesel::PgConnection) -> QueryResult<bool> {
        let inserted = diesel::insert_into(fund_flows::table)
            .values(new)
            .on_conflict((fund_flows::date, fund_flows::chain_name, fund_flows::tx_hash))
            .do_nothing()
            .execute(conn)?;
        Ok(inserted > 0)
    }
}
