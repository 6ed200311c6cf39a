use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    Hash,
    Eq,
    PartialEq,
    Display,
    AsRefStr,
    EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum FlowType {
    Deposit,
    Withdrawal,
}

/// A deposit into or withdrawal from the pooled fund on one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundFlow {
    pub date: NaiveDate,
    pub chain_name: String,
    pub flow_type: FlowType,
    pub amount: Decimal,
    pub user_address: Option<String>,
    pub tx_hash: Option<String>,
    pub block_number: Option<i64>,
}

impl FundFlow {
    pub fn new(
        date: NaiveDate,
        chain_name: impl Into<String>,
        flow_type: FlowType,
        amount: Decimal,
    ) -> Self {
        Self {
            date,
            chain_name: chain_name.into(),
            flow_type,
            amount,
            user_address: None,
            tx_hash: None,
            block_number: None,
        }
    }

    #[must_use]
    pub fn with_tx_hash(mut self, tx_hash: impl Into<String>) -> Self {
        self.tx_hash = Some(tx_hash.into());
        self
    }

    /// Signed contribution to the net flow: positive for deposits.
    pub fn signed_amount(&self) -> Decimal {
        match self.flow_type {
            FlowType::Deposit => self.amount,
            FlowType::Withdrawal => -self.amount,
        }
    }
}

/// Totals of a day's fund flows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundFlowSummary {
    pub total_inflows: Decimal,
    pub total_outflows: Decimal,
    pub net_flow: Decimal,
}
