use rust_decimal::Decimal;

use rebal_types::{FlowType, FundFlow, FundFlowSummary};

/// Sum a day's deposits and withdrawals.
pub fn aggregate_fund_flows(flows: &[FundFlow]) -> FundFlowSummary {
    let total_inflows: Decimal = flows
        .iter()
        .filter(|flow| flow.flow_type == FlowType::Deposit)
        .map(|flow| flow.amount)
        .sum();

    let total_outflows: Decimal = flows
        .iter()
        .filter(|flow| flow.flow_type == FlowType::Withdrawal)
        .map(|flow| flow.amount)
        .sum();

    FundFlowSummary {
        total_inflows,
        total_outflows,
        net_flow: total_inflows - total_outflows,
    }
}
