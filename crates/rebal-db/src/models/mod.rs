pub mod baseline_allocation;
pub mod chain_performance;
pub mod daily_performance;
pub mod fund_flow;

pub use baseline_allocation::{BaselineAllocationEntry, NewBaselineAllocationEntry};
pub use chain_performance::{ChainPerformance, NewChainPerformance};
pub use daily_performance::{DailyPerformance, NewDailyPerformance};
pub use fund_flow::{NewFundFlow, StoredFundFlow};
