pub mod chain;
pub mod flow;
pub mod performance;

pub use chain::{BaselineAllocation, ChainMetric};
pub use flow::{FlowType, FundFlow, FundFlowSummary};
pub use performance::{ChainPerformanceEntry, DailyPerformanceRecord};
