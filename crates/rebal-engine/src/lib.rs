pub mod collector;
pub mod config;
pub mod differential;
pub mod error;
pub mod flows;
pub mod guard;
pub mod memory;
pub mod optimizer;
pub mod predictor;
pub mod seed;
pub mod service;
pub mod task;
pub mod traits;

pub use collector::FanOutChainDataProvider;
pub use config::{EngineConfig, OptimizerConfig, SeedPolicy};
pub use differential::{
    DailyPerformanceInputs, Differential, calculate_daily_performance, calculate_differential,
    calculate_fund_flow_multiplier, compound_one_day,
};
pub use error::EngineError;
pub use flows::aggregate_fund_flows;
pub use guard::DateGuard;
pub use optimizer::{AllocationOptimizer, OptimizationOutcome, OptimizedChain, aggregate_daily_return};
pub use predictor::predict_apy;
pub use seed::seed_working_set;
pub use service::{Collaborators, PerformanceService};
pub use task::PerformanceTask;
pub use traits::{
    BaselineAllocationConfig, ChainDataProvider, ChainMetricSource, FundFlowStore,
    PerformanceStore, TotalFundSizeOracle,
};
