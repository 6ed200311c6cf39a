use std::sync::Arc;

use opentelemetry::{KeyValue, global, metrics::Counter};

#[derive(Debug)]
pub struct MetricsRegistry {
    pub performance: Arc<PerformanceMetrics>,
}

impl MetricsRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            performance: PerformanceMetrics::new(),
        })
    }
}

#[derive(Debug)]
pub struct PerformanceMetrics {
    runs: Counter<u64>,
    chains_excluded: Counter<u64>,
    rebalance_moves: Counter<u64>,
}

impl PerformanceMetrics {
    fn new() -> Arc<Self> {
        let meter = global::meter("rebalance-tracker");
        let runs = meter
            .u64_counter("daily_performance_runs_total")
            .with_description("Number of daily performance computations by outcome")
            .with_unit("count")
            .init();

        let chains_excluded = meter
            .u64_counter("chains_excluded_total")
            .with_description("Number of chains left out of a run for missing metrics")
            .with_unit("count")
            .init();

        let rebalance_moves = meter
            .u64_counter("rebalance_moves_total")
            .with_description("Number of pairwise moves committed by the optimizer")
            .with_unit("count")
            .init();

        Arc::new(Self {
            runs,
            chains_excluded,
            rebalance_moves,
        })
    }

    pub fn record_run(&self, outcome: RunOutcome) {
        self.runs
            .add(1, &[KeyValue::new("outcome", outcome.as_str().to_string())]);
    }

    pub fn record_chain_excluded(&self, chain_name: &str) {
        self.chains_excluded
            .add(1, &[KeyValue::new("chain", chain_name.to_string())]);
    }

    pub fn record_moves(&self, moves: u64) {
        if moves > 0 {
            self.rebalance_moves.add(moves, &[]);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Recorded,
    NoChainData,
    PersistenceFailed,
    Failed,
}

impl RunOutcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Recorded => "recorded",
            Self::NoChainData => "no_chain_data",
            Self::PersistenceFailed => "persistence_failed",
            Self::Failed => "failed",
        }
    }
}
