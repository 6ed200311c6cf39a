use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use rebal_metrics::{MetricsRegistry, RunOutcome};
use rebal_types::{BaselineAllocation, ChainMetric, DailyPerformanceRecord, FundFlow};

use crate::config::EngineConfig;
use crate::differential::{DailyPerformanceInputs, calculate_daily_performance};
use crate::error::EngineError;
use crate::flows::aggregate_fund_flows;
use crate::guard::DateGuard;
use crate::optimizer::AllocationOptimizer;
use crate::seed::seed_working_set;
use crate::traits::{
    BaselineAllocationConfig, ChainDataProvider, FundFlowStore, PerformanceStore,
    TotalFundSizeOracle,
};

/// External systems the daily computation reads from and writes to.
#[derive(Clone)]
pub struct Collaborators {
    pub chain_data: Arc<dyn ChainDataProvider>,
    pub fund_flows: Arc<dyn FundFlowStore>,
    pub fund_size_oracle: Arc<dyn TotalFundSizeOracle>,
    pub baseline: Arc<dyn BaselineAllocationConfig>,
    pub store: Arc<dyn PerformanceStore>,
}

pub struct PerformanceService {
    collaborators: Collaborators,
    config: EngineConfig,
    optimizer: AllocationOptimizer,
    date_guard: DateGuard,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl PerformanceService {
    pub fn new(collaborators: Collaborators, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            collaborators,
            optimizer: AllocationOptimizer::new(config.optimizer),
            config,
            date_guard: DateGuard::new(),
            metrics: None,
        })
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the current day every `interval` until cancelled.
    pub async fn run_forever(&self, interval: Duration) {
        loop {
            match self.run_today().await {
                Ok(_) => {}
                Err(e) if e.is_insufficient_data() => {
                    tracing::warn!("[PerformanceService] 🟡 Daily run skipped: {e}");
                }
                Err(e) => {
                    tracing::error!("[PerformanceService] 🔴 Error in daily performance cycle: {e}");
                }
            }
            self.date_guard.prune();

            tokio::time::sleep(interval).await;
        }
    }

    /// Compute and store the performance record for the current UTC day.
    pub async fn run_today(&self) -> Result<DailyPerformanceRecord, EngineError> {
        self.run_for_date(Utc::now().date_naive()).await
    }

    /// Compute and store the performance record for `date`.
    ///
    /// Re-running for the same date replaces the stored record; concurrent runs for
    /// the same date are serialized.
    pub async fn run_for_date(&self, date: NaiveDate) -> Result<DailyPerformanceRecord, EngineError> {
        let result = self.compute_daily_performance(date, true).await;
        self.record_run(&result);
        result
    }

    /// Compute the record for `date` without storing it.
    pub async fn preview_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<DailyPerformanceRecord, EngineError> {
        self.compute_daily_performance(date, false).await
    }

    pub async fn record_fund_flow(&self, flow: &FundFlow) -> Result<bool, EngineError> {
        if flow.amount <= Decimal::ZERO {
            return Err(EngineError::InvalidInput(format!(
                "fund flow amount must be positive, got {}",
                flow.amount
            )));
        }
        if flow.chain_name.trim().is_empty() {
            return Err(EngineError::InvalidInput(
                "fund flow chain name is empty".to_string(),
            ));
        }

        let inserted = self.collaborators.fund_flows.record_flow(flow).await?;
        if !inserted {
            tracing::debug!(
                chain = %flow.chain_name,
                date = %flow.date,
                tx_hash = ?flow.tx_hash,
                "[PerformanceService] Duplicate fund flow ignored"
            );
        }
        Ok(inserted)
    }

    pub async fn history(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyPerformanceRecord>, EngineError> {
        self.collaborators
            .store
            .list_daily_performance(from, to)
            .await
    }

    async fn compute_daily_performance(
        &self,
        date: NaiveDate,
        persist: bool,
    ) -> Result<DailyPerformanceRecord, EngineError> {
        let _date_lock = self.date_guard.lock(date).await;
        let start_time = Instant::now();
        tracing::info!("[PerformanceService] 🧮 Computing daily performance for {date}...");

        let snapshot = self.collaborators.chain_data.fetch_all().await;
        if snapshot.is_empty() {
            tracing::warn!(
                "[PerformanceService] 🔴 No chain data available for {date}, skipping the day"
            );
            return Err(EngineError::NoChainData);
        }

        let flows = self.collaborators.fund_flows.flows_for_date(date).await?;
        let flow_summary = aggregate_fund_flows(&flows);

        let total_fund_size = self.resolve_total_fund_size().await;
        let baseline = self.collaborators.baseline.allocation_for(date).await?;
        self.report_excluded_chains(&baseline, &snapshot);

        let working_set = seed_working_set(
            &snapshot,
            &baseline,
            self.config.seed_policy,
            total_fund_size,
            flow_summary.net_flow,
        );
        let seeded_snapshot = working_set.clone();
        let outcome = self.optimizer.optimize(working_set)?;

        let previous_day_total = match date.pred_opt() {
            Some(previous) => self
                .collaborators
                .store
                .find_daily_performance(previous)
                .await?
                .map(|record| record.total_fund_allocation_optimized),
            None => None,
        };

        let record = calculate_daily_performance(DailyPerformanceInputs {
            date,
            snapshot: &seeded_snapshot,
            baseline: &baseline,
            outcome: &outcome,
            flows: flow_summary,
            total_fund_size,
            previous_day_total,
        })?;

        if persist {
            self.collaborators
                .store
                .upsert_daily_performance(&record)
                .await?;
        }

        if let Some(metrics) = &self.metrics {
            metrics.performance.record_moves(outcome.moves as u64);
        }

        tracing::info!(
            date = %date,
            chains = record.chains.len(),
            iterations = outcome.iterations,
            moves = outcome.moves,
            converged = outcome.converged,
            baseline = %record.total_fund_allocation_baseline,
            optimized = %record.total_fund_allocation_optimized,
            differential = %record.differential,
            differential_pct = %record.differential_percentage,
            persisted = persist,
            "[PerformanceService] 🧮 Daily performance computed in {}ms",
            start_time.elapsed().as_millis()
        );

        Ok(record)
    }

    async fn resolve_total_fund_size(&self) -> Decimal {
        let fallback = self.config.fallback_fund_size;
        match self.collaborators.fund_size_oracle.current_pool_value().await {
            Ok(value) if value >= Decimal::ZERO => value,
            Ok(value) => {
                tracing::warn!(
                    value = %value,
                    fallback = %fallback,
                    "[PerformanceService] Pool value oracle returned a negative value, using fallback fund size"
                );
                fallback
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    fallback = %fallback,
                    "[PerformanceService] Pool value oracle unavailable, using fallback fund size"
                );
                fallback
            }
        }
    }

    fn report_excluded_chains(&self, baseline: &BaselineAllocation, snapshot: &[ChainMetric]) {
        for chain_name in baseline.allocations.keys() {
            if snapshot.iter().any(|m| &m.chain_name == chain_name) {
                continue;
            }
            tracing::warn!(
                chain = %chain_name,
                "[PerformanceService] Baseline chain has no metrics today, excluding it"
            );
            if let Some(metrics) = &self.metrics {
                metrics.performance.record_chain_excluded(chain_name);
            }
        }
    }

    fn record_run(&self, result: &Result<DailyPerformanceRecord, EngineError>) {
        let Some(metrics) = &self.metrics else {
            return;
        };
        let outcome = match result {
            Ok(_) => RunOutcome::Recorded,
            Err(EngineError::NoChainData) => RunOutcome::NoChainData,
            Err(e) if e.is_persistence_failure() => RunOutcome::PersistenceFailed,
            Err(_) => RunOutcome::Failed,
        };
        metrics.performance.record_run(outcome);
    }
}
