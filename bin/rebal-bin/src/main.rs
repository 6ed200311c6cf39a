mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Parser;
use dotenvy::dotenv;
use pragma_common::services::Service;
use pragma_common::telemetry::init_telemetry;

use rebal_db::{
    PgBaselineAllocations, PgFundFlowStore, PgPerformanceStore, init_pool, run_migrations,
};
use rebal_engine::memory::{
    FixedFundSizeOracle, InMemoryFundFlowStore, InMemoryPerformanceStore,
    StaticBaselineAllocation,
};
use rebal_engine::{
    ChainDataProvider, Collaborators, FanOutChainDataProvider, PerformanceService,
    PerformanceTask, TotalFundSizeOracle,
};
use rebal_metrics::MetricsRegistry;
use rebal_sources::{ChainSourceConfig, HttpPoolValueOracle, chain_sources, http_client};

use crate::cli::RebalCli;

const APP_NAME: &str = "rebalance_tracker";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let cli = RebalCli::parse();

    if let Err(e) = init_telemetry(APP_NAME, cli.otel_collector_endpoint.clone()) {
        bail!("Could not init telemetry: {e}");
    }

    let config = cli.engine_config();
    let chains = ChainSourceConfig::from_file(&cli.chains_config).with_context(|| {
        format!(
            "Failed to load chain configuration from {}",
            cli.chains_config.display()
        )
    })?;

    let http = http_client().context("Failed to build HTTP client")?;
    let chain_data: Arc<dyn ChainDataProvider> = Arc::new(FanOutChainDataProvider::new(
        chain_sources(&chains, &http),
        config.chain_fetch_timeout,
    ));

    let fund_size_oracle: Arc<dyn TotalFundSizeOracle> = match &cli.pool_value_oracle_url {
        Some(url) => Arc::new(
            HttpPoolValueOracle::new(http.clone(), url).context("Invalid pool value oracle url")?,
        ),
        None => {
            tracing::warn!(
                fallback = %config.fallback_fund_size,
                "No pool value oracle configured, using the fallback fund size"
            );
            Arc::new(FixedFundSizeOracle(config.fallback_fund_size))
        }
    };

    let collaborators = if cli.dry_run {
        Collaborators {
            chain_data,
            fund_flows: Arc::new(InMemoryFundFlowStore::new()),
            fund_size_oracle,
            baseline: Arc::new(StaticBaselineAllocation::constant(
                chains.baseline_allocations(),
            )),
            store: Arc::new(InMemoryPerformanceStore::new()),
        }
    } else {
        let database_url = cli
            .database_url
            .as_deref()
            .context("DATABASE_URL is required unless --dry-run is set")?;
        let pool = init_pool(APP_NAME, database_url)?;
        run_migrations(&pool).await?;

        let baseline = PgBaselineAllocations::new(pool.clone());
        if cli.sync_baseline {
            let effective_from = cli.date.unwrap_or_else(|| Utc::now().date_naive());
            for (chain_name, amount) in chains.baseline_allocations() {
                baseline
                    .set_allocation(&chain_name, effective_from, amount)
                    .await?;
            }
            tracing::info!("Baseline allocation synced, effective from {effective_from}");
        }

        Collaborators {
            chain_data,
            fund_flows: Arc::new(PgFundFlowStore::new(pool.clone())),
            fund_size_oracle,
            baseline: Arc::new(baseline),
            store: Arc::new(PgPerformanceStore::new(pool)),
        }
    };

    let service =
        PerformanceService::new(collaborators, config)?.with_metrics(MetricsRegistry::new());

    if cli.daemon {
        let task = PerformanceTask::new(
            Arc::new(service),
            Duration::from_secs(cli.run_interval_secs),
        );
        task.start_and_drive_to_end().await?;
        return Ok(());
    }

    let date = cli.date.unwrap_or_else(|| Utc::now().date_naive());
    if cli.dry_run {
        let record = service.preview_for_date(date).await?;
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        let record = service.run_for_date(date).await?;
        tracing::info!(
            date = %record.date,
            differential = %record.differential,
            differential_pct = %record.differential_percentage,
            "Daily performance recorded"
        );
    }

    Ok(())
}
