use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::Parser;
use rust_decimal::Decimal;
use url::Url;

use rebal_engine::{EngineConfig, OptimizerConfig, SeedPolicy};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct RebalCli {
    /// Database URL, required unless running with --dry-run
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// OTEL collector endpoint
    #[arg(long, env = "OTEL_COLLECTOR_ENDPOINT")]
    pub otel_collector_endpoint: Option<String>,

    /// JSON file listing the chains to track
    #[arg(long, env = "CHAINS_CONFIG", default_value = "chains.json")]
    pub chains_config: PathBuf,

    /// Base URL of the pool NAV API
    #[arg(long, env = "POOL_VALUE_ORACLE_URL")]
    pub pool_value_oracle_url: Option<Url>,

    /// Fund size used when the pool value cannot be fetched
    #[arg(long, env = "FALLBACK_FUND_SIZE", default_value = "5000000")]
    pub fallback_fund_size: Decimal,

    /// Amount moved between two chains per optimizer step
    #[arg(long, env = "MOVE_AMOUNT", default_value = "100000")]
    pub move_amount: Decimal,

    /// Optimizer passes over all chain pairs
    #[arg(long, env = "MAX_ITERATIONS", default_value_t = 10)]
    pub max_iterations: usize,

    /// Minimum annual dollar gain for a move to be accepted
    #[arg(long, env = "MIN_IMPROVEMENT", default_value = "1")]
    pub min_improvement: Decimal,

    /// `fixed` or `scale_to_available_funds`
    #[arg(long, env = "SEED_POLICY", default_value = "fixed")]
    pub seed_policy: SeedPolicy,

    /// Per-chain metric fetch timeout
    #[arg(long, env = "CHAIN_FETCH_TIMEOUT_SECS", default_value_t = 10)]
    pub chain_fetch_timeout_secs: u64,

    /// Day to compute (YYYY-MM-DD), today in UTC when omitted
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Compute and print the record without touching the database
    #[arg(long)]
    pub dry_run: bool,

    /// Keep running and compute the current day every --run-interval-secs
    #[arg(long, conflicts_with_all = ["date", "dry_run"])]
    pub daemon: bool,

    #[arg(long, env = "RUN_INTERVAL_SECS", default_value_t = 24 * 60 * 60)]
    pub run_interval_secs: u64,

    /// Write the baseline amounts of the chain config to the database before running
    #[arg(long, conflicts_with = "dry_run")]
    pub sync_baseline: bool,
}

impl RebalCli {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            optimizer: OptimizerConfig {
                move_amount: self.move_amount,
                max_iterations: self.max_iterations,
                min_improvement: self.min_improvement,
            },
            fallback_fund_size: self.fallback_fund_size,
            seed_policy: self.seed_policy,
            chain_fetch_timeout: Duration::from_secs(self.chain_fetch_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    #[test]
    fn test_defaults_match_engine_defaults() {
        let cli = RebalCli::parse_from(["rebalance-tracker", "--dry-run"]);

        assert_eq!(cli.engine_config().optimizer, OptimizerConfig::default());
        assert_eq!(cli.fallback_fund_size, dec!(5_000_000));
        assert_eq!(cli.seed_policy, SeedPolicy::Fixed);
    }

    #[test]
    fn test_overrides() {
        let cli = RebalCli::parse_from([
            "rebalance-tracker",
            "--dry-run",
            "--seed-policy",
            "scale_to_available_funds",
            "--move-amount",
            "50000",
            "--date",
            "2024-09-01",
        ]);

        let config = cli.engine_config();
        assert_eq!(config.seed_policy, SeedPolicy::ScaleToAvailableFunds);
        assert_eq!(config.optimizer.move_amount, dec!(50_000));
        assert_eq!(cli.date, NaiveDate::from_ymd_opt(2024, 9, 1));
    }

    #[test]
    fn test_daemon_conflicts_with_date() {
        let parsed =
            RebalCli::try_parse_from(["rebalance-tracker", "--daemon", "--date", "2024-09-01"]);
        assert!(parsed.is_err());
    }
}
