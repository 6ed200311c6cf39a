use std::time::Duration;

use rust_decimal::{Decimal, dec};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::error::EngineError;

/// How the optimizer's starting allocation is derived from the baseline.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Display,
    AsRefStr,
    EnumString,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum SeedPolicy {
    /// Start from the configured baseline amounts as-is.
    #[default]
    Fixed,
    /// Scale the baseline amounts so they sum to the fund size after the day's flows.
    ScaleToAvailableFunds,
}

/// Configuration for the pairwise reallocation search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizerConfig {
    pub move_amount: Decimal,
    pub max_iterations: usize,
    /// Minimum dollar gain in annualized pair return for a move to be committed.
    pub min_improvement: Decimal,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            move_amount: dec!(100_000),
            max_iterations: 10,
            min_improvement: Decimal::ONE,
        }
    }
}

/// Runtime configuration of the daily performance computation.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub optimizer: OptimizerConfig,
    /// Fund size used when the pool value oracle cannot be reached.
    pub fallback_fund_size: Decimal,
    pub seed_policy: SeedPolicy,
    pub chain_fetch_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            optimizer: OptimizerConfig::default(),
            fallback_fund_size: dec!(5_000_000),
            seed_policy: SeedPolicy::Fixed,
            chain_fetch_timeout: Duration::from_secs(10),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.optimizer.move_amount <= Decimal::ZERO {
            return Err(EngineError::InvalidConfig(
                "move amount must be positive".to_string(),
            ));
        }
        if self.optimizer.max_iterations == 0 {
            return Err(EngineError::InvalidConfig(
                "max iterations must be at least 1".to_string(),
            ));
        }
        if self.optimizer.min_improvement < Decimal::ZERO {
            return Err(EngineError::InvalidConfig(
                "minimum improvement cannot be negative".to_string(),
            ));
        }
        if self.fallback_fund_size < Decimal::ZERO {
            return Err(EngineError::InvalidConfig(
                "fallback fund size cannot be negative".to_string(),
            ));
        }
        if self.chain_fetch_timeout.is_zero() {
            return Err(EngineError::InvalidConfig(
                "chain fetch timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.optimizer.move_amount, dec!(100_000));
        assert_eq!(config.optimizer.max_iterations, 10);
        assert_eq!(config.optimizer.min_improvement, Decimal::ONE);
    }

    #[test]
    fn test_invalid_move_amount() {
        let mut config = EngineConfig::default();
        config.optimizer.move_amount = Decimal::ZERO;
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_seed_policy_parse() {
        assert_eq!(SeedPolicy::from_str("fixed").unwrap(), SeedPolicy::Fixed);
        assert_eq!(
            SeedPolicy::from_str("scale_to_available_funds").unwrap(),
            SeedPolicy::ScaleToAvailableFunds
        );
        assert_eq!(
            SeedPolicy::ScaleToAvailableFunds.to_string(),
            "scale_to_available_funds"
        );
    }
}
