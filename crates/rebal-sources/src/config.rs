use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::SourceError;

/// Where and how to read one chain's lending metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEndpoint {
    pub name: String,
    pub metrics_url: Url,
    /// APY points per 1% utilization change, configured per chain.
    pub elasticity_factor: Decimal,
    /// Baseline amount kept on this chain when nothing is rebalanced.
    #[serde(default)]
    pub baseline_allocation: Option<Decimal>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

const fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSourceConfig {
    pub chains: Vec<ChainEndpoint>,
}

impl ChainSourceConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, SourceError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SourceError> {
        let mut names = HashSet::with_capacity(self.chains.len());
        for chain in &self.chains {
            if chain.name.trim().is_empty() {
                return Err(SourceError::Config("chain name cannot be empty".to_string()));
            }
            if !names.insert(chain.name.as_str()) {
                return Err(SourceError::Config(format!(
                    "chain {} is configured more than once",
                    chain.name
                )));
            }
            if chain
                .baseline_allocation
                .is_some_and(|amount| amount < Decimal::ZERO)
            {
                return Err(SourceError::Config(format!(
                    "baseline allocation of {} cannot be negative",
                    chain.name
                )));
            }
        }

        if !self.chains.iter().any(|chain| chain.enabled) {
            return Err(SourceError::Config("no enabled chain configured".to_string()));
        }
        Ok(())
    }

    pub fn enabled_chains(&self) -> impl Iterator<Item = &ChainEndpoint> {
        self.chains.iter().filter(|chain| chain.enabled)
    }

    /// Baseline amounts of the enabled chains that declare one.
    pub fn baseline_allocations(&self) -> Vec<(String, Decimal)> {
        self.enabled_chains()
            .filter_map(|chain| {
                chain
                    .baseline_allocation
                    .map(|amount| (chain.name.clone(), amount))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    const CONFIG: &str = r#"{
        "chains": [
            {
                "name": "ethereum",
                "metrics_url": "https://metrics.example.com/ethereum",
                "elasticity_factor": "0.1",
                "baseline_allocation": "3000000"
            },
            {
                "name": "arbitrum",
                "metrics_url": "https://metrics.example.com/arbitrum",
                "elasticity_factor": 0.2,
                "baseline_allocation": "2000000"
            },
            {
                "name": "polygon",
                "metrics_url": "https://metrics.example.com/polygon",
                "elasticity_factor": "0.15",
                "enabled": false
            }
        ]
    }"#;

    #[test]
    fn test_parse_config() {
        let config = ChainSourceConfig::from_json(CONFIG).unwrap();

        assert_eq!(config.chains.len(), 3);
        assert_eq!(config.enabled_chains().count(), 2);
        assert_eq!(
            config.baseline_allocations(),
            vec![
                ("ethereum".to_string(), dec!(3_000_000)),
                ("arbitrum".to_string(), dec!(2_000_000)),
            ]
        );
        assert_eq!(config.chains[1].elasticity_factor, dec!(0.2));
    }

    #[test]
    fn test_duplicate_chain_is_rejected() {
        let raw = r#"{"chains": [
            {"name": "base", "metrics_url": "https://a.example.com", "elasticity_factor": "0.1"},
            {"name": "base", "metrics_url": "https://b.example.com", "elasticity_factor": "0.1"}
        ]}"#;

        assert!(matches!(
            ChainSourceConfig::from_json(raw),
            Err(SourceError::Config(_))
        ));
    }

    #[test]
    fn test_all_disabled_is_rejected() {
        let raw = r#"{"chains": [
            {"name": "base", "metrics_url": "https://a.example.com", "elasticity_factor": "0.1", "enabled": false}
        ]}"#;

        assert!(ChainSourceConfig::from_json(raw).is_err());
    }

    #[test]
    fn test_bad_url_is_rejected() {
        let raw = r#"{"chains": [
            {"name": "base", "metrics_url": "not a url", "elasticity_factor": "0.1"}
        ]}"#;

        assert!(matches!(
            ChainSourceConfig::from_json(raw),
            Err(SourceError::Json(_))
        ));
    }
}
