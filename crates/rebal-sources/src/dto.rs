use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rebal_types::ChainMetric;

use crate::error::SourceError;

/// Market state of a chain's lending pool, as served by its metrics endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChainMetricsDTO {
    #[serde(default, alias = "supply_apy")]
    pub apy: Option<Decimal>,
    #[serde(default, alias = "utilization_rate")]
    pub utilization: Option<Decimal>,
    #[serde(default, alias = "total_supply")]
    pub total_liquidity: Option<Decimal>,
}

impl ChainMetricsDTO {
    /// Convert to a metric with no allocation yet.
    pub fn into_metric(
        self,
        chain_name: &str,
        elasticity_factor: Decimal,
    ) -> Result<ChainMetric, SourceError> {
        let current_apy = self.apy.ok_or(SourceError::MissingField("apy"))?;
        let current_utilization = self
            .utilization
            .ok_or(SourceError::MissingField("utilization"))?;
        let total_liquidity = self
            .total_liquidity
            .ok_or(SourceError::MissingField("total_liquidity"))?;

        if current_apy < Decimal::ZERO {
            return Err(SourceError::InvalidValue {
                field: "apy",
                value: current_apy.to_string(),
            });
        }
        if total_liquidity < Decimal::ZERO {
            return Err(SourceError::InvalidValue {
                field: "total_liquidity",
                value: total_liquidity.to_string(),
            });
        }

        Ok(ChainMetric {
            chain_name: chain_name.to_string(),
            current_apy,
            current_utilization,
            total_liquidity,
            elasticity_factor,
            current_allocation: Decimal::ZERO,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NavLatestDTO {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, alias = "aum")]
    pub total_assets: Option<Decimal>,
}

impl NavLatestDTO {
    pub fn pool_value(&self) -> Result<Decimal, SourceError> {
        self.total_assets
            .ok_or(SourceError::MissingField("total_assets"))
    }
}
