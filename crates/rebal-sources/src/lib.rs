pub mod clients;
pub mod config;
pub mod dto;
pub mod error;

use std::sync::Arc;

use reqwest::Client;

use rebal_engine::ChainMetricSource;

pub use clients::{HttpChainMetricSource, HttpPoolValueOracle, http_client};
pub use config::{ChainEndpoint, ChainSourceConfig};
pub use error::SourceError;

/// One metric source per enabled chain, in configuration order.
pub fn chain_sources(
    config: &ChainSourceConfig,
    http_client: &Client,
) -> Vec<Arc<dyn ChainMetricSource>> {
    config
        .enabled_chains()
        .map(|endpoint| {
            Arc::new(HttpChainMetricSource::new(http_client.clone(), endpoint.clone()))
                as Arc<dyn ChainMetricSource>
        })
        .collect()
}
