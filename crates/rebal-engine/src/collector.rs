use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use rebal_types::ChainMetric;

use crate::traits::{ChainDataProvider, ChainMetricSource};

/// Queries every chain concurrently, each under its own timeout.
///
/// A failing or slow chain is logged and dropped; the others are returned in the
/// order the sources were configured.
pub struct FanOutChainDataProvider {
    sources: Vec<Arc<dyn ChainMetricSource>>,
    timeout: Duration,
}

impl FanOutChainDataProvider {
    pub fn new(sources: Vec<Arc<dyn ChainMetricSource>>, timeout: Duration) -> Self {
        Self { sources, timeout }
    }

    pub fn chain_names(&self) -> Vec<String> {
        self.sources
            .iter()
            .map(|source| source.chain_name().to_string())
            .collect()
    }
}

#[async_trait::async_trait]
impl ChainDataProvider for FanOutChainDataProvider {
    async fn fetch_all(&self) -> Vec<ChainMetric> {
        let timeout = self.timeout;
        let fetch_results = join_all(self.sources.iter().map(|source| async move {
            let result = tokio::time::timeout(timeout, source.fetch()).await;
            (source.chain_name(), result)
        }))
        .await;

        let mut metrics = Vec::with_capacity(fetch_results.len());
        for (chain_name, result) in fetch_results {
            match result {
                Ok(Ok(metric)) => metrics.push(metric),
                Ok(Err(e)) => {
                    tracing::warn!(chain = %chain_name, error = %e, "Excluding chain: metric fetch failed");
                }
                Err(_) => {
                    tracing::warn!(
                        chain = %chain_name,
                        timeout_ms = timeout.as_millis() as u64,
                        "Excluding chain: metric fetch timed out"
                    );
                }
            }
        }

        metrics
    }
}
