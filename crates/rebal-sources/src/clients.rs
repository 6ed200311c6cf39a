use std::sync::LazyLock;
use std::time::Duration;

use moka::future::Cache;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use url::Url;

use rebal_engine::{ChainMetricSource, EngineError, TotalFundSizeOracle};
use rebal_types::ChainMetric;

use crate::config::ChainEndpoint;
use crate::dto::{ChainMetricsDTO, NavLatestDTO};
use crate::error::SourceError;

const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Raw payloads keyed by endpoint url, reused for a short while so retries of the
/// same day do not hammer the endpoints. Chain identity is applied after the cache
/// since several chains may share one endpoint.
static METRICS_CACHE: LazyLock<Cache<String, ChainMetricsDTO>> = LazyLock::new(|| {
    Cache::builder()
        .time_to_live(Duration::from_secs(60))
        .build()
});

pub fn http_client() -> Result<Client, SourceError> {
    Client::builder().timeout(HTTP_TIMEOUT).build().map_err(|e| {
        tracing::error!("Failed to build HTTP client: {}", e);
        SourceError::Http(e)
    })
}

async fn get_json<T: DeserializeOwned>(client: &Client, url: &Url) -> Result<T, SourceError> {
    let response = client.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Reads one chain's metrics from its HTTP endpoint.
pub struct HttpChainMetricSource {
    http_client: Client,
    endpoint: ChainEndpoint,
}

impl HttpChainMetricSource {
    pub const fn new(http_client: Client, endpoint: ChainEndpoint) -> Self {
        Self {
            http_client,
            endpoint,
        }
    }

    async fn fetch_payload(&self) -> Result<ChainMetricsDTO, SourceError> {
        let cache_key = self.endpoint.metrics_url.to_string();
        if let Some(cached) = METRICS_CACHE.get(&cache_key).await {
            return Ok(cached);
        }

        let dto: ChainMetricsDTO = get_json(&self.http_client, &self.endpoint.metrics_url).await?;
        METRICS_CACHE.insert(cache_key, dto.clone()).await;
        Ok(dto)
    }
}

#[async_trait::async_trait]
impl ChainMetricSource for HttpChainMetricSource {
    fn chain_name(&self) -> &str {
        &self.endpoint.name
    }

    async fn fetch(&self) -> Result<ChainMetric, EngineError> {
        let metric = self
            .fetch_payload()
            .await
            .and_then(|dto| dto.into_metric(&self.endpoint.name, self.endpoint.elasticity_factor))
            .map_err(|e| e.into_chain_error(&self.endpoint.name))?;

        tracing::debug!(
            chain = %metric.chain_name,
            apy = %metric.current_apy,
            utilization = %metric.current_utilization,
            liquidity = %metric.total_liquidity,
            "Fetched chain metrics"
        );
        Ok(metric)
    }
}

/// Current pool value from the fund's NAV endpoint.
pub struct HttpPoolValueOracle {
    http_client: Client,
    nav_url: Url,
}

impl HttpPoolValueOracle {
    pub fn new(http_client: Client, api_endpoint: &Url) -> Result<Self, SourceError> {
        let nav_url = nav_latest_url(api_endpoint)?;
        Ok(Self {
            http_client,
            nav_url,
        })
    }

    pub const fn nav_url(&self) -> &Url {
        &self.nav_url
    }
}

fn nav_latest_url(api_endpoint: &Url) -> Result<Url, SourceError> {
    // join() replaces the last segment unless the base ends with a slash
    let mut base = api_endpoint.clone();
    if !base.path().ends_with('/') {
        base.set_path(&format!("{}/", base.path()));
    }
    base.join("nav/latest")
        .map_err(|e| SourceError::Config(format!("invalid oracle url {api_endpoint}: {e}")))
}

#[async_trait::async_trait]
impl TotalFundSizeOracle for HttpPoolValueOracle {
    async fn current_pool_value(&self) -> Result<Decimal, EngineError> {
        let nav: NavLatestDTO = get_json(&self.http_client, &self.nav_url)
            .await
            .map_err(SourceError::into_oracle_error)?;
        nav.pool_value().map_err(SourceError::into_oracle_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    #[test]
    fn test_nav_url_handles_trailing_slash() {
        let with_slash = Url::parse("https://api.example.com/v1/").unwrap();
        let without_slash = Url::parse("https://api.example.com/v1").unwrap();

        assert_eq!(
            nav_latest_url(&with_slash).unwrap().as_str(),
            "https://api.example.com/v1/nav/latest"
        );
        assert_eq!(
            nav_latest_url(&without_slash).unwrap().as_str(),
            "https://api.example.com/v1/nav/latest"
        );
    }

    fn endpoint(name: &str, url: &str, elasticity_factor: Decimal) -> ChainEndpoint {
        ChainEndpoint {
            name: name.to_string(),
            metrics_url: Url::parse(url).unwrap(),
            elasticity_factor,
            baseline_allocation: None,
            enabled: true,
        }
    }

    #[test]
    fn test_source_reports_its_chain() {
        let source = HttpChainMetricSource::new(
            http_client().unwrap(),
            endpoint("base", "https://metrics.example.com/base", Decimal::ONE),
        );

        assert_eq!(source.chain_name(), "base");
    }

    #[tokio::test]
    async fn test_chains_sharing_an_endpoint_keep_their_identity() {
        let url = "https://metrics.example.com/shared-l2";
        METRICS_CACHE
            .insert(
                url.to_string(),
                ChainMetricsDTO {
                    apy: Some(dec!(5.5)),
                    utilization: Some(dec!(70)),
                    total_liquidity: Some(dec!(30_000_000)),
                },
            )
            .await;

        let client = http_client().unwrap();
        let optimism =
            HttpChainMetricSource::new(client.clone(), endpoint("optimism", url, dec!(0.1)));
        let mode = HttpChainMetricSource::new(client, endpoint("mode", url, dec!(0.3)));

        let optimism = optimism.fetch().await.unwrap();
        let mode = mode.fetch().await.unwrap();

        assert_eq!(optimism.chain_name, "optimism");
        assert_eq!(optimism.elasticity_factor, dec!(0.1));
        assert_eq!(mode.chain_name, "mode");
        assert_eq!(mode.elasticity_factor, dec!(0.3));
        assert_eq!(optimism.current_apy, mode.current_apy);
    }
}
