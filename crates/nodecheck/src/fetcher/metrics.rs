use std::time::Duration;

use tracing::{debug, warn};

use super::exposition::{MetricsData, parse_exposition};
use super::{DataKind, FetchFailure, FetchOutcome, FetchedData, Fetcher, http_failure, with_timeout};
use crate::address::NodeAddress;

pub const METRICS_PATH: &str = "/metrics";

/// Scrapes the node's Prometheus endpoint.
pub struct MetricsFetcher {
    client: reqwest::Client,
}

impl MetricsFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn scrape(&self, address: &NodeAddress, timeout: Duration) -> FetchOutcome<MetricsData> {
        let url = address.metrics_url(METRICS_PATH);
        debug!("Scraping metrics from {}", url);

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| http_failure(DataKind::Metrics, timeout, e))?;

        if !response.status().is_success() {
            return Err(FetchFailure::Http {
                kind: DataKind::Metrics,
                status: response.status().as_u16(),
            });
        }

        let text = response.text().await.map_err(|e| http_failure(DataKind::Metrics, timeout, e))?;
        let data = parse_exposition(&text);

        if data.is_empty() {
            return Err(FetchFailure::Parse {
                kind: DataKind::Metrics,
                cause: format!("no samples found ({} malformed lines)", data.skipped_lines),
            });
        }
        if data.skipped_lines > 0 {
            warn!("Skipped {} malformed metrics lines", data.skipped_lines);
        }

        Ok(data)
    }
}

#[async_trait::async_trait]
impl Fetcher for MetricsFetcher {
    fn kind(&self) -> DataKind {
        DataKind::Metrics
    }

    async fn fetch(&self, address: &NodeAddress, timeout: Duration) -> FetchedData {
        FetchedData::Metrics(with_timeout(DataKind::Metrics, timeout, self.scrape(address, timeout)).await)
    }
}
