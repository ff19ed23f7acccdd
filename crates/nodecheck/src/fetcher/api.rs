use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DataKind, FetchFailure, FetchOutcome, FetchedData, Fetcher, http_failure, with_timeout};
use crate::address::NodeAddress;

/// Path of the node's index document on the API port.
pub const INDEX_PATH: &str = "/v1";

/// Basic node metadata reported by the REST API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiData {
    /// Chain identifier, compared as a string
    pub chain_id: String,

    /// Role reported by the node (e.g. full_node, validator)
    pub node_role: Option<String>,

    pub epoch: u64,

    pub ledger_version: u64,

    /// Timestamp of the latest ledger info, in microseconds since the epoch
    pub ledger_timestamp_usecs: u64,

    pub block_height: Option<u64>,

    /// Build identifier (git hash) of the node binary, if reported
    pub build_version: Option<String>,

    /// Round trip time of the request
    pub latency: Duration,
}

/// JSON values that nodes send either as numbers or as strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Number(number) => number.to_string(),
            Scalar::Text(text) => text,
        }
    }

    fn into_u64(self, field: &str) -> Result<u64, String> {
        match self {
            Scalar::Number(number) => {
                number.as_u64().ok_or_else(|| format!("{field} is not an unsigned integer: {number}"))
            }
            Scalar::Text(text) => text
                .parse()
                .map_err(|_| format!("{field} is not an unsigned integer: {text:?}")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IndexResponse {
    chain_id: Scalar,
    epoch: Scalar,
    ledger_version: Scalar,
    ledger_timestamp: Scalar,
    #[serde(default)]
    node_role: Option<String>,
    #[serde(default)]
    block_height: Option<Scalar>,
    #[serde(default)]
    git_hash: Option<String>,
}

/// Parse the index document returned at [`INDEX_PATH`].
pub fn parse_index(body: &[u8], latency: Duration) -> FetchOutcome<ApiData> {
    let parse_failure = |cause: String| FetchFailure::Parse { kind: DataKind::Api, cause };

    let index: IndexResponse =
        serde_json::from_slice(body).map_err(|e| parse_failure(e.to_string()))?;

    let block_height = match index.block_height {
        Some(height) => Some(height.into_u64("block_height").map_err(parse_failure)?),
        None => None,
    };

    Ok(ApiData {
        chain_id: index.chain_id.into_text(),
        node_role: index.node_role,
        epoch: index.epoch.into_u64("epoch").map_err(parse_failure)?,
        ledger_version: index.ledger_version.into_u64("ledger_version").map_err(parse_failure)?,
        ledger_timestamp_usecs: index
            .ledger_timestamp
            .into_u64("ledger_timestamp")
            .map_err(parse_failure)?,
        block_height,
        build_version: index.git_hash.filter(|hash| !hash.is_empty()),
        latency,
    })
}

/// Fetches the node's REST API index document.
pub struct ApiFetcher {
    client: reqwest::Client,
}

impl ApiFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch_index(&self, address: &NodeAddress, timeout: Duration) -> FetchOutcome<ApiData> {
        let url = address.api_url(INDEX_PATH);
        debug!("Fetching API index from {}", url);

        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| http_failure(DataKind::Api, timeout, e))?;
        let latency = start.elapsed();

        if !response.status().is_success() {
            return Err(FetchFailure::Http { kind: DataKind::Api, status: response.status().as_u16() });
        }

        let body = response.bytes().await.map_err(|e| http_failure(DataKind::Api, timeout, e))?;
        parse_index(&body, latency)
    }
}

#[async_trait::async_trait]
impl Fetcher for ApiFetcher {
    fn kind(&self) -> DataKind {
        DataKind::Api
    }

    async fn fetch(&self, address: &NodeAddress, timeout: Duration) -> FetchedData {
        FetchedData::Api(with_timeout(DataKind::Api, timeout, self.fetch_index(address, timeout)).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r#"{
        "chain_id": 4,
        "epoch": "12",
        "ledger_version": "184467",
        "oldest_ledger_version": "0",
        "ledger_timestamp": "1665436436180283",
        "node_role": "full_node",
        "oldest_block_height": "0",
        "block_height": "91234",
        "git_hash": "9ecf1eeb"
    }"#;

    #[test]
    fn test_parse_index() {
        let data = parse_index(INDEX.as_bytes(), Duration::from_millis(12)).unwrap();
        assert_eq!(data.chain_id, "4");
        assert_eq!(data.epoch, 12);
        assert_eq!(data.ledger_version, 184_467);
        assert_eq!(data.ledger_timestamp_usecs, 1_665_436_436_180_283);
        assert_eq!(data.node_role.as_deref(), Some("full_node"));
        assert_eq!(data.block_height, Some(91_234));
        assert_eq!(data.build_version.as_deref(), Some("9ecf1eeb"));
        assert_eq!(data.latency, Duration::from_millis(12));
    }

    #[test]
    fn test_parse_index_string_chain_id_and_optional_fields() {
        let body = r#"{"chain_id": "devnet", "epoch": 1, "ledger_version": 5, "ledger_timestamp": 10}"#;
        let data = parse_index(body.as_bytes(), Duration::ZERO).unwrap();
        assert_eq!(data.chain_id, "devnet");
        assert_eq!(data.node_role, None);
        assert_eq!(data.build_version, None);
        assert_eq!(data.block_height, None);
    }

    #[test]
    fn test_parse_index_rejects_bad_numbers() {
        let body = r#"{"chain_id": 4, "epoch": "x", "ledger_version": 5, "ledger_timestamp": 10}"#;
        let failure = parse_index(body.as_bytes(), Duration::ZERO).unwrap_err();
        assert!(matches!(failure, FetchFailure::Parse { kind: DataKind::Api, .. }));
        assert!(failure.to_string().contains("epoch"));
    }

    #[test]
    fn test_parse_index_rejects_non_json() {
        let failure = parse_index(b"<html>hello</html>", Duration::ZERO).unwrap_err();
        assert!(matches!(failure, FetchFailure::Parse { .. }));
    }
}
