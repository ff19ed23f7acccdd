//! Data fetchers - retrieve one kind of diagnostic data from a node
//!
//! Every fetcher:
//! - Takes a node address and a timeout
//! - Always returns exactly one [`FetchedData`] outcome
//! - Captures every failure (timeout, connection, parse) as a typed value
pub mod api;
pub mod exposition;
pub mod handshake;
pub mod metrics;
mod node_data;

pub use api::{ApiData, ApiFetcher};
pub use exposition::{MetricKey, MetricSelector, MetricsData};
pub use handshake::{HandshakeData, HandshakeFetcher, PeerReaction};
pub use metrics::MetricsFetcher;
pub use node_data::NodeData;

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::NodeAddress;

/// The categories of data a node can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    Api,
    Metrics,
    Handshake,
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataKind::Api => write!(f, "API"),
            DataKind::Metrics => write!(f, "metrics"),
            DataKind::Handshake => write!(f, "handshake"),
        }
    }
}

/// A failed fetch. Always recoverable; surfaced inside evaluator explanations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("{kind} request timed out after {}ms", after.as_millis())]
    Timeout { kind: DataKind, after: Duration },

    #[error("{kind} connection failed: {cause}")]
    Connection { kind: DataKind, cause: String },

    #[error("{kind} endpoint answered with HTTP status {status}")]
    Http { kind: DataKind, status: u16 },

    #[error("{kind} response could not be parsed: {cause}")]
    Parse { kind: DataKind, cause: String },
}

pub type FetchOutcome<T> = Result<T, FetchFailure>;

/// Outcome of one fetch attempt, tagged by the kind of data it carries.
#[derive(Debug, Clone)]
pub enum FetchedData {
    Api(FetchOutcome<ApiData>),
    Metrics(FetchOutcome<MetricsData>),
    Handshake(FetchOutcome<HandshakeData>),
}

impl FetchedData {
    pub fn kind(&self) -> DataKind {
        match self {
            FetchedData::Api(_) => DataKind::Api,
            FetchedData::Metrics(_) => DataKind::Metrics,
            FetchedData::Handshake(_) => DataKind::Handshake,
        }
    }

    pub fn failure(&self) -> Option<&FetchFailure> {
        match self {
            FetchedData::Api(outcome) => outcome.as_ref().err(),
            FetchedData::Metrics(outcome) => outcome.as_ref().err(),
            FetchedData::Handshake(outcome) => outcome.as_ref().err(),
        }
    }

    /// A typed failure for `kind`, used when a fetch is cut short from outside.
    pub fn failed(kind: DataKind, failure: FetchFailure) -> Self {
        match kind {
            DataKind::Api => FetchedData::Api(Err(failure)),
            DataKind::Metrics => FetchedData::Metrics(Err(failure)),
            DataKind::Handshake => FetchedData::Handshake(Err(failure)),
        }
    }
}

/// Fetcher trait, one implementation per [`DataKind`]
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    fn kind(&self) -> DataKind;

    /// Fetch from `address`, giving up after `timeout`. Never fails past this boundary.
    async fn fetch(&self, address: &NodeAddress, timeout: Duration) -> FetchedData;
}

/// Run `fetch`, turning an elapsed `timeout` into [`FetchFailure::Timeout`].
pub async fn with_timeout<T, F>(kind: DataKind, timeout: Duration, fetch: F) -> FetchOutcome<T>
where
    F: Future<Output = FetchOutcome<T>>,
{
    match tokio::time::timeout(timeout, fetch).await {
        Ok(outcome) => outcome,
        Err(_) => Err(FetchFailure::Timeout { kind, after: timeout }),
    }
}

/// Map a reqwest error into the matching failure variant.
pub(crate) fn http_failure(kind: DataKind, timeout: Duration, error: reqwest::Error) -> FetchFailure {
    if error.is_timeout() {
        FetchFailure::Timeout { kind, after: timeout }
    } else if let Some(status) = error.status() {
        FetchFailure::Http { kind, status: status.as_u16() }
    } else if error.is_decode() || error.is_body() {
        FetchFailure::Parse { kind, cause: error.to_string() }
    } else {
        FetchFailure::Connection { kind, cause: error.to_string() }
    }
}

/// The set of fetchers the orchestrator drives, one per kind.
#[derive(Clone)]
pub struct FetcherSet {
    pub api: Arc<dyn Fetcher>,
    pub metrics: Arc<dyn Fetcher>,
    pub handshake: Arc<dyn Fetcher>,
}

impl FetcherSet {
    /// Network backed fetchers sharing one HTTP client.
    pub fn network() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            api: Arc::new(ApiFetcher::new(client.clone())),
            metrics: Arc::new(MetricsFetcher::new(client)),
            handshake: Arc::new(HandshakeFetcher::default()),
        })
    }

    pub fn get(&self, kind: DataKind) -> &Arc<dyn Fetcher> {
        match kind {
            DataKind::Api => &self.api,
            DataKind::Metrics => &self.metrics,
            DataKind::Handshake => &self.handshake,
        }
    }
}

pub const USER_AGENT: &str = concat!("nodecheck/", env!("CARGO_PKG_VERSION"));
