//! Integration tests for the evaluation pipeline
//!
//! Fetchers are replaced with canned stubs so every scenario is deterministic.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use nodecheck::fetcher::exposition::parse_exposition;
use nodecheck::fetcher::{ApiData, HandshakeData, PeerReaction};
use nodecheck::{
    BaselineConfiguration, BaselineError, BaselineRegistry, Clock, DataKind, EvaluationError, FetchFailure,
    FetchedData, Fetcher, FetcherSet, NodeAddress, Orchestrator, PortOverrides, WorstScore,
};

const NOW_USECS: u64 = 1_665_435_600_000_000;
const SECOND: u64 = 1_000_000;

const DEVNET: &str = r#"
name = "devnet_fullnode"
pretty_name = "Devnet FullNode"
expected_chain_id = "devnet"
expected_role_type = "full_node"

[[evaluators]]
type = "node_identity"

[[evaluators]]
type = "state_sync"

[[evaluators]]
type = "metrics_presence"
required_metrics = ["aptos_connections", 'aptos_state_sync_version{type="synced"}']

[[evaluators]]
type = "handshake"
"#;

const HEALTHY_METRICS: &str = r#"
# TYPE aptos_connections gauge
aptos_connections{direction="outbound",network_id="Public"} 4
aptos_state_sync_version{type="synced"} 120345
"#;

struct FixedClock(u64);

impl Clock for FixedClock {
    fn now_usecs(&self) -> u64 {
        self.0
    }
}

/// Replies with canned data after `delay`, honouring the timeout unless told not to.
struct StubFetcher {
    data: FetchedData,
    delay: Duration,
    honour_timeout: bool,
    calls: AtomicUsize,
}

impl StubFetcher {
    fn new(data: FetchedData) -> Self {
        Self { data, delay: Duration::ZERO, honour_timeout: true, calls: AtomicUsize::new(0) }
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn hanging(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self.honour_timeout = false;
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    fn kind(&self) -> DataKind {
        self.data.kind()
    }

    async fn fetch(&self, _address: &NodeAddress, timeout: Duration) -> FetchedData {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.honour_timeout {
            tokio::time::sleep(self.delay).await;
            return self.data.clone();
        }

        match tokio::time::timeout(timeout, tokio::time::sleep(self.delay)).await {
            Ok(()) => self.data.clone(),
            Err(_) => FetchedData::failed(self.kind(), FetchFailure::Timeout { kind: self.kind(), after: timeout }),
        }
    }
}

fn api(chain_id: &str) -> ApiData {
    ApiData {
        chain_id: chain_id.to_string(),
        node_role: Some("full_node".to_string()),
        epoch: 7,
        ledger_version: 120_345,
        ledger_timestamp_usecs: NOW_USECS - 5 * SECOND,
        block_height: Some(40_115),
        build_version: Some("9ecf1eeb".to_string()),
        latency: Duration::from_millis(30),
    }
}

fn handshake() -> HandshakeData {
    HandshakeData {
        remote: "127.0.0.1:6180".parse().unwrap(),
        latency: Duration::from_millis(3),
        reaction: PeerReaction::Closed,
    }
}

struct Stubs {
    api: Arc<StubFetcher>,
    metrics: Arc<StubFetcher>,
    handshake: Arc<StubFetcher>,
}

impl Stubs {
    fn healthy(chain_id: &str) -> Self {
        Self {
            api: Arc::new(StubFetcher::new(FetchedData::Api(Ok(api(chain_id))))),
            metrics: Arc::new(StubFetcher::new(FetchedData::Metrics(Ok(parse_exposition(HEALTHY_METRICS))))),
            handshake: Arc::new(StubFetcher::new(FetchedData::Handshake(Ok(handshake())))),
        }
    }

    fn fetchers(&self) -> FetcherSet {
        FetcherSet {
            api: self.api.clone(),
            metrics: self.metrics.clone(),
            handshake: self.handshake.clone(),
        }
    }
}

fn registry(documents: &[&str]) -> Arc<BaselineRegistry> {
    let mut registry = BaselineRegistry::new();
    for document in documents {
        let configuration: BaselineConfiguration = toml::from_str(document).unwrap();
        registry.register(configuration).unwrap();
    }
    Arc::new(registry)
}

fn orchestrator(documents: &[&str], stubs: &Stubs) -> Orchestrator {
    Orchestrator::new(registry(documents), stubs.fetchers()).with_clock(Arc::new(FixedClock(NOW_USECS)))
}

fn target() -> NodeAddress {
    NodeAddress::parse("node.example.com").unwrap()
}

#[tokio::test]
async fn test_healthy_node_scores_full_marks() {
    let _ = tracing_subscriber::fmt::try_init();

    let stubs = Stubs::healthy("devnet");
    let summary = orchestrator(&[DEVNET], &stubs)
        .evaluate(&target(), Some("devnet_fullnode"), PortOverrides::default())
        .await
        .unwrap();

    assert_eq!(summary.evaluation_results.len(), 4);
    assert!(summary.evaluation_results.iter().all(|result| result.score == 100), "{summary:?}");
    assert_eq!(summary.summary_score, 100);
}

#[tokio::test]
async fn test_results_follow_declared_order() {
    let stubs = Stubs::healthy("devnet");
    let summary = orchestrator(&[DEVNET], &stubs)
        .evaluate(&target(), Some("devnet_fullnode"), PortOverrides::default())
        .await
        .unwrap();

    let sources: Vec<_> = summary.evaluation_results.iter().map(|result| result.source.as_str()).collect();
    assert_eq!(sources, ["node_identity", "state_sync", "metrics_presence", "handshake"]);
}

#[tokio::test]
async fn test_slow_metrics_degrade_only_metrics_evaluators() {
    let _ = tracing_subscriber::fmt::try_init();

    let document = format!("{DEVNET}\n[timeouts]\nmetrics_ms = 50\n");
    let mut stubs = Stubs::healthy("devnet");
    stubs.metrics = Arc::new(
        StubFetcher::new(FetchedData::Metrics(Ok(parse_exposition(HEALTHY_METRICS))))
            .delayed(Duration::from_millis(500)),
    );

    let summary = orchestrator(&[&document], &stubs)
        .evaluate(&target(), Some("devnet_fullnode"), PortOverrides::default())
        .await
        .unwrap();

    assert_eq!(summary.evaluation_results.len(), 4, "every evaluator reports even without its data");
    let metrics = &summary.evaluation_results[2];
    assert_eq!(metrics.source, "metrics_presence");
    assert_eq!(metrics.score, 0);
    assert!(metrics.explanation.contains("timed out after 50ms"), "{}", metrics.explanation);

    for index in [0, 1, 3] {
        assert_eq!(summary.evaluation_results[index].score, 100, "{:?}", summary.evaluation_results[index]);
    }
    assert_eq!(summary.summary_score, 75);
}

#[tokio::test]
async fn test_inferred_baseline_reuses_api_fetch() {
    let stubs = Stubs::healthy("devnet");
    let summary = orchestrator(&[DEVNET], &stubs)
        .evaluate(&target(), None, PortOverrides::default())
        .await
        .unwrap();

    assert_eq!(summary.summary_score, 100);
    assert_eq!(stubs.api.calls(), 1);
    assert_eq!(stubs.metrics.calls(), 1);
    assert_eq!(stubs.handshake.calls(), 1);
}

#[tokio::test]
async fn test_inference_without_matching_baseline() {
    let stubs = Stubs::healthy("testnet");
    let result = orchestrator(&[DEVNET], &stubs).evaluate(&target(), None, PortOverrides::default()).await;

    match result {
        Err(EvaluationError::BaselineResolutionFailed(BaselineError::NoBaselineMatched { chain_id })) => {
            assert_eq!(chain_id, "testnet");
        }
        other => panic!("expected NoBaselineMatched, got {other:?}"),
    }
    assert_eq!(stubs.metrics.calls(), 0, "nothing else is fetched once resolution fails");
}

#[tokio::test]
async fn test_inference_with_unreachable_api() {
    let mut stubs = Stubs::healthy("devnet");
    stubs.api = Arc::new(StubFetcher::new(FetchedData::failed(
        DataKind::Api,
        FetchFailure::Connection { kind: DataKind::Api, cause: "connection refused".to_string() },
    )));

    let result = orchestrator(&[DEVNET], &stubs).evaluate(&target(), None, PortOverrides::default()).await;
    assert!(matches!(
        result,
        Err(EvaluationError::BaselineResolutionFailed(BaselineError::InsufficientDataForInference(_)))
    ));
}

#[tokio::test]
async fn test_unknown_baseline_name() {
    let stubs = Stubs::healthy("devnet");
    let result = orchestrator(&[DEVNET], &stubs)
        .evaluate(&target(), Some("mainnet_validator"), PortOverrides::default())
        .await;

    assert!(matches!(
        result,
        Err(EvaluationError::BaselineResolutionFailed(BaselineError::NotFound(name))) if name == "mainnet_validator"
    ));
    assert_eq!(stubs.api.calls(), 0);
}

#[tokio::test]
async fn test_repeated_evaluations_are_identical() {
    let stubs = Stubs::healthy("devnet");
    let orchestrator = orchestrator(&[DEVNET], &stubs);

    let first = orchestrator
        .evaluate(&target(), Some("devnet_fullnode"), PortOverrides::default())
        .await
        .unwrap();
    let second = orchestrator
        .evaluate(&target(), Some("devnet_fullnode"), PortOverrides::default())
        .await
        .unwrap();

    assert_eq!(serde_json::to_string(&first).unwrap(), serde_json::to_string(&second).unwrap());
}

#[tokio::test]
async fn test_baseline_node_is_fetched_for_state_sync() {
    let document = format!("{DEVNET}\n[baseline_node]\nurl = \"http://baseline.example.com\"\n");
    let stubs = Stubs::healthy("devnet");

    let summary = orchestrator(&[&document], &stubs)
        .evaluate(&target(), Some("devnet_fullnode"), PortOverrides::default())
        .await
        .unwrap();

    assert_eq!(stubs.api.calls(), 2, "target and baseline node");
    let state_sync = &summary.evaluation_results[1];
    assert!(state_sync.explanation.contains("of the baseline node"), "{}", state_sync.explanation);
}

#[tokio::test]
async fn test_custom_aggregator() {
    let mut stubs = Stubs::healthy("devnet");
    stubs.handshake = Arc::new(StubFetcher::new(FetchedData::failed(
        DataKind::Handshake,
        FetchFailure::Connection { kind: DataKind::Handshake, cause: "connection refused".to_string() },
    )));

    let summary = orchestrator(&[DEVNET], &stubs)
        .with_aggregator(Arc::new(WorstScore))
        .evaluate(&target(), Some("devnet_fullnode"), PortOverrides::default())
        .await
        .unwrap();

    assert_eq!(summary.summary_score, 0);
    assert_eq!(summary.evaluation_results[3].headline, "Noise handshake failed");
}

#[tokio::test]
async fn test_outer_deadline() {
    let document = format!("{DEVNET}\n[timeouts]\napi_ms = 10\nmetrics_ms = 10\nhandshake_ms = 10\n");
    let mut stubs = Stubs::healthy("devnet");
    stubs.metrics = Arc::new(
        StubFetcher::new(FetchedData::Metrics(Ok(parse_exposition(HEALTHY_METRICS))))
            .hanging(Duration::from_secs(10)),
    );

    let result = orchestrator(&[&document], &stubs)
        .evaluate(&target(), Some("devnet_fullnode"), PortOverrides::default())
        .await;

    match result {
        Err(EvaluationError::Timeout(after)) => assert_eq!(after, Duration::from_millis(2010)),
        other => panic!("expected a timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_deadline_covers_baseline_inference() {
    let _ = tracing_subscriber::fmt::try_init();

    let document = format!("{DEVNET}\n[timeouts]\napi_ms = 3000\nmetrics_ms = 3000\nhandshake_ms = 3000\n");
    let mut stubs = Stubs::healthy("devnet");
    // Each fetch alone fits its own timeout; together they overrun the deadline.
    stubs.api = Arc::new(StubFetcher::new(FetchedData::Api(Ok(api("devnet")))).delayed(Duration::from_millis(2900)));
    stubs.metrics = Arc::new(
        StubFetcher::new(FetchedData::Metrics(Ok(parse_exposition(HEALTHY_METRICS))))
            .delayed(Duration::from_millis(2900)),
    );

    let started = tokio::time::Instant::now();
    let result = orchestrator(&[&document], &stubs)
        .with_inference_timeout(Duration::from_millis(3000))
        .evaluate(&target(), None, PortOverrides::default())
        .await;

    match result {
        Err(EvaluationError::Timeout(after)) => assert_eq!(after, Duration::from_millis(5000)),
        other => panic!("expected a timeout, got {other:?}"),
    }
    assert!(started.elapsed() < Duration::from_millis(5500), "deadline counts from the start of the evaluation");
    assert_eq!(stubs.api.calls(), 1, "inference fetch should not be repeated");
}
