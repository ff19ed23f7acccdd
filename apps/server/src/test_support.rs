//! Orchestrator wired to canned fetchers for route tests.

use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use async_trait::async_trait;
use nodecheck::fetcher::exposition::parse_exposition;
use nodecheck::fetcher::{ApiData, HandshakeData, PeerReaction};
use nodecheck::{BaselineRegistry, Clock, DataKind, FetchedData, Fetcher, FetcherSet, NodeAddress, Orchestrator};

use crate::state::AppState;

const NOW_USECS: u64 = 1_665_435_600_000_000;

pub const DEVNET: &str = r#"
name = "devnet_fullnode"
pretty_name = "Devnet FullNode"
expected_chain_id = "devnet"

[[evaluators]]
type = "node_identity"

[[evaluators]]
type = "state_sync"

[[evaluators]]
type = "network_peers"

[[evaluators]]
type = "handshake"
"#;

struct FixedClock;

impl Clock for FixedClock {
    fn now_usecs(&self) -> u64 {
        NOW_USECS
    }
}

struct Canned(FetchedData);

#[async_trait]
impl Fetcher for Canned {
    fn kind(&self) -> DataKind {
        self.0.kind()
    }

    async fn fetch(&self, _address: &NodeAddress, _timeout: Duration) -> FetchedData {
        self.0.clone()
    }
}

fn fetchers() -> FetcherSet {
    let api = ApiData {
        chain_id: "devnet".to_string(),
        node_role: Some("full_node".to_string()),
        epoch: 2,
        ledger_version: 88_000,
        ledger_timestamp_usecs: NOW_USECS - 1_000_000,
        block_height: None,
        build_version: None,
        latency: Duration::from_millis(20),
    };
    let handshake = HandshakeData {
        remote: "10.0.0.7:6180".parse().unwrap(),
        latency: Duration::from_millis(4),
        reaction: PeerReaction::Silent,
    };

    FetcherSet {
        api: Arc::new(Canned(FetchedData::Api(Ok(api)))),
        metrics: Arc::new(Canned(FetchedData::Metrics(Ok(parse_exposition("aptos_connections 6\n"))))),
        handshake: Arc::new(Canned(FetchedData::Handshake(Ok(handshake)))),
    }
}

pub fn state(preconfigured_node: Option<NodeAddress>) -> web::Data<AppState> {
    let mut registry = BaselineRegistry::new();
    registry.register(toml::from_str(DEVNET).unwrap()).unwrap();

    let orchestrator = Orchestrator::new(Arc::new(registry), fetchers()).with_clock(Arc::new(FixedClock));
    web::Data::new(AppState::new(orchestrator, preconfigured_node))
}
