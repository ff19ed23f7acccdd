//! Evaluators - each scores one health dimension of a node
//!
//! An evaluator declares which kinds of fetched data it reads. The orchestrator
//! calls [`Evaluator::evaluate`] when at least one of those kinds was fetched
//! successfully and [`Evaluator::on_data_unavailable`] otherwise. Both are
//! total: an evaluator never fails, it scores low and explains why.
//!
//! Adding an evaluator means adding a module, a variant to [`EvaluatorConfig`]
//! and a line in [`EvaluatorConfig::build`]. The orchestrator is untouched.
pub mod api_latency;
pub mod build_version;
pub mod handshake;
pub mod metrics_presence;
pub mod network_peers;
pub mod node_identity;
pub mod state_sync;
mod types;

pub use api_latency::{ApiLatencyArgs, ApiLatencyEvaluator};
pub use build_version::{BuildVersionArgs, BuildVersionEvaluator};
pub use handshake::{HandshakeArgs, HandshakeEvaluator};
pub use metrics_presence::{MetricsPresenceArgs, MetricsPresenceEvaluator};
pub use network_peers::{NetworkPeersArgs, NetworkPeersEvaluator};
pub use node_identity::{NodeIdentityArgs, NodeIdentityEvaluator};
pub use state_sync::{StateSyncArgs, StateSyncEvaluator};
pub use types::{EvaluationInput, EvaluationResult};

use serde::{Deserialize, Serialize};

use crate::baseline::BaselineConfiguration;
use crate::fetcher::{DataKind, FetchFailure};

/// Evaluator trait for the different health dimensions
pub trait Evaluator: Send + Sync {
    /// Name of the evaluator, reported as `source` in its results
    fn name(&self) -> &'static str;

    /// Kinds of target data this evaluator reads
    fn required_data(&self) -> &'static [DataKind];

    /// Whether the evaluator compares against the baseline node's API data
    fn uses_baseline_api(&self) -> bool {
        false
    }

    /// Links attached to results that score below 100
    fn help_links(&self) -> &[String] {
        &[]
    }

    /// Score the node. Called when at least one required kind is available.
    fn evaluate(&self, input: &EvaluationInput<'_>) -> EvaluationResult;

    /// Called instead of `evaluate` when none of the required data could be
    /// fetched. Returning `None` skips the evaluator for this request.
    fn on_data_unavailable(&self, failures: &[&FetchFailure]) -> Option<EvaluationResult> {
        Some(EvaluationResult::data_unavailable(self.name(), failures).with_links(self.help_links()))
    }
}

/// One entry of a baseline's evaluator list, tagged by evaluator kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EvaluatorConfig {
    MetricsPresence(MetricsPresenceArgs),
    StateSync(StateSyncArgs),
    BuildVersion(BuildVersionArgs),
    Handshake(HandshakeArgs),
    NodeIdentity(NodeIdentityArgs),
    ApiLatency(ApiLatencyArgs),
    NetworkPeers(NetworkPeersArgs),
}

impl EvaluatorConfig {
    pub fn name(&self) -> &'static str {
        match self {
            EvaluatorConfig::MetricsPresence(_) => metrics_presence::NAME,
            EvaluatorConfig::StateSync(_) => state_sync::NAME,
            EvaluatorConfig::BuildVersion(_) => build_version::NAME,
            EvaluatorConfig::Handshake(_) => handshake::NAME,
            EvaluatorConfig::NodeIdentity(_) => node_identity::NAME,
            EvaluatorConfig::ApiLatency(_) => api_latency::NAME,
            EvaluatorConfig::NetworkPeers(_) => network_peers::NAME,
        }
    }

    /// Validate the parameters and build the evaluator.
    pub fn build(&self, baseline: &BaselineConfiguration) -> Result<Box<dyn Evaluator>, String> {
        let evaluator: Box<dyn Evaluator> = match self {
            EvaluatorConfig::MetricsPresence(args) => Box::new(MetricsPresenceEvaluator::new(args.clone())),
            EvaluatorConfig::StateSync(args) => Box::new(StateSyncEvaluator::new(args.clone())?),
            EvaluatorConfig::BuildVersion(args) => Box::new(BuildVersionEvaluator::new(
                args.clone(),
                baseline.expected_build_version.as_deref(),
                baseline.baseline_node.is_some(),
            )?),
            EvaluatorConfig::Handshake(args) => Box::new(HandshakeEvaluator::new(args.clone())),
            EvaluatorConfig::NodeIdentity(args) => Box::new(NodeIdentityEvaluator::new(
                args.clone(),
                baseline.expected_chain_id.clone(),
                baseline.expected_role_type.clone(),
            )),
            EvaluatorConfig::ApiLatency(args) => Box::new(ApiLatencyEvaluator::new(args.clone())?),
            EvaluatorConfig::NetworkPeers(args) => Box::new(NetworkPeersEvaluator::new(args.clone())?),
        };
        Ok(evaluator)
    }
}

/// 100 up to `full_until`, falling linearly to 0 at `zero_at`, rounding half up.
pub(crate) fn linear_decay(value: u64, full_until: u64, zero_at: u64) -> u8 {
    if value <= full_until {
        return 100;
    }
    if value >= zero_at {
        return 0;
    }
    let remaining = u128::from(zero_at - value);
    let span = u128::from(zero_at - full_until);
    u8::try_from((200 * remaining + span) / (2 * span)).unwrap_or(100)
}

/// `part / whole` as a 0-100 score, rounding half up.
pub(crate) fn percentage(part: u64, whole: u64) -> u8 {
    if whole == 0 {
        return 100;
    }
    let part = part.min(whole);
    u8::try_from((200 * part + whole) / (2 * whole)).unwrap_or(100)
}
