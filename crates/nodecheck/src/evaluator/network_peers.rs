use serde::{Deserialize, Serialize};

use super::{EvaluationInput, EvaluationResult, Evaluator, percentage};
use crate::fetcher::{DataKind, MetricSelector};

pub const NAME: &str = "network_peers";

const DEFAULT_CONNECTIONS_METRIC: &str = "aptos_connections";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkPeersArgs {
    /// Series whose samples are summed into the peer count
    pub connections_metric: MetricSelector,
    pub minimum_peers: u64,
    pub help_links: Vec<String>,
}

impl Default for NetworkPeersArgs {
    fn default() -> Self {
        Self {
            connections_metric: MetricSelector {
                name: DEFAULT_CONNECTIONS_METRIC.to_string(),
                labels: Default::default(),
            },
            minimum_peers: 1,
            help_links: Vec::new(),
        }
    }
}

/// Checks that the node is connected to enough peers.
pub struct NetworkPeersEvaluator {
    args: NetworkPeersArgs,
}

impl NetworkPeersEvaluator {
    pub fn new(args: NetworkPeersArgs) -> Result<Self, String> {
        if args.minimum_peers == 0 {
            return Err("minimum_peers must be at least 1".to_string());
        }
        Ok(Self { args })
    }
}

impl Evaluator for NetworkPeersEvaluator {
    fn name(&self) -> &'static str {
        NAME
    }

    fn required_data(&self) -> &'static [DataKind] {
        &[DataKind::Metrics]
    }

    fn help_links(&self) -> &[String] {
        &self.args.help_links
    }

    fn evaluate(&self, input: &EvaluationInput<'_>) -> EvaluationResult {
        let Some(metrics) = input.target.metrics() else {
            let failures: Vec<_> = input.target.failure(DataKind::Metrics).into_iter().collect();
            return EvaluationResult::data_unavailable(NAME, &failures).with_links(self.help_links());
        };

        let selector = &self.args.connections_metric;
        let Some(total) = metrics.sum(selector) else {
            return EvaluationResult::new(
                NAME,
                0,
                "Peer count unknown",
                format!("The node does not export {selector}."),
            )
            .with_links(self.help_links());
        };

        // Finite and positive when cast; `as` saturates.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let peers = if total.is_finite() && total > 0.0 { total as u64 } else { 0 };
        let minimum = self.args.minimum_peers;
        let score = percentage(peers, minimum);
        let headline = if peers >= minimum { "Connected to enough peers" } else { "Too few peers" };

        EvaluationResult::new(
            NAME,
            score,
            headline,
            format!("Node has {peers} connections per {selector}, at least {minimum} expected."),
        )
        .with_links(self.help_links())
    }
}
