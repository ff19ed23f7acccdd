use serde::{Deserialize, Serialize};

use super::{EvaluationInput, EvaluationResult, Evaluator};
use crate::fetcher::{DataKind, FetchFailure, PeerReaction};

pub const NAME: &str = "handshake";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandshakeArgs {
    pub help_links: Vec<String>,
}

/// Pass/fail check of the noise port.
pub struct HandshakeEvaluator {
    args: HandshakeArgs,
}

impl HandshakeEvaluator {
    pub fn new(args: HandshakeArgs) -> Self {
        Self { args }
    }
}

impl Evaluator for HandshakeEvaluator {
    fn name(&self) -> &'static str {
        NAME
    }

    fn required_data(&self) -> &'static [DataKind] {
        &[DataKind::Handshake]
    }

    fn help_links(&self) -> &[String] {
        &self.args.help_links
    }

    fn evaluate(&self, input: &EvaluationInput<'_>) -> EvaluationResult {
        let Some(handshake) = input.target.handshake() else {
            let failures: Vec<_> = input.target.failure(DataKind::Handshake).into_iter().collect();
            return self.on_data_unavailable(&failures).unwrap_or_else(|| {
                EvaluationResult::data_unavailable(NAME, &failures).with_links(self.help_links())
            });
        };

        let reaction = match handshake.reaction {
            PeerReaction::Closed => "closed the connection after the initiation message".to_string(),
            PeerReaction::Replied { bytes } => format!("replied with a {bytes} byte frame"),
            PeerReaction::Silent => {
                "accepted the initiation but did not confirm the noise protocol; \
                 any listener that stays quiet looks the same"
                    .to_string()
            }
        };

        EvaluationResult::new(
            NAME,
            100,
            "Noise port is live",
            format!(
                "Connected to {} in {}ms; the peer {reaction}.",
                handshake.remote,
                handshake.latency.as_millis()
            ),
        )
    }

    fn on_data_unavailable(&self, failures: &[&FetchFailure]) -> Option<EvaluationResult> {
        let cause = match failures.first() {
            Some(failure) => failure.to_string(),
            None => "the handshake was not attempted".to_string(),
        };

        Some(
            EvaluationResult::new(
                NAME,
                0,
                "Noise handshake failed",
                format!("Could not start a handshake on the noise port: {cause}."),
            )
            .with_links(self.help_links()),
        )
    }
}
