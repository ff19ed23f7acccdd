use serde::{Deserialize, Serialize};

use super::{EvaluationInput, EvaluationResult, Evaluator};
use crate::fetcher::DataKind;

pub const NAME: &str = "node_identity";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeIdentityArgs {
    pub help_links: Vec<String>,
}

/// Checks the node is on the expected chain, in the expected role.
pub struct NodeIdentityEvaluator {
    args: NodeIdentityArgs,
    expected_chain_id: String,
    expected_role_type: Option<String>,
}

impl NodeIdentityEvaluator {
    pub fn new(args: NodeIdentityArgs, expected_chain_id: String, expected_role_type: Option<String>) -> Self {
        Self { args, expected_chain_id, expected_role_type }
    }
}

impl Evaluator for NodeIdentityEvaluator {
    fn name(&self) -> &'static str {
        NAME
    }

    fn required_data(&self) -> &'static [DataKind] {
        &[DataKind::Api]
    }

    fn help_links(&self) -> &[String] {
        &self.args.help_links
    }

    fn evaluate(&self, input: &EvaluationInput<'_>) -> EvaluationResult {
        let Some(api) = input.target.api() else {
            let failures: Vec<_> = input.target.failure(DataKind::Api).into_iter().collect();
            return EvaluationResult::data_unavailable(NAME, &failures).with_links(self.help_links());
        };

        if api.chain_id != self.expected_chain_id {
            return EvaluationResult::new(
                NAME,
                0,
                "Wrong chain",
                format!(
                    "Node reports chain id {} but chain id {} was expected.",
                    api.chain_id, self.expected_chain_id
                ),
            )
            .with_links(self.help_links());
        }

        if let Some(expected_role) = &self.expected_role_type {
            let reported = api.node_role.as_deref().unwrap_or("unknown");
            if reported != expected_role {
                return EvaluationResult::new(
                    NAME,
                    0,
                    "Wrong node role",
                    format!("Node reports role {reported} but role {expected_role} was expected."),
                )
                .with_links(self.help_links());
            }
        }

        EvaluationResult::new(
            NAME,
            100,
            "Node identity matches",
            format!(
                "Node is on chain {} with role {}.",
                api.chain_id,
                api.node_role.as_deref().unwrap_or("unknown")
            ),
        )
    }
}
