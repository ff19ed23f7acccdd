use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::address::NodeAddress;
use crate::error::BaselineError;
use crate::evaluator::{Evaluator, EvaluatorConfig};
use crate::fetcher::DataKind;

const DEFAULT_FETCH_TIMEOUT_MS: u64 = 4000;

/// A named description of what a healthy node on some network looks like.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineConfiguration {
    /// Name clients send to select this configuration, e.g. `devnet_fullnode`
    pub name: String,

    /// Human friendly name, e.g. "Devnet FullNode"
    #[serde(default)]
    pub pretty_name: Option<String>,

    /// Chain id nodes on this network report. Also used to infer the baseline.
    #[serde(deserialize_with = "chain_id_from_scalar")]
    pub expected_chain_id: String,

    /// Role nodes should report, e.g. `full_node` or `validator`
    #[serde(default)]
    pub expected_role_type: Option<String>,

    /// Regex the node's build version must match
    #[serde(default)]
    pub expected_build_version: Option<String>,

    /// Reference node to compare against
    #[serde(default)]
    pub baseline_node: Option<NodeAddress>,

    #[serde(default)]
    pub timeouts: FetchTimeouts,

    /// Evaluators to run, in reporting order
    pub evaluators: Vec<EvaluatorConfig>,
}

/// Accept the chain id as a TOML integer or string.
fn chain_id_from_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ChainId {
        Number(u64),
        Text(String),
    }

    Ok(match ChainId::deserialize(deserializer)? {
        ChainId::Number(number) => number.to_string(),
        ChainId::Text(text) => text,
    })
}

/// Per-fetcher timeouts, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchTimeouts {
    pub api_ms: u64,
    pub metrics_ms: u64,
    pub handshake_ms: u64,
}

impl Default for FetchTimeouts {
    fn default() -> Self {
        Self {
            api_ms: DEFAULT_FETCH_TIMEOUT_MS,
            metrics_ms: DEFAULT_FETCH_TIMEOUT_MS,
            handshake_ms: DEFAULT_FETCH_TIMEOUT_MS,
        }
    }
}

impl FetchTimeouts {
    pub fn get(&self, kind: DataKind) -> Duration {
        let millis = match kind {
            DataKind::Api => self.api_ms,
            DataKind::Metrics => self.metrics_ms,
            DataKind::Handshake => self.handshake_ms,
        };
        Duration::from_millis(millis)
    }

    pub fn longest(&self) -> Duration {
        Duration::from_millis(self.api_ms.max(self.metrics_ms).max(self.handshake_ms))
    }
}

/// A validated configuration together with its built evaluators.
pub struct Baseline {
    configuration: BaselineConfiguration,
    evaluators: Vec<Box<dyn Evaluator>>,
}

impl Baseline {
    /// Validate `configuration` and build its evaluators.
    pub fn build(configuration: BaselineConfiguration) -> Result<Self, BaselineError> {
        let invalid = |reason: String| BaselineError::InvalidConfiguration {
            name: configuration.name.clone(),
            reason,
        };

        if configuration.name.trim().is_empty() {
            return Err(invalid("name is empty".to_string()));
        }
        if configuration.expected_chain_id.trim().is_empty() {
            return Err(invalid("expected_chain_id is empty".to_string()));
        }
        if configuration.evaluators.is_empty() {
            return Err(invalid("no evaluators configured".to_string()));
        }

        let timeouts = configuration.timeouts;
        if timeouts.api_ms == 0 || timeouts.metrics_ms == 0 || timeouts.handshake_ms == 0 {
            return Err(invalid("fetch timeouts must be positive".to_string()));
        }

        if let Some(pattern) = &configuration.expected_build_version {
            Regex::new(pattern).map_err(|e| invalid(format!("expected_build_version: {e}")))?;
        }

        let mut seen = HashSet::new();
        let mut evaluators = Vec::with_capacity(configuration.evaluators.len());
        for entry in &configuration.evaluators {
            if !seen.insert(entry.name()) {
                return Err(invalid(format!("evaluator {} is listed twice", entry.name())));
            }
            let evaluator = entry
                .build(&configuration)
                .map_err(|reason| invalid(format!("evaluator {}: {reason}", entry.name())))?;
            evaluators.push(evaluator);
        }

        Ok(Self { configuration, evaluators })
    }

    pub fn name(&self) -> &str {
        &self.configuration.name
    }

    pub fn configuration(&self) -> &BaselineConfiguration {
        &self.configuration
    }

    pub fn evaluators(&self) -> &[Box<dyn Evaluator>] {
        &self.evaluators
    }

    /// Every kind of target data at least one evaluator reads.
    pub fn required_kinds(&self) -> BTreeSet<DataKind> {
        self.evaluators
            .iter()
            .flat_map(|evaluator| evaluator.required_data().iter().copied())
            .collect()
    }

    /// The baseline node to fetch API data from, if any evaluator wants it.
    pub fn baseline_node_to_fetch(&self) -> Option<&NodeAddress> {
        let wanted = self.evaluators.iter().any(|evaluator| evaluator.uses_baseline_api());
        self.configuration.baseline_node.as_ref().filter(|_| wanted)
    }
}

impl fmt::Debug for Baseline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.evaluators.iter().map(|evaluator| evaluator.name()).collect();
        f.debug_struct("Baseline")
            .field("configuration", &self.configuration)
            .field("evaluators", &names)
            .finish()
    }
}
