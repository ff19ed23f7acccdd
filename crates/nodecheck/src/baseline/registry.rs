use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::types::{Baseline, BaselineConfiguration};
use crate::error::BaselineError;
use crate::fetcher::{ApiData, FetchOutcome};

/// Name and display name of a registered configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationDescriptor {
    pub name: String,
    pub pretty_name: String,
}

/// Baseline configurations by name.
///
/// Filled once at startup, then shared read-only between requests.
#[derive(Debug, Default)]
pub struct BaselineRegistry {
    baselines: BTreeMap<String, Arc<Baseline>>,
}

impl BaselineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and insert `configuration`, replacing one with the same name.
    pub fn register(&mut self, configuration: BaselineConfiguration) -> Result<(), BaselineError> {
        let baseline = Baseline::build(configuration)?;
        let name = baseline.name().to_string();

        info!(
            "Registered baseline configuration {} ({} evaluators)",
            name,
            baseline.evaluators().len()
        );
        if self.baselines.insert(name.clone(), Arc::new(baseline)).is_some() {
            debug!("Baseline configuration {} replaced an earlier one", name);
        }

        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<Baseline>, BaselineError> {
        self.baselines
            .get(name)
            .cloned()
            .ok_or_else(|| BaselineError::NotFound(name.to_string()))
    }

    /// Pick the baseline whose expected chain id matches what the node reports.
    pub fn infer(&self, api: &FetchOutcome<ApiData>) -> Result<Arc<Baseline>, BaselineError> {
        let api = api
            .as_ref()
            .map_err(|failure| BaselineError::InsufficientDataForInference(failure.to_string()))?;

        let mut matches: Vec<&Arc<Baseline>> = self
            .baselines
            .values()
            .filter(|baseline| baseline.configuration().expected_chain_id == api.chain_id)
            .collect();

        match matches.len() {
            0 => Err(BaselineError::NoBaselineMatched { chain_id: api.chain_id.clone() }),
            1 => {
                let baseline = matches.remove(0);
                debug!("Inferred baseline {} from chain id {}", baseline.name(), api.chain_id);
                Ok(Arc::clone(baseline))
            }
            _ => Err(BaselineError::AmbiguousBaseline {
                chain_id: api.chain_id.clone(),
                candidates: matches.iter().map(|baseline| baseline.name().to_string()).collect(),
            }),
        }
    }

    /// Registered configurations, sorted by name.
    pub fn configurations(&self) -> Vec<ConfigurationDescriptor> {
        self.baselines
            .values()
            .map(|baseline| {
                let configuration = baseline.configuration();
                ConfigurationDescriptor {
                    name: configuration.name.clone(),
                    pretty_name: configuration
                        .pretty_name
                        .clone()
                        .unwrap_or_else(|| configuration.name.clone()),
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.baselines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.baselines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{EvaluatorConfig, HandshakeArgs};
    use crate::fetcher::{DataKind, FetchFailure};
    use crate::test_support::{NOW_USECS, api_data};
    use crate::baseline::FetchTimeouts;

    fn configuration(name: &str, chain_id: &str) -> BaselineConfiguration {
        BaselineConfiguration {
            name: name.to_string(),
            pretty_name: None,
            expected_chain_id: chain_id.to_string(),
            expected_role_type: None,
            expected_build_version: None,
            baseline_node: None,
            timeouts: FetchTimeouts::default(),
            evaluators: vec![EvaluatorConfig::Handshake(HandshakeArgs::default())],
        }
    }

    fn registry() -> BaselineRegistry {
        let mut registry = BaselineRegistry::new();
        registry.register(configuration("devnet_fullnode", "devnet")).unwrap();
        registry.register(configuration("testnet_fullnode", "2")).unwrap();
        registry.register(configuration("testnet_validator", "2")).unwrap();
        registry
    }

    #[test]
    fn test_register_rejects_empty_evaluators() {
        let mut config = configuration("empty", "devnet");
        config.evaluators.clear();

        let err = BaselineRegistry::new().register(config).unwrap_err();
        assert!(matches!(err, BaselineError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_register_rejects_duplicate_evaluators() {
        let mut config = configuration("dup", "devnet");
        config.evaluators.push(EvaluatorConfig::Handshake(HandshakeArgs::default()));
        assert!(BaselineRegistry::new().register(config).is_err());
    }

    #[test]
    fn test_register_rejects_invalid_build_pattern() {
        let mut config = configuration("bad_pattern", "devnet");
        config.expected_build_version = Some("([0-9".to_string());

        let err = BaselineRegistry::new().register(config).unwrap_err();
        assert!(matches!(err, BaselineError::InvalidConfiguration { ref reason, .. } if reason.contains("expected_build_version")));
    }

    #[test]
    fn test_register_replaces_by_name() {
        let mut registry = registry();
        registry.register(configuration("devnet_fullnode", "5")).unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.lookup("devnet_fullnode").unwrap().configuration().expected_chain_id, "5");
    }

    #[test]
    fn test_lookup() {
        let registry = registry();
        assert_eq!(registry.lookup("devnet_fullnode").unwrap().name(), "devnet_fullnode");
        assert_eq!(
            registry.lookup("mainnet").unwrap_err(),
            BaselineError::NotFound("mainnet".to_string())
        );
    }

    #[test]
    fn test_infer_single_match() {
        let baseline = registry().infer(&Ok(api_data("devnet", 1, NOW_USECS))).unwrap();
        assert_eq!(baseline.name(), "devnet_fullnode");
    }

    #[test]
    fn test_infer_no_match() {
        let err = registry().infer(&Ok(api_data("mainnet", 1, NOW_USECS))).unwrap_err();
        assert_eq!(err, BaselineError::NoBaselineMatched { chain_id: "mainnet".to_string() });
    }

    #[test]
    fn test_infer_ambiguous_lists_candidates() {
        let err = registry().infer(&Ok(api_data("2", 1, NOW_USECS))).unwrap_err();
        assert_eq!(
            err,
            BaselineError::AmbiguousBaseline {
                chain_id: "2".to_string(),
                candidates: vec!["testnet_fullnode".to_string(), "testnet_validator".to_string()],
            }
        );
    }

    #[test]
    fn test_infer_without_api_data() {
        let failure = FetchFailure::Connection { kind: DataKind::Api, cause: "refused".to_string() };
        let err = registry().infer(&Err(failure)).unwrap_err();
        assert!(matches!(err, BaselineError::InsufficientDataForInference(cause) if cause.contains("refused")));
    }

    #[test]
    fn test_configurations_sorted_with_pretty_names() {
        let mut registry = registry();
        let mut pretty = configuration("a_first", "9");
        pretty.pretty_name = Some("A First".to_string());
        registry.register(pretty).unwrap();

        let configurations = registry.configurations();
        assert_eq!(configurations[0].pretty_name, "A First");
        assert_eq!(configurations[1].pretty_name, "devnet_fullnode");
        assert_eq!(configurations.len(), 4);
    }
}
