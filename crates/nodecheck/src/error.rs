use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Why a baseline configuration could not be resolved for a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BaselineError {
    #[error("No baseline configuration named {0:?}")]
    NotFound(String),

    #[error("Chain id {chain_id:?} matches several baseline configurations: {}", candidates.join(", "))]
    AmbiguousBaseline { chain_id: String, candidates: Vec<String> },

    #[error("Chain id {chain_id:?} matches no baseline configuration")]
    NoBaselineMatched { chain_id: String },

    #[error("Cannot infer a baseline configuration without API data: {0}")]
    InsufficientDataForInference(String),

    #[error("Invalid baseline configuration {name:?}: {reason}")]
    InvalidConfiguration { name: String, reason: String },
}

/// Failures that terminate an evaluation request.
#[derive(Debug, Clone, Error)]
pub enum EvaluationError {
    #[error("Failed to resolve a baseline configuration: {0}")]
    BaselineResolutionFailed(#[from] BaselineError),

    #[error("Evaluation did not finish within {0:?}")]
    Timeout(Duration),
}

/// Problems with startup configuration or with a request's node address.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Invalid node URL {url:?}: {reason}")]
    InvalidNodeUrl { url: String, reason: String },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Baseline document {} is invalid: {source}", path.display())]
    Baseline {
        path: PathBuf,
        #[source]
        source: BaselineError,
    },

    #[error("No baseline configurations found in {}", .0.display())]
    NoBaselines(PathBuf),

    #[error("No preconfigured node was supplied at startup")]
    MissingPreconfiguredNode,
}
