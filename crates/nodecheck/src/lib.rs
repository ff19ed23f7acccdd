//! Node health evaluation.
//!
//! Fetches diagnostic data from a node over its API, metrics and noise ports,
//! runs the evaluators of a baseline configuration over it and folds the
//! results into a scored [`EvaluationSummary`].
#![warn(clippy::all, clippy::pedantic)]

pub mod address;
pub mod baseline;
pub mod error;
pub mod evaluator;
pub mod fetcher;
pub mod orchestrator;

#[cfg(test)]
mod test_support;

pub use address::{NodeAddress, PortOverrides};
pub use baseline::{Baseline, BaselineConfiguration, BaselineRegistry, ConfigurationDescriptor, FetchTimeouts};
pub use error::{BaselineError, ConfigurationError, EvaluationError};
pub use evaluator::{EvaluationResult, Evaluator, EvaluatorConfig};
pub use fetcher::{DataKind, FetchFailure, FetchOutcome, FetchedData, Fetcher, FetcherSet};
pub use orchestrator::{Clock, EvaluationSummary, MeanScore, Orchestrator, ScoreAggregator, SystemClock, WorstScore};
