use serde::{Deserialize, Serialize};

use crate::fetcher::{ApiData, FetchFailure, FetchOutcome, NodeData};

/// Result of one evaluator. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Short summary, e.g. "Metrics are all present"
    pub headline: String,

    /// 0-100, higher is healthier
    pub score: u8,

    /// Longer explanation of how the score was reached
    pub explanation: String,

    /// Name of the evaluator that produced this result
    pub source: String,

    /// Where to read more about fixing a low score
    pub links: Vec<String>,
}

impl EvaluationResult {
    /// Create a new result. Scores above 100 are clamped.
    pub fn new(
        source: &str,
        score: u8,
        headline: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            headline: headline.into(),
            score: score.min(100),
            explanation: explanation.into(),
            source: source.to_string(),
            links: Vec::new(),
        }
    }

    /// Result for an evaluator whose input data could not be fetched.
    pub fn data_unavailable(source: &str, failures: &[&FetchFailure]) -> Self {
        let causes = if failures.is_empty() {
            "the data was not fetched".to_string()
        } else {
            failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
        };

        Self::new(
            source,
            0,
            "Required data unavailable",
            format!("Could not evaluate {source} because {causes}."),
        )
    }

    /// Attach `links` unless the result is already a perfect score.
    pub fn with_links(mut self, links: &[String]) -> Self {
        if self.score < 100 {
            self.links = links.to_vec();
        }
        self
    }
}

/// What an evaluator gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationInput<'a> {
    /// Data fetched from the target node
    pub target: &'a NodeData,

    /// API data from the baseline's reference node, when it has one
    pub baseline_api: Option<&'a FetchOutcome<ApiData>>,

    /// Time of evaluation in microseconds since the Unix epoch
    pub evaluated_at_usecs: u64,
}
