use serde::{Deserialize, Serialize};

use crate::evaluator::EvaluationResult;

/// Explanation used when nothing was evaluated.
pub const NO_EVALUATORS_RAN: &str = "No evaluators ran.";

/// Aggregated health report for one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    /// Individual results, in the order the baseline lists its evaluators
    pub evaluation_results: Vec<EvaluationResult>,

    /// 0-100 overall score
    pub summary_score: u8,

    pub summary_explanation: String,
}

impl EvaluationSummary {
    /// Fold `results` into a summary using `aggregator` for the overall score.
    pub fn from_results(results: Vec<EvaluationResult>, aggregator: &dyn ScoreAggregator) -> Self {
        if results.is_empty() {
            return Self {
                evaluation_results: results,
                summary_score: 0,
                summary_explanation: NO_EVALUATORS_RAN.to_string(),
            };
        }

        let summary_score = aggregator.aggregate(&results).min(100);
        let summary_explanation = results
            .iter()
            .map(|result| format!("{}: {}", result.headline, result.score))
            .collect::<Vec<_>>()
            .join("; ");

        Self { evaluation_results: results, summary_score, summary_explanation }
    }
}

/// Turns individual scores into the summary score.
pub trait ScoreAggregator: Send + Sync {
    /// Never called with an empty slice.
    fn aggregate(&self, results: &[EvaluationResult]) -> u8;
}

/// Unweighted mean, rounded half up.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanScore;

impl ScoreAggregator for MeanScore {
    fn aggregate(&self, results: &[EvaluationResult]) -> u8 {
        if results.is_empty() {
            return 0;
        }
        let count = u64::try_from(results.len()).unwrap_or(u64::MAX);
        let total: u64 = results.iter().map(|result| u64::from(result.score)).sum();
        u8::try_from((2 * total + count) / (2 * count)).unwrap_or(100)
    }
}

/// The lowest individual score: one failing dimension fails the node.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorstScore;

impl ScoreAggregator for WorstScore {
    fn aggregate(&self, results: &[EvaluationResult]) -> u8 {
        results.iter().map(|result| result.score).min().unwrap_or(0)
    }
}
