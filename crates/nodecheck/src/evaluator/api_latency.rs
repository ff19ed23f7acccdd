use serde::{Deserialize, Serialize};

use super::{EvaluationInput, EvaluationResult, Evaluator, linear_decay};
use crate::fetcher::DataKind;

pub const NAME: &str = "api_latency";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiLatencyArgs {
    pub max_latency_ms: u64,
    pub zero_score_latency_ms: u64,
    pub help_links: Vec<String>,
}

impl Default for ApiLatencyArgs {
    fn default() -> Self {
        Self { max_latency_ms: 1000, zero_score_latency_ms: 5000, help_links: Vec::new() }
    }
}

/// Scores how quickly the node answered its API request.
pub struct ApiLatencyEvaluator {
    args: ApiLatencyArgs,
}

impl ApiLatencyEvaluator {
    pub fn new(args: ApiLatencyArgs) -> Result<Self, String> {
        if args.zero_score_latency_ms <= args.max_latency_ms {
            return Err(format!(
                "zero_score_latency_ms ({}) must be greater than max_latency_ms ({})",
                args.zero_score_latency_ms, args.max_latency_ms
            ));
        }
        Ok(Self { args })
    }
}

impl Evaluator for ApiLatencyEvaluator {
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

        let latency_ms = u64::try_from(api.latency.as_millis()).unwrap_or(u64::MAX);
        let score = linear_decay(latency_ms, self.args.max_latency_ms, self.args.zero_score_latency_ms);
        let headline = if score == 100 { "API latency is good" } else { "API latency is high" };

        EvaluationResult::new(
            NAME,
            score,
            headline,
            format!(
                "The API answered in {latency_ms}ms (healthy within {}ms).",
                self.args.max_latency_ms
            ),
        )
        .with_links(self.help_links())
    }
}
