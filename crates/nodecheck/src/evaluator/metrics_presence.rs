use serde::{Deserialize, Serialize};

use super::{EvaluationInput, EvaluationResult, Evaluator, percentage};
use crate::fetcher::{DataKind, MetricSelector};

pub const NAME: &str = "metrics_presence";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsPresenceArgs {
    /// Series that must appear in the scrape, e.g. `aptos_connections{network_id="Public"}`
    pub required_metrics: Vec<MetricSelector>,
    pub help_links: Vec<String>,
}

/// Checks that every required metric is exported by the node.
pub struct MetricsPresenceEvaluator {
    args: MetricsPresenceArgs,
}

impl MetricsPresenceEvaluator {
    pub fn new(args: MetricsPresenceArgs) -> Self {
        Self { args }
    }
}

impl Evaluator for MetricsPresenceEvaluator {
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

        let required = &self.args.required_metrics;
        let missing: Vec<String> = required
            .iter()
            .filter(|selector| !metrics.contains(selector))
            .map(ToString::to_string)
            .collect();
        let present = required.len() - missing.len();
        let score = percentage(present as u64, required.len() as u64);

        let result = if missing.is_empty() {
            EvaluationResult::new(
                NAME,
                score,
                "Metrics are all present",
                format!("All {} required metrics were found in the node's metrics.", required.len()),
            )
        } else {
            EvaluationResult::new(
                NAME,
                score,
                "Some required metrics are missing",
                format!(
                    "Found {present} of {} required metrics. Missing: {}.",
                    required.len(),
                    missing.join(", ")
                ),
            )
        };

        result.with_links(self.help_links())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{FetchFailure, NodeData};
    use crate::test_support::{input, metrics_data};
    use std::time::Duration;

    fn evaluator(required: &[&str]) -> MetricsPresenceEvaluator {
        MetricsPresenceEvaluator::new(MetricsPresenceArgs {
            required_metrics: required.iter().map(|raw| MetricSelector::parse(raw).unwrap()).collect(),
            help_links: vec!["https://docs.example.com/metrics".to_string()],
        })
    }

    fn node_with_metrics(text: &str) -> NodeData {
        NodeData { metrics: Some(Ok(metrics_data(text))), ..NodeData::default() }
    }

    #[test]
    fn test_all_present() {
        let node = node_with_metrics("a 1\nb{x=\"y\"} 2\n");
        let result = evaluator(&["a", "b{x=\"y\"}"]).evaluate(&input(&node));
        assert_eq!(result.score, 100);
        assert_eq!(result.headline, "Metrics are all present");
        assert!(result.links.is_empty());
    }

    #[test]
    fn test_fraction_present_lists_missing() {
        let node = node_with_metrics("a 1\n");
        let result = evaluator(&["a", "b", "c"]).evaluate(&input(&node));
        assert_eq!(result.score, 33);
        assert!(result.explanation.contains("Missing: b, c."));
        assert_eq!(result.links.len(), 1);
    }

    #[test]
    fn test_label_mismatch_counts_as_missing() {
        let node = node_with_metrics("b{x=\"z\"} 2\n");
        let result = evaluator(&["b{x=\"y\"}"]).evaluate(&input(&node));
        assert_eq!(result.score, 0);
    }

    #[test]
    fn test_no_requirements_is_healthy() {
        let node = node_with_metrics("a 1\n");
        assert_eq!(evaluator(&[]).evaluate(&input(&node)).score, 100);
    }

    #[test]
    fn test_unavailable_metrics_degrade_score() {
        let failure = FetchFailure::Timeout { kind: DataKind::Metrics, after: Duration::from_secs(4) };
        let result = evaluator(&["a"]).on_data_unavailable(&[&failure]).unwrap();
        assert_eq!(result.score, 0);
        assert_eq!(result.source, NAME);
        assert!(result.explanation.contains("timed out"));
    }
}
