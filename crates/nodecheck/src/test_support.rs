//! Shared fixtures for unit tests.

use std::time::Duration;

use crate::evaluator::EvaluationInput;
use crate::fetcher::exposition::parse_exposition;
use crate::fetcher::{ApiData, FetchOutcome, MetricsData, NodeData};

/// Fixed evaluation time: 2022-10-10T21:00:00Z
pub const NOW_USECS: u64 = 1_665_435_600_000_000;

pub fn api_data(chain_id: &str, ledger_version: u64, ledger_timestamp_usecs: u64) -> ApiData {
    ApiData {
        chain_id: chain_id.to_string(),
        node_role: Some("full_node".to_string()),
        epoch: 3,
        ledger_version,
        ledger_timestamp_usecs,
        block_height: Some(ledger_version / 4),
        build_version: Some("9ecf1eeb".to_string()),
        latency: Duration::from_millis(25),
    }
}

pub fn metrics_data(text: &str) -> MetricsData {
    parse_exposition(text)
}

pub fn input(target: &NodeData) -> EvaluationInput<'_> {
    EvaluationInput { target, baseline_api: None, evaluated_at_usecs: NOW_USECS }
}

pub fn input_with_baseline<'a>(
    target: &'a NodeData,
    baseline_api: &'a FetchOutcome<ApiData>,
) -> EvaluationInput<'a> {
    EvaluationInput { target, baseline_api: Some(baseline_api), evaluated_at_usecs: NOW_USECS }
}
