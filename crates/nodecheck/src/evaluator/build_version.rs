use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{EvaluationInput, EvaluationResult, Evaluator};
use crate::fetcher::DataKind;

pub const NAME: &str = "build_version";

/// Score when the baseline node cannot tell us what to expect.
const UNCOMPARABLE_SCORE: u8 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildVersionArgs {
    /// Score given when versions differ or the node reports none
    pub mismatch_score: u8,
    pub help_links: Vec<String>,
}

impl Default for BuildVersionArgs {
    fn default() -> Self {
        Self { mismatch_score: 10, help_links: Vec::new() }
    }
}

/// Compares the node's build version with the baseline's expectation.
///
/// With an `expected_build_version` pattern the reported version must match
/// it. Without one, it must equal the version the baseline node reports.
pub struct BuildVersionEvaluator {
    args: BuildVersionArgs,
    pattern: Option<Regex>,
}

impl BuildVersionEvaluator {
    pub fn new(args: BuildVersionArgs, pattern: Option<&str>, has_baseline_node: bool) -> Result<Self, String> {
        if args.mismatch_score >= 100 {
            return Err(format!("mismatch_score must be below 100, got {}", args.mismatch_score));
        }

        let pattern = pattern
            .map(|raw| Regex::new(raw).map_err(|e| format!("invalid expected_build_version: {e}")))
            .transpose()?;

        if pattern.is_none() && !has_baseline_node {
            return Err("build_version needs expected_build_version or a baseline_node".to_string());
        }

        Ok(Self { args, pattern })
    }

    fn mismatch(&self, headline: &str, explanation: String) -> EvaluationResult {
        EvaluationResult::new(NAME, self.args.mismatch_score, headline, explanation)
            .with_links(self.help_links())
    }
}

impl Evaluator for BuildVersionEvaluator {
    fn name(&self) -> &'static str {
        NAME
    }

    fn required_data(&self) -> &'static [DataKind] {
        &[DataKind::Api]
    }

    fn uses_baseline_api(&self) -> bool {
        self.pattern.is_none()
    }

    fn help_links(&self) -> &[String] {
        &self.args.help_links
    }

    fn evaluate(&self, input: &EvaluationInput<'_>) -> EvaluationResult {
        let Some(api) = input.target.api() else {
            let failures: Vec<_> = input.target.failure(DataKind::Api).into_iter().collect();
            return EvaluationResult::data_unavailable(NAME, &failures).with_links(self.help_links());
        };

        let Some(version) = api.build_version.as_deref() else {
            return self.mismatch(
                "Build version not reported",
                "The node's API did not report a build version.".to_string(),
            );
        };

        if let Some(pattern) = &self.pattern {
            return if pattern.is_match(version) {
                EvaluationResult::new(
                    NAME,
                    100,
                    "Build version matches",
                    format!("Build version {version} matches the expected pattern {}.", pattern.as_str()),
                )
            } else {
                self.mismatch(
                    "Build version mismatch",
                    format!("Build version {version} does not match the expected pattern {}.", pattern.as_str()),
                )
            };
        }

        let expected = match input.baseline_api {
            Some(Ok(baseline)) => baseline.build_version.as_deref(),
            Some(Err(failure)) => {
                return EvaluationResult::new(
                    NAME,
                    UNCOMPARABLE_SCORE,
                    "Build version could not be compared",
                    format!("Node runs {version}, but the baseline node was unavailable: {failure}."),
                )
                .with_links(self.help_links());
            }
            None => None,
        };

        match expected {
            Some(expected) if expected == version => EvaluationResult::new(
                NAME,
                100,
                "Build version matches",
                format!("Build version {version} matches the baseline node."),
            ),
            Some(expected) => self.mismatch(
                "Build version mismatch",
                format!("Node runs {version} but the baseline node runs {expected}."),
            ),
            None => EvaluationResult::new(
                NAME,
                UNCOMPARABLE_SCORE,
                "Build version could not be compared",
                format!("Node runs {version}, but the baseline node did not report a build version."),
            )
            .with_links(self.help_links()),
        }
    }
}
