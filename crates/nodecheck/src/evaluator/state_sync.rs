use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{EvaluationInput, EvaluationResult, Evaluator, linear_decay};
use crate::fetcher::DataKind;

pub const NAME: &str = "state_sync";

/// Scores reported above the version lag bound are capped at this.
const LAGGING_SCORE_CAP: u8 = 50;

const USECS_PER_SEC: u64 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateSyncArgs {
    /// Ledger may be this old and still score 100
    pub max_staleness_secs: u64,

    /// Ledger this old (or older) scores 0
    pub zero_score_staleness_secs: u64,

    /// How many versions the target may trail the baseline node by
    pub max_version_lag: u64,

    pub help_links: Vec<String>,
}

impl Default for StateSyncArgs {
    fn default() -> Self {
        Self {
            max_staleness_secs: 30,
            zero_score_staleness_secs: 300,
            max_version_lag: 50_000,
            help_links: Vec::new(),
        }
    }
}

/// Checks that the node's ledger is advancing and recent.
pub struct StateSyncEvaluator {
    args: StateSyncArgs,
}

impl StateSyncEvaluator {
    pub fn new(args: StateSyncArgs) -> Result<Self, String> {
        if args.zero_score_staleness_secs <= args.max_staleness_secs {
            return Err(format!(
                "zero_score_staleness_secs ({}) must be greater than max_staleness_secs ({})",
                args.zero_score_staleness_secs, args.max_staleness_secs
            ));
        }
        Ok(Self { args })
    }
}

impl Evaluator for StateSyncEvaluator {
    fn name(&self) -> &'static str {
        NAME
    }

    fn required_data(&self) -> &'static [DataKind] {
        &[DataKind::Api]
    }

    fn uses_baseline_api(&self) -> bool {
        true
    }

    fn help_links(&self) -> &[String] {
        &self.args.help_links
    }

    fn evaluate(&self, input: &EvaluationInput<'_>) -> EvaluationResult {
        let Some(api) = input.target.api() else {
            let failures: Vec<_> = input.target.failure(DataKind::Api).into_iter().collect();
            return EvaluationResult::data_unavailable(NAME, &failures).with_links(self.help_links());
        };

        if api.ledger_version == 0 {
            return EvaluationResult::new(
                NAME,
                0,
                "Ledger is not advancing",
                "The node reports ledger version 0, it has not synced any transactions.",
            )
            .with_links(self.help_links());
        }

        // A ledger timestamp in the future (clock skew) counts as fresh.
        let staleness_usecs = input.evaluated_at_usecs.saturating_sub(api.ledger_timestamp_usecs);
        let mut score = linear_decay(
            staleness_usecs,
            self.args.max_staleness_secs.saturating_mul(USECS_PER_SEC),
            self.args.zero_score_staleness_secs.saturating_mul(USECS_PER_SEC),
        );

        let mut headline = if score == 100 {
            "State sync is up to date"
        } else if score > 0 {
            "State sync is falling behind"
        } else {
            "State sync is stale"
        };
        let mut explanation = format!(
            "Ledger version {} was committed {:.1}s ago (healthy within {}s, stale at {}s).",
            api.ledger_version,
            Duration::from_micros(staleness_usecs).as_secs_f64(),
            self.args.max_staleness_secs,
            self.args.zero_score_staleness_secs
        );

        match input.baseline_api {
            Some(Ok(baseline)) => {
                let lag = baseline.ledger_version.saturating_sub(api.ledger_version);
                if lag > self.args.max_version_lag {
                    score = score.min(LAGGING_SCORE_CAP);
                    headline = "State sync is lagging behind the baseline";
                    explanation.push_str(&format!(
                        " The baseline node is at version {}, {} versions ahead (allowed {}).",
                        baseline.ledger_version, lag, self.args.max_version_lag
                    ));
                } else {
                    explanation.push_str(&format!(
                        " Within {} versions of the baseline node.",
                        self.args.max_version_lag
                    ));
                }
            }
            Some(Err(failure)) => {
                explanation.push_str(&format!(
                    " Could not compare against the baseline node ({failure}), used the staleness bound only."
                ));
            }
            None => {}
        }

        EvaluationResult::new(NAME, score, headline, explanation).with_links(self.help_links())
    }
}
