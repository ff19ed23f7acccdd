//! Evaluation orchestrator - drives one health check end to end
//!
//! Per request:
//! - Resolve the baseline, by name or inferred from the node's API data
//! - Fetch the data the baseline's evaluators need, concurrently
//! - Run every evaluator in the order the baseline lists them
//! - Fold the results into an [`EvaluationSummary`]
//!
//! Nothing is shared between requests except the read-only registry.
pub mod summary;

pub use summary::{EvaluationSummary, MeanScore, ScoreAggregator, WorstScore};

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures::future::{join, join_all};
use tokio::time::Instant;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::address::{NodeAddress, PortOverrides};
use crate::baseline::{Baseline, BaselineRegistry, FetchTimeouts};
use crate::error::{BaselineError, EvaluationError};
use crate::evaluator::EvaluationInput;
use crate::fetcher::{ApiData, DataKind, FetchOutcome, FetchedData, FetcherSet, NodeData};

/// Slack on top of the longest fetch timeout before the whole evaluation is
/// abandoned. The inference fetch counts against the same deadline.
pub const DEADLINE_MARGIN: Duration = Duration::from_secs(2);

/// Stages of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ResolvingBaseline,
    FetchingData,
    Evaluating,
    Aggregated,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::ResolvingBaseline => write!(f, "resolving baseline"),
            Phase::FetchingData => write!(f, "fetching data"),
            Phase::Evaluating => write!(f, "evaluating"),
            Phase::Aggregated => write!(f, "aggregated"),
        }
    }
}

/// Source of the evaluation timestamp.
pub trait Clock: Send + Sync {
    /// Microseconds since the Unix epoch
    fn now_usecs(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_usecs(&self) -> u64 {
        let since_epoch = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        u64::try_from(since_epoch.as_micros()).unwrap_or(u64::MAX)
    }
}

/// Everything fetched for one evaluation.
#[derive(Debug, Clone, Default)]
pub struct EvaluationData {
    pub target: NodeData,
    /// API data of the baseline's reference node, if it was fetched
    pub baseline_api: Option<FetchOutcome<ApiData>>,
}

/// Run every evaluator of `baseline` over `data` and fold the results.
///
/// Pure: the same inputs always give the same summary.
pub fn summarize(
    baseline: &Baseline,
    data: &EvaluationData,
    evaluated_at_usecs: u64,
    aggregator: &dyn ScoreAggregator,
) -> EvaluationSummary {
    let input = EvaluationInput {
        target: &data.target,
        baseline_api: data.baseline_api.as_ref(),
        evaluated_at_usecs,
    };

    let mut results = Vec::with_capacity(baseline.evaluators().len());
    for evaluator in baseline.evaluators() {
        let required = evaluator.required_data();

        if required.iter().any(|kind| data.target.succeeded(*kind)) {
            results.push(evaluator.evaluate(&input));
            continue;
        }

        let failures: Vec<_> = required.iter().filter_map(|kind| data.target.failure(*kind)).collect();
        match evaluator.on_data_unavailable(&failures) {
            Some(result) => results.push(result),
            None => debug!("Skipping evaluator {}: no data", evaluator.name()),
        }
    }

    EvaluationSummary::from_results(results, aggregator)
}

/// Drives fetchers and evaluators for health check requests.
pub struct Orchestrator {
    registry: Arc<BaselineRegistry>,
    fetchers: FetcherSet,
    aggregator: Arc<dyn ScoreAggregator>,
    clock: Arc<dyn Clock>,
    inference_timeout: Duration,
}

impl Orchestrator {
    pub fn new(registry: Arc<BaselineRegistry>, fetchers: FetcherSet) -> Self {
        Self {
            registry,
            fetchers,
            aggregator: Arc::new(MeanScore),
            clock: Arc::new(SystemClock),
            inference_timeout: FetchTimeouts::default().get(DataKind::Api),
        }
    }

    /// Replace the summary score aggregation (defaults to [`MeanScore`]).
    pub fn with_aggregator(mut self, aggregator: Arc<dyn ScoreAggregator>) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Timeout of the API fetch made to infer a baseline.
    pub fn with_inference_timeout(mut self, timeout: Duration) -> Self {
        self.inference_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &BaselineRegistry {
        &self.registry
    }

    /// Evaluate the node at `address` against `baseline_name`, or against the
    /// baseline inferred from its API data when no name is given.
    pub async fn evaluate(
        &self,
        address: &NodeAddress,
        baseline_name: Option<&str>,
        overrides: PortOverrides,
    ) -> Result<EvaluationSummary, EvaluationError> {
        let evaluation_id = Uuid::new_v4();
        let address = address.with_overrides(overrides);
        let span = info_span!("evaluation", %evaluation_id, node = %address.url);

        self.run(address, baseline_name).instrument(span).await
    }

    async fn run(
        &self,
        address: NodeAddress,
        baseline_name: Option<&str>,
    ) -> Result<EvaluationSummary, EvaluationError> {
        let started = Instant::now();

        debug!("Phase: {}", Phase::ResolvingBaseline);
        let (baseline, prefetched) = self
            .resolve_baseline(&address, baseline_name, started)
            .await
            .inspect_err(|e| warn!("Baseline resolution failed: {}", e))?;
        info!("Evaluating {} against baseline {}", address, baseline.name());

        debug!("Phase: {}", Phase::FetchingData);
        let budget = self.budget(&baseline, baseline_name.is_none());
        let data = self.fetch(&address, &baseline, prefetched, started, budget).await?;

        debug!("Phase: {}", Phase::Evaluating);
        let summary = summarize(&baseline, &data, self.clock.now_usecs(), self.aggregator.as_ref());

        debug!("Phase: {}", Phase::Aggregated);
        info!(
            "Evaluation finished with score {} over {} results",
            summary.summary_score,
            summary.evaluation_results.len()
        );
        Ok(summary)
    }

    /// Wall-clock allowance for a whole evaluation, counted from its start.
    fn budget(&self, baseline: &Baseline, inferred: bool) -> Duration {
        let longest = baseline.configuration().timeouts.longest();
        let longest = if inferred { longest.max(self.inference_timeout) } else { longest };
        longest + DEADLINE_MARGIN
    }

    /// Look the baseline up, or fetch API data and infer it. Returns any data
    /// fetched along the way so it is not fetched twice.
    async fn resolve_baseline(
        &self,
        address: &NodeAddress,
        baseline_name: Option<&str>,
        started: Instant,
    ) -> Result<(Arc<Baseline>, NodeData), EvaluationError> {
        if let Some(name) = baseline_name {
            return Ok((self.registry.lookup(name)?, NodeData::default()));
        }

        let allowance = self.inference_timeout + DEADLINE_MARGIN;
        let inference_fetch = self.fetchers.api.fetch(address, self.inference_timeout);
        let fetched = tokio::time::timeout_at(started + allowance, inference_fetch)
            .await
            .map_err(|_| EvaluationError::Timeout(allowance))?;

        let mut prefetched = NodeData::default();
        prefetched.insert(fetched);

        let baseline = match &prefetched.api {
            Some(outcome) => self.registry.infer(outcome)?,
            None => {
                return Err(BaselineError::InsufficientDataForInference(
                    "API data was not fetched".to_string(),
                )
                .into());
            }
        };
        Ok((baseline, prefetched))
    }

    /// Fetch whatever the baseline needs and `target` does not have yet,
    /// giving up once `budget` has passed since `started`.
    async fn fetch(
        &self,
        address: &NodeAddress,
        baseline: &Baseline,
        mut target: NodeData,
        started: Instant,
        budget: Duration,
    ) -> Result<EvaluationData, EvaluationError> {
        let timeouts = baseline.configuration().timeouts;
        let kinds: Vec<DataKind> =
            baseline.required_kinds().into_iter().filter(|kind| !target.has(*kind)).collect();
        debug!("Fetching {:?}", kinds);

        let target_fetches =
            join_all(kinds.iter().map(|kind| self.fetchers.get(*kind).fetch(address, timeouts.get(*kind))));
        let baseline_fetch = async {
            match baseline.baseline_node_to_fetch() {
                Some(node) => Some(self.fetchers.api.fetch(node, timeouts.get(DataKind::Api)).await),
                None => None,
            }
        };

        let (fetched, baseline_fetched) =
            tokio::time::timeout_at(started + budget, join(target_fetches, baseline_fetch))
                .await
                .map_err(|_| {
                    warn!("Evaluation did not finish within {:?}", budget);
                    EvaluationError::Timeout(budget)
                })?;

        for data in fetched {
            if let Some(failure) = data.failure() {
                warn!("Degraded data: {}", failure);
            }
            target.insert(data);
        }

        let baseline_api = match baseline_fetched {
            Some(FetchedData::Api(outcome)) => {
                if let Err(failure) = &outcome {
                    warn!("Baseline node unavailable: {}", failure);
                }
                Some(outcome)
            }
            _ => None,
        };

        Ok(EvaluationData { target, baseline_api })
    }
}
