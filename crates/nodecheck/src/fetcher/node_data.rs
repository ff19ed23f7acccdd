use super::{ApiData, DataKind, FetchFailure, FetchOutcome, FetchedData, HandshakeData, MetricsData};

/// Everything fetched from one node during one evaluation.
///
/// A kind is `None` when it was never requested.
#[derive(Debug, Clone, Default)]
pub struct NodeData {
    pub api: Option<FetchOutcome<ApiData>>,
    pub metrics: Option<FetchOutcome<MetricsData>>,
    pub handshake: Option<FetchOutcome<HandshakeData>>,
}

impl NodeData {
    /// Store a fetch outcome, replacing any earlier one of the same kind.
    pub fn insert(&mut self, data: FetchedData) {
        match data {
            FetchedData::Api(outcome) => self.api = Some(outcome),
            FetchedData::Metrics(outcome) => self.metrics = Some(outcome),
            FetchedData::Handshake(outcome) => self.handshake = Some(outcome),
        }
    }

    /// Whether a fetch of `kind` was attempted, successful or not.
    pub fn has(&self, kind: DataKind) -> bool {
        match kind {
            DataKind::Api => self.api.is_some(),
            DataKind::Metrics => self.metrics.is_some(),
            DataKind::Handshake => self.handshake.is_some(),
        }
    }

    pub fn succeeded(&self, kind: DataKind) -> bool {
        match kind {
            DataKind::Api => matches!(self.api, Some(Ok(_))),
            DataKind::Metrics => matches!(self.metrics, Some(Ok(_))),
            DataKind::Handshake => matches!(self.handshake, Some(Ok(_))),
        }
    }

    pub fn failure(&self, kind: DataKind) -> Option<&FetchFailure> {
        match kind {
            DataKind::Api => self.api.as_ref()?.as_ref().err(),
            DataKind::Metrics => self.metrics.as_ref()?.as_ref().err(),
            DataKind::Handshake => self.handshake.as_ref()?.as_ref().err(),
        }
    }

    pub fn api(&self) -> Option<&ApiData> {
        self.api.as_ref()?.as_ref().ok()
    }

    pub fn metrics(&self) -> Option<&MetricsData> {
        self.metrics.as_ref()?.as_ref().ok()
    }

    pub fn handshake(&self) -> Option<&HandshakeData> {
        self.handshake.as_ref()?.as_ref().ok()
    }
}
