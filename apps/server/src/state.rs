use nodecheck::{ConfigurationError, NodeAddress, Orchestrator};

/// Shared by every worker; read-only after startup.
pub struct AppState {
    pub orchestrator: Orchestrator,
    preconfigured_node: Option<NodeAddress>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, preconfigured_node: Option<NodeAddress>) -> Self {
        Self { orchestrator, preconfigured_node }
    }

    pub fn preconfigured_node(&self) -> Result<&NodeAddress, ConfigurationError> {
        self.preconfigured_node.as_ref().ok_or(ConfigurationError::MissingPreconfiguredNode)
    }
}
