//! Baseline configurations - what a healthy node looks like on a network
pub mod loader;
pub mod registry;
pub mod types;

pub use loader::{load_dir, load_document};
pub use registry::{BaselineRegistry, ConfigurationDescriptor};
pub use types::{Baseline, BaselineConfiguration, FetchTimeouts};
