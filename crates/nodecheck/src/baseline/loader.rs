//! Loads baseline configuration documents from disk.
//!
//! One TOML document per file. Any unreadable or invalid document fails the
//! whole load so a bad configuration never reaches a request.

use std::path::{Path, PathBuf};
use std::fs;

use tracing::info;

use super::registry::BaselineRegistry;
use super::types::BaselineConfiguration;
use crate::error::ConfigurationError;

/// Used to ensure we only pick up toml files
fn is_toml(path: &Path) -> bool {
    path.extension().map(|ext| ext == "toml").unwrap_or(false)
}

/// Parse a single baseline document.
pub fn parse_document(raw: &str, path: &Path) -> Result<BaselineConfiguration, ConfigurationError> {
    toml::from_str(raw).map_err(|source| ConfigurationError::Parse { path: path.to_path_buf(), source })
}

/// Read and parse the baseline document at `path`.
pub fn load_document(path: &Path) -> Result<BaselineConfiguration, ConfigurationError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigurationError::Read { path: path.to_path_buf(), source })?;
    parse_document(&raw, path)
}

/// Build a registry from every `*.toml` document in `dir`, in file name order.
pub fn load_dir(dir: &Path) -> Result<BaselineRegistry, ConfigurationError> {
    let read_error = |source| ConfigurationError::Read { path: dir.to_path_buf(), source };

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(read_error)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<_, _>>()
        .map_err(read_error)?;
    paths.retain(|path| path.is_file() && is_toml(path));
    paths.sort();

    if paths.is_empty() {
        return Err(ConfigurationError::NoBaselines(dir.to_path_buf()));
    }

    let mut registry = BaselineRegistry::new();
    for path in paths {
        let configuration = load_document(&path)?;
        registry
            .register(configuration)
            .map_err(|source| ConfigurationError::Baseline { path: path.clone(), source })?;
    }

    info!("Loaded {} baseline configurations from {}", registry.len(), dir.display());
    Ok(registry)
}
