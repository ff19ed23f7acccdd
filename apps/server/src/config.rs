use std::net::SocketAddr;
use std::{env, fmt, fs, path};

use logger::LogFormat;
use nodecheck::{ConfigurationError, NodeAddress, PortOverrides};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read {}: {source}", path.display())]
    ReadFailed { path: path::PathBuf, source: std::io::Error },
    #[error("Failed to parse {}: {source}", path.display())]
    ParseFailed { path: path::PathBuf, source: toml::de::Error },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP server binds to
    pub listen: SocketAddr,

    /// Directory holding one TOML document per baseline configuration
    pub baselines_dir: path::PathBuf,

    pub log_format: LogFormat,

    /// Timeout of the API request made to infer a baseline
    pub inference_timeout_ms: u64,

    /// Node served by /check_preconfigured_node
    pub preconfigured_node: Option<PreconfiguredNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreconfiguredNode {
    pub url: String,
    #[serde(default, flatten)]
    pub ports: PortOverrides,
}

impl PreconfiguredNode {
    pub fn address(&self) -> Result<NodeAddress, ConfigurationError> {
        Ok(NodeAddress::parse(&self.url)?.with_overrides(self.ports))
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/nodecheck/server.toml or
/// $HOME/.config/...)
fn default_config_path() -> Option<path::PathBuf> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else {
        env::home_dir()?.join(".config")
    };

    Some(path.join("nodecheck/server.toml"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 20121)),
            baselines_dir: path::PathBuf::from("baselines"),
            log_format: LogFormat::default(),
            inference_timeout_ms: 4000,
            preconfigured_node: None,
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Server Configuration:")?;
        write_title_1(f, "HTTP")?;
        write_1(f, "Listen Address", &self.listen)?;
        write_1(f, "Log Format", &self.log_format)?;
        write_title_1(f, "Evaluation")?;
        write_1(f, "Baselines Directory", &self.baselines_dir.display())?;
        write_1(f, "Inference Timeout (ms)", &self.inference_timeout_ms)?;
        match &self.preconfigured_node {
            Some(node) => write_1(f, "Preconfigured Node", &node.url)?,
            None => write_1(f, "Preconfigured Node", &"none")?,
        }

        Ok(())
    }
}

impl Config {
    /// Read the config from `optional_path`, or from the default location.
    ///
    /// A missing file at the default location yields the defaults; a missing
    /// file that was asked for explicitly is an error.
    pub fn load(optional_path: Option<&path::Path>) -> Result<Self, Error> {
        let config_path = match optional_path {
            Some(path) => normalize_toml_path(path),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let raw_string = fs::read_to_string(&config_path)
            .map_err(|source| Error::ReadFailed { path: config_path.clone(), source })?;
        toml::from_str(&raw_string).map_err(|source| Error::ParseFailed { path: config_path, source })
    }

    pub fn preconfigured_address(&self) -> Result<Option<NodeAddress>, ConfigurationError> {
        self.preconfigured_node.as_ref().map(PreconfiguredNode::address).transpose()
    }
}
