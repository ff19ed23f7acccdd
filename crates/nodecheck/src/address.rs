//! Target node addressing.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::{Host, Url};

use crate::error::ConfigurationError;

pub const DEFAULT_API_PORT: u16 = 8080;
pub const DEFAULT_METRICS_PORT: u16 = 9101;
pub const DEFAULT_NOISE_PORT: u16 = 6180;

/// Where to reach a node: base URL plus the three ports we talk to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAddress {
    /// Base URL of the node, e.g. `http://mynode.example.com`
    pub url: Url,

    /// REST API port
    #[serde(default = "NodeAddress::default_api_port")]
    pub api_port: u16,

    /// Prometheus metrics port
    #[serde(default = "NodeAddress::default_metrics_port")]
    pub metrics_port: u16,

    /// Peer-to-peer (noise) port
    #[serde(default = "NodeAddress::default_noise_port")]
    pub noise_port: u16,
}

/// Per-request port overrides applied on top of a [`NodeAddress`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortOverrides {
    pub api_port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub noise_port: Option<u16>,
}

impl NodeAddress {
    /// Build an address from a URL with default ports.
    pub fn new(url: Url) -> Result<Self, ConfigurationError> {
        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(ConfigurationError::InvalidNodeUrl {
                url: url.to_string(),
                reason: "URL has no host".to_string(),
            });
        }

        Ok(Self {
            url,
            api_port: DEFAULT_API_PORT,
            metrics_port: DEFAULT_METRICS_PORT,
            noise_port: DEFAULT_NOISE_PORT,
        })
    }

    /// Parse a user supplied URL. A missing scheme gets `http://` prepended.
    pub fn parse(raw: &str) -> Result<Self, ConfigurationError> {
        let raw = raw.trim();
        let candidate = if raw.contains("://") { raw.to_string() } else { format!("http://{raw}") };

        let url = Url::parse(&candidate).map_err(|e| ConfigurationError::InvalidNodeUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => Self::new(url),
            other => Err(ConfigurationError::InvalidNodeUrl {
                url: raw.to_string(),
                reason: format!("unsupported scheme {other}"),
            }),
        }
    }

    pub fn default_api_port() -> u16 {
        DEFAULT_API_PORT
    }

    pub fn default_metrics_port() -> u16 {
        DEFAULT_METRICS_PORT
    }

    pub fn default_noise_port() -> u16 {
        DEFAULT_NOISE_PORT
    }

    /// Return a copy with the given overrides applied.
    pub fn with_overrides(&self, overrides: PortOverrides) -> Self {
        Self {
            url: self.url.clone(),
            api_port: overrides.api_port.unwrap_or(self.api_port),
            metrics_port: overrides.metrics_port.unwrap_or(self.metrics_port),
            noise_port: overrides.noise_port.unwrap_or(self.noise_port),
        }
    }

    /// Host to open sockets to. IPv6 literals come without their brackets.
    pub fn host(&self) -> String {
        match self.url.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => ip.to_string(),
            None => String::new(),
        }
    }

    /// URL of `path` served on the API port.
    pub fn api_url(&self, path: &str) -> Url {
        self.endpoint(self.api_port, path)
    }

    /// URL of `path` served on the metrics port.
    pub fn metrics_url(&self, path: &str) -> Url {
        self.endpoint(self.metrics_port, path)
    }

    fn endpoint(&self, port: u16, path: &str) -> Url {
        let mut url = self.url.clone();
        // Only fails for URLs without a host, which `new` rejects.
        let _ = url.set_port(Some(port));
        url.set_path(path);
        url.set_query(None);
        url
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (api {}, metrics {}, noise {})",
            self.url, self.api_port, self.metrics_port, self.noise_port
        )
    }
}
