use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use logger::LogFormat;

use crate::config::{Config, PreconfiguredNode};

/// Command line flags. Anything given here wins over the config file.
#[derive(Debug, Parser)]
#[command(name = "nodecheck-server")]
#[command(about = "Evaluates the health of blockchain nodes against baseline configurations")]
#[command(version)]
pub struct Cli {
    /// Path to the server config file
    #[arg(short, long, env = "NODECHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long, env = "NODECHECK_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Directory of baseline configuration documents
    #[arg(short, long, env = "NODECHECK_BASELINES")]
    pub baselines: Option<PathBuf>,

    /// Node to serve at /check_preconfigured_node
    #[arg(long, env = "NODECHECK_NODE_URL")]
    pub node_url: Option<String>,

    #[arg(long, requires = "node_url")]
    pub api_port: Option<u16>,

    #[arg(long, requires = "node_url")]
    pub metrics_port: Option<u16>,

    #[arg(long, requires = "node_url")]
    pub noise_port: Option<u16>,

    /// compact or json
    #[arg(long, env = "RUST_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    /// Layer the flags over `config`.
    pub fn apply(self, mut config: Config) -> Config {
        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if let Some(baselines) = self.baselines {
            config.baselines_dir = baselines;
        }
        if let Some(log_format) = self.log_format {
            config.log_format = log_format;
        }
        if let Some(url) = self.node_url {
            let mut node = PreconfiguredNode { url, ports: Default::default() };
            node.ports.api_port = self.api_port;
            node.ports.metrics_port = self.metrics_port;
            node.ports.noise_port = self.noise_port;
            config.preconfigured_node = Some(node);
        }
        config
    }
}
