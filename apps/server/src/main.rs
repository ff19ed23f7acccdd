#![warn(clippy::all, clippy::pedantic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, web};
use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use nodecheck::baseline::load_dir;
use nodecheck::{FetcherSet, Orchestrator};
use tracing::level_filters::LevelFilter;
use tracing::{debug, info};

mod cli;
mod config;
mod error;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use cli::Cli;
use config::Config;
use state::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load server config")?;
    let config = cli.apply(config);

    logger::init_with(LevelFilter::INFO, config.log_format);
    debug!("{config}");

    let registry = load_dir(&config.baselines_dir).context("Failed to load baseline configurations")?;
    let preconfigured_node = config.preconfigured_address().context("Invalid preconfigured node")?;
    if let Some(node) = &preconfigured_node {
        info!("Preconfigured node: {}", node);
    }

    let fetchers = FetcherSet::network().context("Failed to build HTTP client")?;
    let orchestrator = Orchestrator::new(Arc::new(registry), fetchers)
        .with_inference_timeout(Duration::from_millis(config.inference_timeout_ms));

    let state = web::Data::new(AppState::new(orchestrator, preconfigured_node));
    run_server(config.listen, state).await
}

async fn run_server(addr: SocketAddr, state: web::Data<AppState>) -> anyhow::Result<()> {
    info!("Listening on {}", addr);

    HttpServer::new(move || App::new().app_data(state.clone()).configure(routes::routes))
        .bind(addr)
        .with_context(|| format!("Failed to bind {addr}"))?
        .run()
        .await?;

    Ok(())
}
