use actix_web::{HttpResponse, get, web};
use nodecheck::{NodeAddress, PortOverrides};
use serde::Deserialize;
use tracing::info;

use crate::error::AppError;
use crate::state::AppState;

macros_utils::routes! {
    route check_node_route,
    route check_preconfigured_node_route,
}

#[derive(Debug, Deserialize)]
pub struct CheckNodeQuery {
    node_url: String,
    baseline_configuration_name: Option<String>,
    api_port: Option<u16>,
    metrics_port: Option<u16>,
    noise_port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct CheckPreconfiguredNodeQuery {
    baseline_configuration_name: Option<String>,
}

/// Evaluate the node named in the query string.
/// Without a baseline name the baseline is inferred from the node's chain id.
#[get("/check_node")]
pub async fn check_node_route(
    state: web::Data<AppState>,
    query: web::Query<CheckNodeQuery>,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();
    let address = NodeAddress::parse(&query.node_url)?;
    let overrides = PortOverrides {
        api_port: query.api_port,
        metrics_port: query.metrics_port,
        noise_port: query.noise_port,
    };

    info!("Checking node {}", address);
    let summary = state
        .orchestrator
        .evaluate(&address, query.baseline_configuration_name.as_deref(), overrides)
        .await?;

    Ok(HttpResponse::Ok().json(summary))
}

/// Evaluate the node this server was started with.
#[get("/check_preconfigured_node")]
pub async fn check_preconfigured_node_route(
    state: web::Data<AppState>,
    query: web::Query<CheckPreconfiguredNodeQuery>,
) -> Result<HttpResponse, AppError> {
    let address = state.preconfigured_node()?;

    let summary = state
        .orchestrator
        .evaluate(address, query.baseline_configuration_name.as_deref(), PortOverrides::default())
        .await?;

    Ok(HttpResponse::Ok().json(summary))
}
