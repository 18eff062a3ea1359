use std::collections::BTreeSet;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::discovery::{DiscoveryClient, ServiceInstance};
use crate::http::server::AppState;
use crate::resilience::BreakerSnapshot;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub discovery: String,
    pub routes: usize,
    pub services: usize,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        discovery: state.registry.description().to_string(),
        routes: state.router.routes().len(),
        services: state.registry.len(),
    })
}

/// Known service ids, sorted.
pub async fn list_services(State(state): State<AppState>) -> Json<BTreeSet<String>> {
    Json(state.registry.get_service_ids())
}

/// Registered instances of one service. Unknown ids give an empty list.
pub async fn get_service_instances(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
) -> Json<Vec<ServiceInstance>> {
    Json(state.registry.get_instances(&service_id))
}

pub async fn get_circuit_breakers(State(state): State<AppState>) -> Json<Vec<BreakerSnapshot>> {
    let snapshots = state
        .router
        .routes()
        .iter()
        .filter_map(|route| route.breaker.as_ref())
        .map(|breaker| breaker.snapshot())
        .collect();
    Json(snapshots)
}
