//! Read-only admin API.
//!
//! Lists registered services and instances and reports circuit breaker
//! state. Served on its own listener; see `AdminConfig`.

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/circuit-breakers", get(get_circuit_breakers))
        .route("/service-instances", get(list_services))
        .route("/service-instances/{service_id}", get(get_service_instances))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
