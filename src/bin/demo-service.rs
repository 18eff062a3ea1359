//! Demo backend for exercising the gateway by hand.
//!
//! Run several on different ports, list them as a route's `instances`, then
//! flip one down with `PUT /status/false` and watch the gateway skip it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use clap::Parser;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use lb_gateway::config::ObservabilityConfig;
use lb_gateway::lifecycle::wait_for_shutdown_signal;
use lb_gateway::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "demo-service")]
struct Args {
    #[arg(short, long, default_value_t = 8090)]
    port: u16,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,
}

#[derive(Clone)]
struct DemoState {
    port: u16,
    up: Arc<AtomicBool>,
}

async fn hello(State(state): State<DemoState>) -> Json<Value> {
    Json(json!({ "message": format!("hello world from port {}!", state.port) }))
}

async fn health(State(state): State<DemoState>) -> (StatusCode, Json<Value>) {
    if state.up.load(Ordering::Relaxed) {
        (StatusCode::OK, Json(json!({ "status": "UP" })))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "DOWN" })))
    }
}

async fn set_status(State(state): State<DemoState>, Path(is_up): Path<bool>) -> Json<Value> {
    state.up.store(is_up, Ordering::Relaxed);
    tracing::info!(port = state.port, up = is_up, "Health switched");
    Json(json!({ "up": is_up }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    init_logging(&ObservabilityConfig::default());

    let state = DemoState {
        port: args.port,
        up: Arc::new(AtomicBool::new(true)),
    };
    let app = Router::new()
        .route("/hello", get(hello))
        .route("/actuator/health", get(health))
        .route("/status/{is_up}", put(set_status))
        .with_state(state);

    let listener = TcpListener::bind((args.host.as_str(), args.port)).await?;
    tracing::info!(address = %listener.local_addr()?, "demo-service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await?;
    Ok(())
}
