//! lb-gateway
//!
//! A load-balancing gateway whose backend instances are declared inline on
//! the routes that use them.
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌──────────────────────────────────────────────────────────┐
//!                   │                        GATEWAY                           │
//!   Client Request  │  ┌─────────┐   ┌──────────────┐   ┌──────────────────┐   │
//!   ────────────────┼─▶│ routing │──▶│ registration │──▶│ circuit breaker  │   │
//!                   │  │ matcher │   │   filter     │   │  (per route)     │   │
//!                   │  └─────────┘   └──────┬───────┘   └────────┬─────────┘   │
//!                   │                       │ add_instance       │ admitted    │
//!                   │                       ▼                    ▼             │
//!                   │               ┌──────────────┐   ┌──────────────────┐    │
//!                   │               │  instance    │◀──│ health-checked   │    │
//!                   │               │  registry    │   │ supplier (probes)│    │
//!                   │               └──────────────┘   └────────┬─────────┘    │
//!                   │                                           ▼             │
//!   Client Response │  ┌───────────┐                   ┌──────────────────┐    │
//!   ◀───────────────┼──│ forwarder │◀──────────────────│  load balancer   │    │
//!                   │  └───────────┘                   └──────────────────┘    │
//!                   │        │ failure / open breaker → fallback response      │
//!                   └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use lb_gateway::config::{load_config, GatewayConfig};
use lb_gateway::lifecycle::{spawn_signal_handler, Shutdown};
use lb_gateway::observability::{logging, metrics};
use lb_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "lb-gateway")]
#[command(about = "Load-balancing gateway with route-configured instances", long_about = None)]
struct Args {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "lb-gateway starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        parse_mode = %config.discovery.parse_mode,
        health_checks = config.health_check.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_handler(&shutdown);

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
