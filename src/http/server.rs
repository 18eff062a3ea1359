//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler
//! - Wire up middleware (tracing, request ID, timeout, route matching,
//!   instance registration)
//! - Run the circuit-breaker guarded select-and-forward pipeline
//! - Serve the admin API next to the gateway listener
//!
//! # Data Flow
//! ```text
//! request → match_route → register_instances → proxy_handler
//!     proxy_handler:
//!         breaker admits? ── no ──→ fallback / 503
//!              │ yes
//!         supplier.get (health probes) → selector → forwarder
//!              │
//!         failure? ── yes ──→ breaker.failure → fallback / error
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, DefaultBodyLimit, Extension, State},
    http::{request::Parts, Request},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::config::GatewayConfig;
use crate::discovery::{DiscoveryClient, InstanceRegistry};
use crate::error::{GatewayError, ServerError};
use crate::health::{HealthCheckedInstanceSupplier, HealthProbe, HttpHealthProbe};
use crate::http::forward::{upstream_url, Forwarder};
use crate::http::middleware::{match_route, register_instances, MatchedRoute, RegistrationFilter};
use crate::http::request::{request_id, GatewayRequestId};
use crate::load_balancer::SelectorPool;
use crate::observability::metrics;
use crate::resilience::Fallbacks;
use crate::routing::{Route, Router as GatewayRouter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub router: Arc<GatewayRouter>,
    pub registry: Arc<InstanceRegistry>,
    pub registration: Arc<RegistrationFilter>,
    pub supplier: Arc<HealthCheckedInstanceSupplier>,
    pub selectors: Arc<SelectorPool>,
    pub forwarder: Forwarder,
    pub fallbacks: Arc<Fallbacks>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        let probe = Arc::new(HttpHealthProbe::new(&config.health_check)?);
        Self::with_health_probe(config, probe)
    }

    /// Create a server whose supplier uses `probe` for liveness checks.
    pub fn with_health_probe(
        config: GatewayConfig,
        probe: Arc<dyn HealthProbe>,
    ) -> Result<Self, ServerError> {
        let router = Arc::new(GatewayRouter::from_config(config.routes.clone())?);
        let registry = Arc::new(InstanceRegistry::new());
        let discovery: Arc<dyn DiscoveryClient> = registry.clone();

        let state = AppState {
            router,
            registration: Arc::new(RegistrationFilter::new(
                registry.clone(),
                config.discovery.parse_mode,
            )),
            supplier: Arc::new(HealthCheckedInstanceSupplier::new(
                discovery,
                probe,
                &config.health_check,
            )),
            selectors: Arc::new(SelectorPool::new(config.load_balancer.strategy)),
            forwarder: Forwarder::new(&config.timeouts)?,
            fallbacks: Arc::new(Fallbacks::from_config(&config.fallbacks)),
            registry,
            config: Arc::new(config),
        };

        let router = Self::build_router(state.clone());
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let request_secs = state.config.timeouts.request_secs;
        let max_body_bytes = state.config.listener.max_body_bytes;
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .layer(middleware::from_fn_with_state(
                state.registration.clone(),
                register_instances,
            ))
            .layer(middleware::from_fn_with_state(state.router.clone(), match_route))
            .with_state(state)
            .layer(DefaultBodyLimit::max(max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id(request.headers()),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(GatewayRequestId))
    }

    /// Admin API router sharing this server's state.
    pub fn admin_router(&self) -> Router {
        setup_admin_router(self.state.clone())
    }

    /// Shared instance registry.
    pub fn registry(&self) -> Arc<InstanceRegistry> {
        self.state.registry.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.state.config
    }

    /// Run the server until `shutdown` fires. Starts the admin API on its
    /// configured address when enabled.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.state.router.routes().len(),
            "HTTP server starting"
        );

        if self.state.config.admin.enabled {
            let admin_listener = TcpListener::bind(&self.state.config.admin.bind_address).await?;
            tracing::info!(address = %admin_listener.local_addr()?, "Admin API listening");
            let admin = self.admin_router();
            let mut admin_shutdown = shutdown.resubscribe();
            tokio::spawn(async move {
                let result = axum::serve(admin_listener, admin)
                    .with_graceful_shutdown(async move {
                        let _ = admin_shutdown.recv().await;
                    })
                    .await;
                if let Err(e) = result {
                    tracing::error!(error = %e, "Admin API stopped with error");
                }
            });
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        // Serve with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
/// Runs the matched route through its breaker, selection and forwarding.
async fn proxy_handler(
    State(state): State<AppState>,
    Extension(MatchedRoute(route)): Extension<MatchedRoute>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let id = request_id(request.headers()).to_string();

    let response = match dispatch(&state, &route, request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(request_id = %id, route = %route.id, error = %e, "Request failed");
            e.into_response()
        }
    };

    metrics::record_request(&route.id, method.as_str(), response.status().as_u16(), start);
    response
}

async fn dispatch(
    state: &AppState,
    route: &Route,
    request: Request<Body>,
) -> Result<Response, GatewayError> {
    let permit = match &route.breaker {
        Some(breaker) => match breaker.try_acquire() {
            Some(permit) => Some(permit),
            None => {
                return divert(state, route, "circuit_open").ok_or_else(|| {
                    GatewayError::CircuitOpen {
                        route_id: route.id.clone(),
                    }
                });
            }
        },
        None => None,
    };

    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    // Unreadable client bodies are not upstream failures; the permit is
    // released on drop without an outcome.
    let (parts, body) = state.forwarder.read_body(request).await?;

    match select_and_forward(state, route, &parts, body, client_addr).await {
        Ok(upstream) => {
            let status = upstream.status().as_u16();
            let failed = route
                .breaker
                .as_ref()
                .is_some_and(|breaker| breaker.is_failure_status(status));
            if failed {
                if let Some(permit) = permit {
                    permit.failure();
                }
                if let Some(response) = divert(state, route, "failure_status") {
                    return Ok(response);
                }
            } else if let Some(permit) = permit {
                permit.success();
            }
            Ok(Forwarder::into_response(upstream))
        }
        Err(e) => {
            if let Some(permit) = permit {
                permit.failure();
            }
            divert(state, route, e.fallback_reason()).ok_or(e)
        }
    }
}

/// Pick the upstream for `route` and send the request there.
async fn select_and_forward(
    state: &AppState,
    route: &Route,
    parts: &Parts,
    body: axum::body::Bytes,
    client_addr: Option<SocketAddr>,
) -> Result<reqwest::Response, GatewayError> {
    let base_url = if route.target.is_load_balanced() {
        let service_id = route.target.host();
        let candidates = state.supplier.get(service_id).await;
        let instance = state
            .selectors
            .choose(service_id, &candidates)
            .ok_or_else(|| GatewayError::NoAvailableInstance {
                service_id: service_id.to_string(),
            })?;
        tracing::debug!(
            route = %route.id,
            instance = %instance,
            candidates = candidates.len(),
            "Instance selected"
        );
        instance.uri()
    } else {
        route.target.base_url()
    };

    let path = route.rewrite_path(parts.uri.path());
    let url = upstream_url(&base_url, &path, parts.uri.query());
    state.forwarder.send(&url, parts, body, client_addr).await
}

/// The route's fallback response, if it has one.
fn divert(state: &AppState, route: &Route, reason: &'static str) -> Option<Response> {
    let forward_uri = route.fallback_uri.as_deref()?;
    let response = state.fallbacks.respond(forward_uri, &route.id)?;
    tracing::info!(route = %route.id, fallback = %forward_uri, reason, "Serving fallback");
    metrics::record_fallback(&route.id, reason);
    Some(response)
}
