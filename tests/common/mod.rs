//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use lb_gateway::config::GatewayConfig;
use lb_gateway::discovery::InstanceRegistry;
use lb_gateway::http::HttpServer;
use lb_gateway::lifecycle::Shutdown;
use tokio::net::TcpListener;

/// A local backend with a switchable health endpoint.
#[derive(Clone)]
pub struct TestBackend {
    pub addr: SocketAddr,
    pub up: Arc<AtomicBool>,
    pub health_hits: Arc<AtomicUsize>,
    pub hits: Arc<AtomicUsize>,
}

impl TestBackend {
    pub fn set_up(&self, up: bool) {
        self.up.store(up, Ordering::SeqCst);
    }

    pub fn health_hits(&self) -> usize {
        self.health_hits.load(Ordering::SeqCst)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// `host:port` token for a route's instance list.
    pub fn token(&self) -> String {
        self.addr.to_string()
    }
}

#[derive(Clone)]
struct BackendState {
    name: &'static str,
    backend: TestBackend,
}

async fn health(State(state): State<BackendState>) -> (StatusCode, &'static str) {
    state.backend.health_hits.fetch_add(1, Ordering::SeqCst);
    if state.backend.up.load(Ordering::SeqCst) {
        (StatusCode::OK, r#"{"status":"UP"}"#)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, r#"{"status":"DOWN"}"#)
    }
}

async fn fail(State(state): State<BackendState>) -> StatusCode {
    state.backend.hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn slow(State(state): State<BackendState>) -> &'static str {
    state.backend.hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(10)).await;
    state.name
}

async fn respond(State(state): State<BackendState>) -> &'static str {
    state.backend.hits.fetch_add(1, Ordering::SeqCst);
    state.name
}

/// Start a backend answering every path with `name`, except
/// `/actuator/health`, `/fail` (always 500) and `/slow` (answers after 10s).
pub async fn start_backend(name: &'static str) -> TestBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let backend = TestBackend {
        addr: listener.local_addr().unwrap(),
        up: Arc::new(AtomicBool::new(true)),
        health_hits: Arc::new(AtomicUsize::new(0)),
        hits: Arc::new(AtomicUsize::new(0)),
    };

    let app = Router::new()
        .route("/actuator/health", get(health))
        .route("/fail", get(fail))
        .route("/slow", get(slow))
        .fallback(respond)
        .with_state(BackendState {
            name,
            backend: backend.clone(),
        });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    backend
}

/// A local port with nothing listening on it.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// A running gateway plus its admin API, both on ephemeral ports.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub admin_addr: SocketAddr,
    pub registry: Arc<InstanceRegistry>,
    pub shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn admin_url(&self, path: &str) -> String {
        format!("http://{}{}", self.admin_addr, path)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_gateway(config: GatewayConfig) -> TestGateway {
    let server = HttpServer::new(config).unwrap();
    let registry = server.registry();
    let admin = server.admin_router();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let admin_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let admin_addr = admin_listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    tokio::spawn(async move {
        let _ = axum::serve(admin_listener, admin).await;
    });

    TestGateway {
        addr,
        admin_addr,
        registry,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// `host:port` instance list for `backends`.
pub fn instance_list(backends: &[&TestBackend]) -> String {
    backends
        .iter()
        .map(|b| b.token())
        .collect::<Vec<_>>()
        .join(";")
}
