//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (requests, latency, registration, probes, breakers)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by route, method, status
//! - `gateway_request_duration_seconds` (histogram): latency by route
//! - `gateway_instances_registered_total` (counter): inserts by service
//! - `gateway_registration_rejected_total` (counter): bad instance lists by route
//! - `gateway_health_probes_total` (counter): probe results by service
//! - `gateway_circuit_breaker_state` (gauge): 0=closed, 1=half_open, 2=open
//! - `gateway_fallbacks_total` (counter): fallback responses by route, reason
//!
//! # Design Decisions
//! - Uses the `metrics` facade; without an installed recorder every call is a no-op
//! - Labels for route, service, status code

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::resilience::CircuitState;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &str, method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "route" => route.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("gateway_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_registration(service_id: &str, added: usize) {
    if added > 0 {
        metrics::counter!("gateway_instances_registered_total", "service" => service_id.to_string())
            .increment(added as u64);
    }
}

pub fn record_registration_rejected(route: &str) {
    metrics::counter!("gateway_registration_rejected_total", "route" => route.to_string())
        .increment(1);
}

pub fn record_health_probe(service_id: &str, healthy: bool) {
    let result = if healthy { "up" } else { "down" };
    metrics::counter!(
        "gateway_health_probes_total",
        "service" => service_id.to_string(),
        "result" => result
    )
    .increment(1);
}

pub fn record_breaker_state(breaker: &str, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    };
    metrics::gauge!("gateway_circuit_breaker_state", "breaker" => breaker.to_string()).set(value);
}

pub fn record_fallback(route: &str, reason: &'static str) {
    metrics::counter!(
        "gateway_fallbacks_total",
        "route" => route.to_string(),
        "reason" => reason
    )
    .increment(1);
}
