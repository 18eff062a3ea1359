//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::discovery::ParseMode;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Route definitions.
    pub routes: Vec<RouteConfig>,

    /// Instance-list parsing.
    pub discovery: DiscoveryConfig,

    /// Per-request health probe settings.
    pub health_check: HealthCheckConfig,

    /// Instance selection.
    pub load_balancer: LoadBalancerConfig,

    /// Static degraded responses addressed by `forward:` URIs.
    pub fallbacks: Vec<FallbackConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Largest request body forwarded upstream, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// A route: predicates, a target and its filters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub id: String,

    /// Target URI. `lb://service-id` dispatches through discovery,
    /// `http(s)://host:port` forwards directly.
    pub uri: String,

    /// Path patterns (`/api/**`, `/users/*/orders`). Empty matches every path.
    #[serde(default)]
    pub paths: Vec<String>,

    /// Host header to match (exact match).
    #[serde(default)]
    pub host: Option<String>,

    /// `;`-separated backend instances registered for the target service.
    #[serde(default)]
    pub instances: Option<String>,

    /// Number of leading path segments removed before forwarding.
    #[serde(default)]
    pub strip_prefix: usize,

    /// Route priority (higher = checked first).
    #[serde(default)]
    pub priority: u32,

    /// Circuit breaker guarding this route.
    #[serde(default)]
    pub circuit_breaker: Option<CircuitBreakerConfig>,
}

impl RouteConfig {
    /// Route forwarding `paths` to `uri` with nothing else configured.
    pub fn new(id: impl Into<String>, uri: impl Into<String>, paths: Vec<String>) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
            paths,
            host: None,
            instances: None,
            strip_prefix: 0,
            priority: 0,
            circuit_breaker: None,
        }
    }
}

/// Circuit breaker settings for one route.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,

    /// Time spent open before a trial request is admitted, in milliseconds.
    pub cooldown_ms: u64,

    /// Trial requests admitted while half-open.
    pub half_open_max_calls: u32,

    /// Upstream statuses that count as failures.
    pub failure_status_codes: Vec<u16>,

    /// Degraded response, e.g. `forward:/fallback`.
    pub fallback_uri: Option<String>,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown_ms: 10_000,
            half_open_max_calls: 1,
            failure_status_codes: Vec::new(),
            fallback_uri: None,
        }
    }
}

/// Instance-list parsing configuration.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Token convention for every route's `instances` string.
    pub parse_mode: ParseMode,
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Probe instances before selection. When off, every registered
    /// instance is a candidate.
    pub enabled: bool,

    /// Health check timeout per probe in milliseconds.
    pub timeout_ms: u64,

    /// Path to probe for HTTP health checks.
    pub path: String,

    /// Per-service path overrides.
    pub paths: HashMap<String, String>,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 1_000,
            path: "/actuator/health".to_string(),
            paths: HashMap::new(),
        }
    }
}

/// Selection algorithm over healthy candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalancerStrategy {
    #[default]
    RoundRobin,
    Random,
}

/// Load balancer configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LoadBalancerConfig {
    pub strategy: LoadBalancerStrategy,
}

/// A static degraded response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FallbackConfig {
    /// Path named by `forward:` URIs.
    pub path: String,

    #[serde(default = "default_fallback_status")]
    pub status: u16,

    #[serde(default)]
    pub body: String,

    #[serde(default = "default_fallback_content_type")]
    pub content_type: String,
}

fn default_fallback_status() -> u16 {
    200
}

fn default_fallback_content_type() -> String {
    "text/plain; charset=utf-8".to_string()
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Deadline for one upstream exchange in seconds. Must leave room for
    /// health probes inside `request_secs`.
    pub upstream_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 25,
            request_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// Bearer token required by the admin API. Empty disables auth.
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
