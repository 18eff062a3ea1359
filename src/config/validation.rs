//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes reference existing fallbacks)
//! - Validate value ranges (thresholds > 0, timeouts > 0)
//! - Reject instance lists that could never register
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::discovery::parse_instances;
use crate::error::ConfigurationError;
use crate::resilience::fallback::forward_path;
use crate::routing::router::RouteTarget;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("route #{index} has an empty id")]
    EmptyRouteId { index: usize },

    #[error("route id `{0}` is defined more than once")]
    DuplicateRouteId(String),

    #[error("route `{route_id}` has an invalid uri `{uri}`")]
    InvalidRouteUri { route_id: String, uri: String },

    #[error("route `{route_id}` has an invalid path pattern `{pattern}`")]
    InvalidPathPattern { route_id: String, pattern: String },

    #[error("route `{route_id}` has invalid instances: {source}")]
    InvalidInstances {
        route_id: String,
        #[source]
        source: ConfigurationError,
    },

    #[error("route `{route_id}` circuit breaker: {reason}")]
    InvalidCircuitBreaker {
        route_id: String,
        reason: &'static str,
    },

    #[error("route `{route_id}` references unknown fallback `{fallback_uri}`")]
    UnknownFallback {
        route_id: String,
        fallback_uri: String,
    },

    #[error("fallback path `{0}` must start with '/'")]
    InvalidFallbackPath(String),

    #[error("health check: {0}")]
    InvalidHealthCheck(&'static str),

    #[error("timeouts: {0}")]
    InvalidTimeouts(&'static str),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.health_check.enabled && config.health_check.timeout_ms == 0 {
        errors.push(ValidationError::InvalidHealthCheck(
            "timeout_ms must be greater than zero",
        ));
    }
    if !config.health_check.path.starts_with('/') {
        errors.push(ValidationError::InvalidHealthCheck("path must start with '/'"));
    }

    let timeouts = &config.timeouts;
    if timeouts.upstream_secs == 0 {
        errors.push(ValidationError::InvalidTimeouts(
            "upstream_secs must be greater than zero",
        ));
    }
    // Probes and the upstream exchange run back to back inside one request.
    let probe_ms = if config.health_check.enabled {
        config.health_check.timeout_ms
    } else {
        0
    };
    let inner_ms = timeouts.upstream_secs.saturating_mul(1000).saturating_add(probe_ms);
    if inner_ms >= timeouts.request_secs.saturating_mul(1000) {
        errors.push(ValidationError::InvalidTimeouts(
            "upstream_secs plus health_check.timeout_ms must be less than request_secs",
        ));
    }

    let mut fallback_paths = HashSet::new();
    for fallback in &config.fallbacks {
        if !fallback.path.starts_with('/') {
            errors.push(ValidationError::InvalidFallbackPath(fallback.path.clone()));
        }
        fallback_paths.insert(fallback.path.as_str());
    }

    let mut seen = HashSet::new();
    for (index, route) in config.routes.iter().enumerate() {
        if route.id.trim().is_empty() {
            errors.push(ValidationError::EmptyRouteId { index });
        } else if !seen.insert(route.id.as_str()) {
            errors.push(ValidationError::DuplicateRouteId(route.id.clone()));
        }

        for pattern in &route.paths {
            if !pattern.starts_with('/') {
                errors.push(ValidationError::InvalidPathPattern {
                    route_id: route.id.clone(),
                    pattern: pattern.clone(),
                });
            }
        }

        let target = match RouteTarget::parse(&route.uri) {
            Some(target) => target,
            None => {
                errors.push(ValidationError::InvalidRouteUri {
                    route_id: route.id.clone(),
                    uri: route.uri.clone(),
                });
                continue;
            }
        };

        if let Some(instances) = route.instances.as_deref() {
            if target.is_load_balanced() && !instances.trim().is_empty() {
                if let Err(source) =
                    parse_instances(instances, target.host(), config.discovery.parse_mode)
                {
                    errors.push(ValidationError::InvalidInstances {
                        route_id: route.id.clone(),
                        source,
                    });
                }
            }
        }

        if let Some(cb) = &route.circuit_breaker {
            if cb.failure_threshold == 0 {
                errors.push(ValidationError::InvalidCircuitBreaker {
                    route_id: route.id.clone(),
                    reason: "failure_threshold must be greater than zero",
                });
            }
            if cb.half_open_max_calls == 0 {
                errors.push(ValidationError::InvalidCircuitBreaker {
                    route_id: route.id.clone(),
                    reason: "half_open_max_calls must be greater than zero",
                });
            }
            if let Some(fallback_uri) = &cb.fallback_uri {
                let known = forward_path(fallback_uri)
                    .map(|path| fallback_paths.contains(path))
                    .unwrap_or(false);
                if !known {
                    errors.push(ValidationError::UnknownFallback {
                        route_id: route.id.clone(),
                        fallback_uri: fallback_uri.clone(),
                    });
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
