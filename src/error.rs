//! Error types shared across the gateway.

use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// A route's instance list could not be parsed.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("instance token #{position} is empty")]
    EmptyToken { position: usize },

    #[error("instance token `{token}` has no port")]
    MissingPort { token: String },

    #[error("instance token `{token}` has an invalid port")]
    InvalidPort { token: String },

    #[error("instance token `{token}` has no host")]
    MissingHost { token: String },

    #[error("instance token `{token}` is not a valid URI: {source}")]
    InvalidUri {
        token: String,
        #[source]
        source: url::ParseError,
    },
}

/// A route could not be compiled.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route `{route_id}` has an invalid target uri `{uri}`")]
    InvalidTargetUri { route_id: String, uri: String },
}

/// Failures on the request path.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no route matches {path}")]
    NoRoute { path: String },

    #[error("no available instance for service `{service_id}`")]
    NoAvailableInstance { service_id: String },

    #[error("circuit breaker for route `{route_id}` is open")]
    CircuitOpen { route_id: String },

    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("failed to read request body: {0}")]
    Body(#[from] BytesRejection),
}

/// Failures while assembling the server from configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Routes(#[from] RouteError),

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::NoRoute { .. } => StatusCode::NOT_FOUND,
            GatewayError::NoAvailableInstance { .. } | GatewayError::CircuitOpen { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            GatewayError::Upstream(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
            // 413 past the body limit, 400 when the client stream broke.
            GatewayError::Body(rejection) => rejection.status(),
        }
    }

    /// Metric label used when this error is answered by a fallback.
    pub fn fallback_reason(&self) -> &'static str {
        match self {
            GatewayError::NoAvailableInstance { .. } => "no_available_instance",
            GatewayError::CircuitOpen { .. } => "circuit_open",
            GatewayError::Upstream(_) => "upstream_error",
            _ => "error",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "status": status.as_u16(),
            "error": status.canonical_reason().unwrap_or("error"),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let err = GatewayError::NoAvailableInstance {
            service_id: "my-lb".into(),
        };
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_string(), "no available instance for service `my-lb`");

        let err = GatewayError::NoRoute { path: "/x".into() };
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

        let err = GatewayError::CircuitOpen {
            route_id: "just-cb".into(),
        };
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
