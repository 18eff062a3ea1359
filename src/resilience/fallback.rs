//! Fallback responses.
//!
//! Routes name a fallback with `forward:/path`. The path selects one of the
//! statically configured degraded responses.

use std::collections::HashMap;

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::Response,
};

use crate::config::FallbackConfig;

/// Header marking responses served by a fallback.
pub const X_GATEWAY_FALLBACK: &str = "x-gateway-fallback";

const FORWARD_SCHEME: &str = "forward:";

/// Extract the local path from a `forward:/path` URI.
pub fn forward_path(uri: &str) -> Option<&str> {
    uri.strip_prefix(FORWARD_SCHEME)
        .map(str::trim)
        .filter(|path| path.starts_with('/'))
}

#[derive(Debug, Clone)]
struct FallbackResponse {
    status: StatusCode,
    body: String,
    content_type: String,
}

/// Degraded responses keyed by path.
#[derive(Debug, Clone, Default)]
pub struct Fallbacks {
    by_path: HashMap<String, FallbackResponse>,
}

impl Fallbacks {
    pub fn from_config(configs: &[FallbackConfig]) -> Self {
        let by_path = configs
            .iter()
            .map(|c| {
                let status = StatusCode::from_u16(c.status).unwrap_or_else(|_| {
                    tracing::warn!(path = %c.path, status = c.status, "Invalid fallback status, using 200");
                    StatusCode::OK
                });
                (
                    c.path.clone(),
                    FallbackResponse {
                        status,
                        body: c.body.clone(),
                        content_type: c.content_type.clone(),
                    },
                )
            })
            .collect();
        Self { by_path }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }

    /// Build the response for `forward_uri`, tagged with the route that used it.
    pub fn respond(&self, forward_uri: &str, route_id: &str) -> Option<Response> {
        let path = forward_path(forward_uri)?;
        let fallback = self.by_path.get(path)?;

        let mut response = Response::new(Body::from(fallback.body.clone()));
        *response.status_mut() = fallback.status;
        if let Ok(value) = HeaderValue::from_str(&fallback.content_type) {
            response.headers_mut().insert(header::CONTENT_TYPE, value);
        }
        if let Ok(value) = HeaderValue::from_str(route_id) {
            response.headers_mut().insert(X_GATEWAY_FALLBACK, value);
        }
        Some(response)
    }
}
