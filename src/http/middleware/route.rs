//! Route matching middleware.
//!
//! Attaches the matched [`Route`] to the request extensions so later stages
//! (registration, proxying) agree on one routing decision. Unmatched
//! requests end here with a 404.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::GatewayError;
use crate::observability::metrics;
use crate::routing::{Route, Router};

#[derive(Debug, Clone)]
pub struct MatchedRoute(pub Arc<Route>);

pub async fn match_route(
    State(router): State<Arc<Router>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match router.match_request(&request) {
        Some(route) => {
            tracing::debug!(route = %route.id, path = %request.uri().path(), "Route matched");
            request.extensions_mut().insert(MatchedRoute(route));
            next.run(request).await
        }
        None => {
            let start = Instant::now();
            let path = request.uri().path().to_string();
            tracing::warn!(path = %path, "No route matched");
            metrics::record_request("none", request.method().as_str(), 404, start);
            GatewayError::NoRoute { path }.into_response()
        }
    }
}
