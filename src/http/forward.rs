//! Upstream forwarding.
//!
//! # Responsibilities
//! - Buffer the client body (bounded by the router's `DefaultBodyLimit`)
//! - Rebuild the request against the chosen instance or direct target
//! - Stream the upstream response back to the client
//!
//! # Design Decisions
//! - One pooled `reqwest::Client` for all upstreams, `https` instances included
//! - The upstream deadline (`timeouts.upstream_secs`) expires inside the
//!   request deadline, so a hung instance surfaces as an upstream error
//! - Hop-by-hop headers are dropped in both directions
//! - The caller inspects the upstream status before it becomes a response,
//!   so the circuit breaker can count it

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::FromRequest,
    http::{header, request::Parts, HeaderMap, HeaderName, HeaderValue, Request},
    response::Response,
};

use crate::config::TimeoutConfig;
use crate::error::GatewayError;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
    headers.remove("keep-alive");
}

/// Target URL for `base_url` + rewritten path + original query.
pub fn upstream_url(base_url: &str, path: &str, query: Option<&str>) -> String {
    match query {
        Some(q) if !q.is_empty() => format!("{base_url}{path}?{q}"),
        _ => format!("{base_url}{path}"),
    }
}

#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.upstream_secs))
            .no_proxy()
            .build()?;
        Ok(Self { client })
    }

    /// Split `request` and read its whole body. Extensions are consumed.
    pub async fn read_body(&self, request: Request<Body>) -> Result<(Parts, Bytes), GatewayError> {
        let (mut parts, body) = request.into_parts();
        let mut buffered = Request::new(body);
        // The body limit travels as an extension.
        *buffered.extensions_mut() = std::mem::take(&mut parts.extensions);
        let bytes = Bytes::from_request(buffered, &()).await?;
        Ok((parts, bytes))
    }

    /// Send the request described by `parts` and `body` to `url`.
    pub async fn send(
        &self,
        url: &str,
        parts: &Parts,
        body: Bytes,
        client_addr: Option<SocketAddr>,
    ) -> Result<reqwest::Response, GatewayError> {
        let mut headers = parts.headers.clone();
        strip_hop_by_hop(&mut headers);
        headers.remove(header::HOST);
        if let Some(addr) = client_addr {
            let forwarded = match headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
                Some(existing) => format!("{existing}, {}", addr.ip()),
                None => addr.ip().to_string(),
            };
            if let Ok(value) = HeaderValue::from_str(&forwarded) {
                headers.insert(X_FORWARDED_FOR, value);
            }
        }

        let response = self
            .client
            .request(parts.method.clone(), url)
            .headers(headers)
            .body(body)
            .send()
            .await?;
        Ok(response)
    }

    /// Stream an upstream response back to the client.
    pub fn into_response(upstream: reqwest::Response) -> Response {
        let status = upstream.status();
        let mut headers = upstream.headers().clone();
        strip_hop_by_hop(&mut headers);

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::DefaultBodyLimit, http::StatusCode};
    use std::convert::Infallible;
    use tower::{ServiceBuilder, ServiceExt};

    #[test]
    fn test_upstream_url() {
        assert_eq!(
            upstream_url("http://localhost:8090", "/hello", None),
            "http://localhost:8090/hello"
        );
        assert_eq!(
            upstream_url("https://localhost:8443", "/a", Some("x=1")),
            "https://localhost:8443/a?x=1"
        );
        assert_eq!(upstream_url("http://h:1", "/", Some("")), "http://h:1/");
    }

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
        strip_hop_by_hop(&mut headers);
        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key(header::ACCEPT));
    }

    async fn read_status(body: Body) -> StatusCode {
        let forwarder = Forwarder::new(&TimeoutConfig::default()).unwrap();
        let service = ServiceBuilder::new()
            .layer(DefaultBodyLimit::max(4))
            .service_fn(move |request: Request<Body>| {
                let forwarder = forwarder.clone();
                async move {
                    let status = match forwarder.read_body(request).await {
                        Ok(_) => StatusCode::OK,
                        Err(e) => e.status_code(),
                    };
                    Ok::<_, Infallible>(status)
                }
            });
        service.oneshot(Request::new(body)).await.unwrap()
    }

    #[tokio::test]
    async fn test_body_limit() {
        assert_eq!(read_status(Body::from("abcd")).await, StatusCode::OK);
        assert_eq!(
            read_status(Body::from("abcde")).await,
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[tokio::test]
    async fn test_broken_client_body_is_bad_request() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"ab")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ];
        let body = Body::from_stream(futures_util::stream::iter(chunks));
        assert_eq!(read_status(body).await, StatusCode::BAD_REQUEST);
    }
}
