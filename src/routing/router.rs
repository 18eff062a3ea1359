//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Compile route configs (target, matchers, breaker)
//! - Look up matching route for request
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) pattern scan in priority order (acceptable for typical route counts)
//! - Explicit NoMatch rather than silent default
//! - First match wins; equal priorities keep config order

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use url::Url;

use crate::config::RouteConfig;
use crate::discovery::RouteInstanceConfig;
use crate::error::RouteError;
use crate::resilience::CircuitBreaker;
use crate::routing::matcher::{AndMatcher, AnyMatcher, HostMatcher, Matcher, PathPatternMatcher};

/// Scheme marking logical, load-balanced dispatch.
pub const LOAD_BALANCED_SCHEME: &str = "lb";

/// Where a route sends traffic: `lb://service-id` or `http(s)://host:port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTarget {
    scheme: String,
    host: String,
    port: Option<u16>,
}

impl RouteTarget {
    pub fn parse(uri: &str) -> Option<Self> {
        let url = Url::parse(uri).ok()?;
        let host = url.host_str().filter(|h| !h.is_empty())?.to_string();
        Some(Self {
            scheme: url.scheme().to_string(),
            port: url.port_or_known_default(),
            host,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host segment of the authority. For `lb` targets this is the service id.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn is_load_balanced(&self) -> bool {
        self.scheme.eq_ignore_ascii_case(LOAD_BALANCED_SCHEME)
    }

    /// Base URL for direct (non-`lb`) targets.
    pub fn base_url(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}", self.scheme, self.host, port),
            None => format!("{}://{}", self.scheme, self.host),
        }
    }
}

/// A compiled route.
#[derive(Debug)]
pub struct Route {
    pub id: String,
    pub target: RouteTarget,
    pub instances: Option<RouteInstanceConfig>,
    pub strip_prefix: usize,
    pub priority: u32,
    pub breaker: Option<Arc<CircuitBreaker>>,
    pub fallback_uri: Option<String>,
    matcher: AndMatcher,
}

impl Route {
    pub fn from_config(config: RouteConfig) -> Result<Self, RouteError> {
        let target =
            RouteTarget::parse(&config.uri).ok_or_else(|| RouteError::InvalidTargetUri {
                route_id: config.id.clone(),
                uri: config.uri.clone(),
            })?;

        let paths: Vec<Box<dyn Matcher>> = config
            .paths
            .iter()
            .map(|p| Box::new(PathPatternMatcher::new(p.as_str())) as Box<dyn Matcher>)
            .collect();
        let mut matchers: Vec<Box<dyn Matcher>> = vec![Box::new(AnyMatcher::new(paths))];
        if let Some(host) = &config.host {
            matchers.push(Box::new(HostMatcher::new(host.as_str())));
        }

        let instances = config
            .instances
            .map(|raw| RouteInstanceConfig::new(raw, Some(config.id.clone())));

        let (breaker, fallback_uri) = match &config.circuit_breaker {
            Some(cb) => (
                Some(Arc::new(CircuitBreaker::new(config.id.as_str(), cb))),
                cb.fallback_uri.clone(),
            ),
            None => (None, None),
        };

        Ok(Self {
            id: config.id,
            target,
            instances,
            strip_prefix: config.strip_prefix,
            priority: config.priority,
            breaker,
            fallback_uri,
            matcher: AndMatcher::new(matchers),
        })
    }

    pub fn matches(&self, req: &Request<Body>) -> bool {
        self.matcher.matches(req)
    }

    /// Drop the first `strip_prefix` segments from `path`.
    pub fn rewrite_path(&self, path: &str) -> String {
        if self.strip_prefix == 0 {
            return path.to_string();
        }
        let rest: Vec<&str> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .skip(self.strip_prefix)
            .collect();
        let mut rewritten = format!("/{}", rest.join("/"));
        if path.ends_with('/') && !rest.is_empty() {
            rewritten.push('/');
        }
        rewritten
    }
}

/// Immutable route table.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Arc<Route>>,
}

impl Router {
    pub fn from_config(configs: Vec<RouteConfig>) -> Result<Self, RouteError> {
        let mut routes = configs
            .into_iter()
            .map(|c| Route::from_config(c).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        // Stable: equal priorities keep config order.
        routes.sort_by(|a, b| b.priority.cmp(&a.priority));

        for route in &routes {
            tracing::debug!(
                route = %route.id,
                target = %route.target.base_url(),
                priority = route.priority,
                "Route compiled"
            );
        }

        Ok(Self { routes })
    }

    pub fn match_request(&self, req: &Request<Body>) -> Option<Arc<Route>> {
        self.routes.iter().find(|r| r.matches(req)).cloned()
    }

    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CircuitBreakerConfig;

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::default()).unwrap()
    }

    #[test]
    fn test_route_target() {
        let lb = RouteTarget::parse("lb://my-lb").unwrap();
        assert!(lb.is_load_balanced());
        assert_eq!(lb.host(), "my-lb");

        let direct = RouteTarget::parse("http://localhost:9000").unwrap();
        assert!(!direct.is_load_balanced());
        assert_eq!(direct.base_url(), "http://localhost:9000");

        let https = RouteTarget::parse("https://example.com").unwrap();
        assert_eq!(https.base_url(), "https://example.com:443");

        assert!(RouteTarget::parse("no scheme").is_none());
    }

    #[test]
    fn test_priority_and_order() {
        let mut catch_all = RouteConfig::new("catch-all", "http://localhost:1", vec!["/**".into()]);
        catch_all.priority = 0;
        let mut specific =
            RouteConfig::new("specific", "lb://my-lb", vec!["/just-cb/**".into()]);
        specific.priority = 10;

        let router = Router::from_config(vec![catch_all, specific]).unwrap();
        assert_eq!(router.match_request(&get("/just-cb/x")).unwrap().id, "specific");
        assert_eq!(router.match_request(&get("/other")).unwrap().id, "catch-all");
    }

    #[test]
    fn test_no_match() {
        let router = Router::from_config(vec![RouteConfig::new(
            "only",
            "lb://svc",
            vec!["/svc/**".into()],
        )])
        .unwrap();
        assert!(router.match_request(&get("/elsewhere")).is_none());
    }

    #[test]
    fn test_host_predicate() {
        let mut route = RouteConfig::new("hosted", "lb://svc", vec![]);
        route.host = Some("api.example.com".into());
        let router = Router::from_config(vec![route]).unwrap();

        let req = Request::builder()
            .uri("/anything")
            .header("Host", "api.example.com")
            .body(Body::default())
            .unwrap();
        assert!(router.match_request(&req).is_some());
        assert!(router.match_request(&get("/anything")).is_none());
    }

    #[test]
    fn test_rewrite_path() {
        let mut config = RouteConfig::new("r", "lb://svc", vec![]);
        config.strip_prefix = 1;
        let route = Route::from_config(config).unwrap();
        assert_eq!(route.rewrite_path("/just-cb/hello"), "/hello");
        assert_eq!(route.rewrite_path("/just-cb"), "/");
        assert_eq!(route.rewrite_path("/just-cb/a/b/"), "/a/b/");

        let route = Route::from_config(RouteConfig::new("r", "lb://svc", vec![])).unwrap();
        assert_eq!(route.rewrite_path("/keep/me"), "/keep/me");
    }

    #[test]
    fn test_breaker_attached() {
        let mut config = RouteConfig::new("guarded", "lb://svc", vec![]);
        config.circuit_breaker = Some(CircuitBreakerConfig {
            fallback_uri: Some("forward:/fallback".into()),
            ..Default::default()
        });
        let route = Route::from_config(config).unwrap();
        assert_eq!(route.breaker.as_ref().unwrap().name(), "guarded");
        assert_eq!(route.fallback_uri.as_deref(), Some("forward:/fallback"));
    }

    #[test]
    fn test_invalid_uri() {
        let err = Router::from_config(vec![RouteConfig::new("bad", "::::", vec![])]).unwrap_err();
        assert!(matches!(err, RouteError::InvalidTargetUri { .. }));
    }
}
