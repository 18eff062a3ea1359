//! Route-driven instance registration.
//!
//! # Responsibilities
//! - Materialize a route's configured `instances` into the shared registry
//! - Run on every proxied request, before instance selection
//!
//! # Design Decisions
//! - Only `lb://` routes register; the target host is the service id
//! - Re-running is harmless: the registry drops instances it already holds
//! - A malformed instance list registers nothing and never blocks the request

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::discovery::{InstanceRegistry, ParseMode};
use crate::error::ConfigurationError;
use crate::http::middleware::route::MatchedRoute;
use crate::observability::metrics;
use crate::routing::Route;

/// What one filter run did.
#[derive(Debug)]
pub enum RegistrationOutcome {
    /// Route has no instance list or is not load balanced.
    Skipped,
    /// Instances parsed; `added` of them were new to the registry.
    Registered { added: usize },
    /// Instance list is malformed; nothing was registered.
    Rejected(ConfigurationError),
}

#[derive(Debug)]
pub struct RegistrationFilter {
    registry: Arc<InstanceRegistry>,
    parse_mode: ParseMode,
}

impl RegistrationFilter {
    pub fn new(registry: Arc<InstanceRegistry>, parse_mode: ParseMode) -> Self {
        Self {
            registry,
            parse_mode,
        }
    }

    pub fn apply(&self, route: &Route) -> RegistrationOutcome {
        let config = match &route.instances {
            Some(config) if !config.is_empty() => config,
            _ => return RegistrationOutcome::Skipped,
        };
        if !route.target.is_load_balanced() {
            return RegistrationOutcome::Skipped;
        }

        let service_id = route.target.host();
        match config.service_instances(service_id, self.parse_mode) {
            Ok(instances) => {
                let added = instances
                    .into_iter()
                    .map(|instance| self.registry.add_instance(instance))
                    .filter(|inserted| *inserted)
                    .count();
                RegistrationOutcome::Registered { added }
            }
            Err(e) => RegistrationOutcome::Rejected(e),
        }
    }
}

/// Axum middleware applying the filter to the matched route.
pub async fn register_instances(
    State(filter): State<Arc<RegistrationFilter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if let Some(MatchedRoute(route)) = request.extensions().get::<MatchedRoute>() {
        match filter.apply(route) {
            RegistrationOutcome::Skipped => {}
            RegistrationOutcome::Registered { added } => {
                if added > 0 {
                    tracing::info!(
                        route = %route.id,
                        service_id = %route.target.host(),
                        added,
                        "Registered route instances"
                    );
                }
                metrics::record_registration(route.target.host(), added);
            }
            RegistrationOutcome::Rejected(e) => {
                tracing::warn!(route = %route.id, error = %e, "Route instance list rejected");
                metrics::record_registration_rejected(&route.id);
            }
        }
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteConfig;

    fn route(uri: &str, instances: Option<&str>) -> Route {
        let mut config = RouteConfig::new("just-cb", uri, vec!["/just-cb/**".into()]);
        config.instances = instances.map(str::to_string);
        Route::from_config(config).unwrap()
    }

    fn filter() -> (Arc<InstanceRegistry>, RegistrationFilter) {
        let registry = Arc::new(InstanceRegistry::new());
        let filter = RegistrationFilter::new(registry.clone(), ParseMode::HostPort);
        (registry, filter)
    }

    #[test]
    fn test_registers_route_instances_in_order() {
        let (registry, filter) = filter();
        let route = route(
            "lb://my-lb",
            Some("localhost:8090;localhost:8091;localhost:8092"),
        );

        assert!(matches!(
            filter.apply(&route),
            RegistrationOutcome::Registered { added: 3 }
        ));

        let instances = registry.get_instances("my-lb");
        let summary: Vec<(&str, u16, bool)> = instances
            .iter()
            .map(|i| (i.instance_id(), i.port(), i.secure()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("my-lb-1", 8090, false),
                ("my-lb-2", 8091, false),
                ("my-lb-3", 8092, false),
            ]
        );
    }

    #[test]
    fn test_repeated_runs_do_not_grow_registry() {
        let (registry, filter) = filter();
        let route = route("lb://my-lb", Some("localhost:8090;localhost:8091"));

        filter.apply(&route);
        for _ in 0..10 {
            assert!(matches!(
                filter.apply(&route),
                RegistrationOutcome::Registered { added: 0 }
            ));
        }
        assert_eq!(registry.get_instances("my-lb").len(), 2);
    }

    #[test]
    fn test_skips_without_instances_or_lb_scheme() {
        let (registry, filter) = filter();

        assert!(matches!(
            filter.apply(&route("lb://my-lb", None)),
            RegistrationOutcome::Skipped
        ));
        assert!(matches!(
            filter.apply(&route("lb://my-lb", Some("  "))),
            RegistrationOutcome::Skipped
        ));
        assert!(matches!(
            filter.apply(&route("http://my-lb:9000", Some("localhost:8090"))),
            RegistrationOutcome::Skipped
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_malformed_list_registers_nothing() {
        let (registry, filter) = filter();
        let route = route("lb://my-lb", Some("localhost:8090;localhost:notaport"));

        assert!(matches!(
            filter.apply(&route),
            RegistrationOutcome::Rejected(ConfigurationError::InvalidPort { .. })
        ));
        assert!(registry.get_instances("my-lb").is_empty());
    }

    #[test]
    fn test_uri_mode_marks_secure_instances() {
        let registry = Arc::new(InstanceRegistry::new());
        let filter = RegistrationFilter::new(registry.clone(), ParseMode::Uri);
        let route = route("lb://my-lb", Some("https://localhost:8443;http://localhost:8080"));

        filter.apply(&route);
        let instances = registry.get_instances("my-lb");
        assert!(instances[0].secure());
        assert!(!instances[1].secure());
    }
}
