//! Health-checked candidate supplier.
//!
//! # Responsibilities
//! - Fetch the registered instances for a service
//! - Probe them concurrently, each under its own timeout
//! - Return the ones that answered healthy, in registration order
//!
//! # Design Decisions
//! - Probes are joined inside the caller's future. Dropping the request
//!   cancels them, and nothing is spawned that could outlive it
//! - Exclusion is per request; the registry is never modified here
//! - An empty result is not an error; the caller decides what it means

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::discovery::{DiscoveryClient, ServiceInstance};
use crate::health::probe::{HealthProbe, ProbeError};
use crate::observability::metrics;

pub struct HealthCheckedInstanceSupplier {
    discovery: Arc<dyn DiscoveryClient>,
    probe: Arc<dyn HealthProbe>,
    timeout: Duration,
    enabled: bool,
}

impl HealthCheckedInstanceSupplier {
    pub fn new(
        discovery: Arc<dyn DiscoveryClient>,
        probe: Arc<dyn HealthProbe>,
        config: &HealthCheckConfig,
    ) -> Self {
        Self {
            discovery,
            probe,
            timeout: Duration::from_millis(config.timeout_ms),
            enabled: config.enabled,
        }
    }

    /// Live candidates for `service_id`.
    pub async fn get(&self, service_id: &str) -> Vec<ServiceInstance> {
        let instances = self.discovery.instances(service_id);
        if !self.enabled || instances.is_empty() {
            return instances;
        }

        let checks = instances.iter().map(|instance| self.check(instance));
        let results = join_all(checks).await;

        let healthy: Vec<ServiceInstance> = instances
            .into_iter()
            .zip(results)
            .filter_map(|(instance, healthy)| healthy.then_some(instance))
            .collect();

        tracing::debug!(
            service_id = %service_id,
            healthy = healthy.len(),
            "Health-checked candidates resolved"
        );
        healthy
    }

    async fn check(&self, instance: &ServiceInstance) -> bool {
        let outcome = match time::timeout(self.timeout, self.probe.check(instance)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        };

        let healthy = match outcome {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    service_id = %instance.service_id(),
                    instance_id = %instance.instance_id(),
                    error = %e,
                    "Health check failed"
                );
                false
            }
        };
        metrics::record_health_probe(instance.service_id(), healthy);
        healthy
    }
}
