//! Liveness probes.
//!
//! # Responsibilities
//! - Probe a single instance's health endpoint
//! - Classify the answer as up or down
//!
//! # Design Decisions
//! - Only 2xx is healthy
//! - A JSON body reporting `"status": "DOWN"` is unhealthy even on 2xx
//! - The probe never decides timeouts; the supplier wraps every call

use std::collections::HashMap;
use std::time::Duration;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::config::HealthCheckConfig;
use crate::discovery::ServiceInstance;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("health request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("health endpoint answered {0}")]
    Status(reqwest::StatusCode),

    #[error("instance reports status {0}")]
    ReportedDown(String),

    #[error("health check timed out after {0:?}")]
    Timeout(Duration),
}

/// Liveness check against one instance.
pub trait HealthProbe: Send + Sync {
    fn check<'a>(&'a self, instance: &'a ServiceInstance) -> BoxFuture<'a, Result<(), ProbeError>>;
}

/// HTTP GET against the instance's health path.
#[derive(Debug, Clone)]
pub struct HttpHealthProbe {
    client: reqwest::Client,
    default_path: String,
    paths: HashMap<String, String>,
}

impl HttpHealthProbe {
    pub fn new(config: &HealthCheckConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent("lb-gateway-health-check")
            .no_proxy()
            .build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: reqwest::Client, config: &HealthCheckConfig) -> Self {
        Self {
            client,
            default_path: config.path.clone(),
            paths: config.paths.clone(),
        }
    }

    /// Health path for a service, honouring per-service overrides.
    pub fn path_for(&self, service_id: &str) -> &str {
        self.paths
            .get(service_id)
            .map(String::as_str)
            .unwrap_or(&self.default_path)
    }

    pub fn health_url(&self, instance: &ServiceInstance) -> String {
        format!("{}{}", instance.uri(), self.path_for(instance.service_id()))
    }

    async fn probe(&self, instance: &ServiceInstance) -> Result<(), ProbeError> {
        let url = self.health_url(instance);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status(status));
        }

        // Actuator-style bodies: {"status":"UP"}
        let body = response.bytes().await?;
        if let Ok(json) = serde_json::from_slice::<serde_json::Value>(&body) {
            if let Some(reported) = json.get("status").and_then(|s| s.as_str()) {
                if reported.eq_ignore_ascii_case("down") {
                    return Err(ProbeError::ReportedDown(reported.to_string()));
                }
            }
        }
        Ok(())
    }
}

impl HealthProbe for HttpHealthProbe {
    fn check<'a>(&'a self, instance: &'a ServiceInstance) -> BoxFuture<'a, Result<(), ProbeError>> {
        Box::pin(self.probe(instance))
    }
}
