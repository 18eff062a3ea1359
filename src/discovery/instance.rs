//! Service instance descriptor.

use serde::Serialize;

/// One network-addressable backend endpoint belonging to a logical service.
///
/// Instances are immutable once built. The registry only ever adds them;
/// a changed address arrives as a new instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInstance {
    instance_id: String,
    service_id: String,
    host: String,
    port: u16,
    secure: bool,
}

impl ServiceInstance {
    pub fn new(
        instance_id: impl Into<String>,
        service_id: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        secure: bool,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            service_id: service_id.into(),
            host: host.into(),
            port,
            secure,
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    pub fn scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    /// Base URL of the instance, e.g. `http://localhost:8090`.
    pub fn uri(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("{}://[{}]:{}", self.scheme(), self.host, self.port)
        } else {
            format!("{}://{}:{}", self.scheme(), self.host, self.port)
        }
    }
}

impl std::fmt::Display for ServiceInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.instance_id, self.uri())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri() {
        let plain = ServiceInstance::new("a-1", "a", "localhost", 8090, false);
        assert_eq!(plain.uri(), "http://localhost:8090");

        let tls = ServiceInstance::new("a-2", "a", "example.com", 8443, true);
        assert_eq!(tls.uri(), "https://example.com:8443");

        let v6 = ServiceInstance::new("a-3", "a", "::1", 9000, false);
        assert_eq!(v6.uri(), "http://[::1]:9000");
    }

    #[test]
    fn test_serializes_camel_case() {
        let instance = ServiceInstance::new("my-lb-1", "my-lb", "localhost", 8090, false);
        let json = serde_json::to_value(&instance).unwrap();
        assert_eq!(json["instanceId"], "my-lb-1");
        assert_eq!(json["serviceId"], "my-lb");
        assert_eq!(json["port"], 8090);
        assert_eq!(json["secure"], false);
    }
}
