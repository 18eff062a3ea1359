//! Load-balancing gateway with route-configured instance discovery.

pub mod admin;
pub mod config;
pub mod discovery;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod resilience;
pub mod routing;

pub use config::GatewayConfig;
pub use discovery::{InstanceRegistry, ServiceInstance};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
