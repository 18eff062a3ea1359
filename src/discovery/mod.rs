//! Service discovery subsystem.
//!
//! # Data Flow
//! ```text
//! Route config (instances = "host:port;host:port")
//!     → parser.rs (tokens → ServiceInstance, ids service-1..n)
//!     → registry.rs (per-service buckets, dedup by instance id)
//!     → DiscoveryClient (instances / services queries)
//!     → health supplier → load balancer
//! ```
//!
//! # Design Decisions
//! - Registry is constructed once and shared by `Arc`, never global
//! - Registration only adds; health is evaluated per request, not stored
//! - One explicit `ParseMode` switch for the two token conventions

use std::collections::BTreeSet;

pub mod instance;
pub mod parser;
pub mod registry;

pub use instance::ServiceInstance;
pub use parser::{parse_instances, ParseMode, RouteInstanceConfig};
pub use registry::InstanceRegistry;

/// Read side of a discovery backend.
///
/// The in-memory [`InstanceRegistry`] is the only implementation today; any
/// other store answering these two queries can stand in for it.
pub trait DiscoveryClient: Send + Sync {
    /// Human-readable name for logs.
    fn description(&self) -> &str;

    /// Instances registered for `service_id`, in registration order.
    fn instances(&self, service_id: &str) -> Vec<ServiceInstance>;

    /// Known service ids.
    fn services(&self) -> BTreeSet<String>;
}
