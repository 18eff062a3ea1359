//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Per request, for the matched service id:
//!     registry.get_instances(service_id)
//!     → probe.rs (one GET per instance, concurrently)
//!     → supplier.rs (timeout each probe, keep the healthy ones)
//!     → load balancer picks from the survivors
//! ```
//!
//! # Design Decisions
//! - Health is evaluated per request; nothing is cached between requests
//! - A failing probe excludes the instance for that request only
//! - Probe transport sits behind a trait so tests can script outcomes

pub mod probe;
pub mod supplier;

pub use probe::{HealthProbe, HttpHealthProbe, ProbeError};
pub use supplier::HealthCheckedInstanceSupplier;
