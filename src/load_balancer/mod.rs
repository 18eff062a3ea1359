//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Route matched → service id identified
//!     → health supplier (live candidates, registration order)
//!     → pool.rs (selector for this service id)
//!     → Apply load balancing algorithm:
//!         - round_robin.rs (rotate through candidates)
//!         - random.rs (uniform pick)
//!     → Return chosen instance or None
//! ```
//!
//! # Design Decisions
//! - Selectors never see unhealthy instances; filtering happens upstream
//! - One selector per service id so rotation is independent per service
//! - Empty candidate set → None; the caller turns it into NoAvailableInstance

use crate::discovery::ServiceInstance;

pub mod pool;
pub mod random;
pub mod round_robin;

pub use pool::SelectorPool;

/// Picks one instance from a candidate set.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    fn next_instance(&self, candidates: &[ServiceInstance]) -> Option<ServiceInstance>;
}
