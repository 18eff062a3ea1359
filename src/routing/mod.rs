//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path, headers)
//!     → router.rs (route lookup)
//!     → matcher.rs (evaluate match conditions)
//!     → Return: matched Route or NoMatch
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → Parse target uri (lb:// or http(s)://)
//!     → Compile matchers (path patterns, host)
//!     → Attach circuit breaker
//!     → Sort by priority, freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (segment matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (ordered by priority)

pub mod matcher;
pub mod router;

pub use router::{Route, RouteTarget, Router};
