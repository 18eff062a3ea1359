//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request on a guarded route:
//!     → circuit_breaker.rs (admit, or reject while open)
//!     → [instance selection + forward]
//!     → outcome recorded on the permit
//!     → on rejection/failure: fallback.rs (degraded response)
//! ```
//!
//! # Design Decisions
//! - Circuit breaker prevents cascading failures
//! - Open circuits skip health probes entirely
//! - Fallbacks are static responses; they never touch a backend

pub mod circuit_breaker;
pub mod fallback;

pub use circuit_breaker::{BreakerSnapshot, CallPermit, CircuitBreaker, CircuitState};
pub use fallback::{forward_path, Fallbacks};
