//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → middleware/route.rs (match route or 404)
//!     → middleware/registration.rs (register route instances)
//!     → server.rs proxy handler (breaker, health-checked selection)
//!     → forward.rs (send upstream, stream response back)
//! ```

pub mod forward;
pub mod middleware;
pub mod request;
pub mod server;

pub use forward::Forwarder;
pub use request::{GatewayRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
