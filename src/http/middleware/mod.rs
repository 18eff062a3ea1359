//! Request-path middleware: route matching, then instance registration.

pub mod registration;
pub mod route;

pub use registration::{register_instances, RegistrationFilter, RegistrationOutcome};
pub use route::{match_route, MatchedRoute};
