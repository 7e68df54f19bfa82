//! Observability for the machine agent
//!
//! Structured logging only; metrics and health endpoints are out of scope
//! for this deployment.

pub mod logging;

pub use logging::{init_default_logging, init_logging, LogFormat};
