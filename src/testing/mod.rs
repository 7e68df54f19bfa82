//! Testing utilities and mock implementations
//!
//! Shared between unit tests and the integration tests under `tests/`.

pub mod mocks;
