//! Machine agent lifecycle management

pub mod lifecycle;

pub use lifecycle::{MachineAgent, StopReason};
