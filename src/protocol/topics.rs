//! Topic constants and machine ID validation
//!
//! The three topics below are a wire-level contract shared with the rest of
//! the factory deployment; they must match byte for byte.

use thiserror::Error;

/// Outbound registration announcements.
pub const REGISTER_TOPIC: &str = "factory/machines/register";

/// Outbound sensor telemetry records.
pub const SENSOR_TOPIC: &str = "factory/machines/sensor_data";

/// Inbound shutdown commands, subscribed after ConnAck.
pub const SHUTDOWN_TOPIC: &str = "factory/machines/shutdown";

pub fn validate_machine_id(machine_id: &str) -> Result<(), ValidationError> {
    if machine_id.is_empty() {
        return Err(ValidationError::EmptyMachineId);
    }

    for ch in machine_id.chars() {
        if !ch.is_ascii_alphanumeric() && ch != '.' && ch != '_' && ch != '-' {
            return Err(ValidationError::InvalidMachineIdChar(ch));
        }
    }

    Ok(())
}

/// Validation errors for machine identity
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Machine ID cannot be empty")]
    EmptyMachineId,
    #[error("Machine ID contains invalid character: '{0}'")]
    InvalidMachineIdChar(char),
}
