//! Error types for factory machine agent operations
//!
//! Fatal conditions (critical shutdown command, ERROR sensor status) are not
//! errors: they are `StopReason` values returned by the agent loop and mapped
//! to exit codes at the top-level supervisor.

use thiserror::Error;

/// Main error type for machine agent operations
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Transport error: {0}")]
    Transport(#[from] crate::transport::mqtt::MqttError),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AgentError {
    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Result type for agent operations
pub type AgentResult<T> = Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_error_constructor() {
        let error = AgentError::internal("unexpected state");
        assert!(matches!(error, AgentError::Internal { .. }));
        assert_eq!(error.to_string(), "Internal error: unexpected state");
    }

    #[test]
    fn test_config_error_conversion() {
        let config_err = crate::config::ConfigError::InvalidMachineId(
            crate::protocol::ValidationError::EmptyMachineId,
        );
        let error: AgentError = config_err.into();
        assert!(error.to_string().starts_with("Configuration error:"));
    }
}
