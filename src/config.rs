//! Configuration system for the factory machine agent
//!
//! Every field carries a default so the agent can run without a config file,
//! matching the fixed constants of the original deployment. A TOML file (or
//! the `-c` flag) overrides them.

use crate::protocol::validate_machine_id;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Main agent configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    #[serde(default)]
    pub machine: MachineSection,
    #[serde(default)]
    pub mqtt: MqttSection,
    #[serde(default)]
    pub telemetry: TelemetrySection,
}

/// Machine identity section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MachineSection {
    /// Machine identifier (must match [a-zA-Z0-9._-]+), stable for the
    /// process lifetime
    #[serde(default = "default_machine_id")]
    pub id: String,
}

impl Default for MachineSection {
    fn default() -> Self {
        Self {
            id: default_machine_id(),
        }
    }
}

fn default_machine_id() -> String {
    "client-1".to_string()
}

/// MQTT broker section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MqttSection {
    /// MQTT broker URL with protocol and port
    #[serde(default = "default_broker_url")]
    pub broker_url: String,
    /// Seconds to wait for the broker's ConnAck before giving up
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for MqttSection {
    fn default() -> Self {
        Self {
            broker_url: default_broker_url(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_broker_url() -> String {
    "mqtt://emqx:1883".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

/// Telemetry loop section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetrySection {
    /// Seconds between sensor publishes (default: 5)
    #[serde(default = "default_publish_interval")]
    pub publish_interval_secs: u64,
    /// Seconds per wait cycle while the registration flag is unset (default: 2)
    #[serde(default = "default_registration_wait")]
    pub registration_wait_secs: u64,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            publish_interval_secs: default_publish_interval(),
            registration_wait_secs: default_registration_wait(),
        }
    }
}

fn default_publish_interval() -> u64 {
    5
}

fn default_registration_wait() -> u64 {
    2
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid machine ID: {0}")]
    InvalidMachineId(#[from] crate::protocol::ValidationError),
}

impl AgentConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AgentConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_machine_id(&self.machine.id)?;
        Ok(())
    }
}
