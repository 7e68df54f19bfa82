//! Integration tests for configuration file loading

use factory_agent::config::{AgentConfig, ConfigError};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(content.as_bytes()).expect("write config");
    file
}

#[test]
fn test_load_full_config_from_file() {
    let file = write_config(
        r#"
[machine]
id = "lathe-3"

[mqtt]
broker_url = "mqtt://broker.factory.local:1883"
connect_timeout_secs = 5

[telemetry]
publish_interval_secs = 2
registration_wait_secs = 1
"#,
    );

    let config = AgentConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.machine.id, "lathe-3");
    assert_eq!(config.mqtt.broker_url, "mqtt://broker.factory.local:1883");
    assert_eq!(config.mqtt.connect_timeout_secs, 5);
    assert_eq!(config.telemetry.publish_interval_secs, 2);
    assert_eq!(config.telemetry.registration_wait_secs, 1);
}

#[test]
fn test_load_partial_config_fills_defaults() {
    let file = write_config(
        r#"
[mqtt]
broker_url = "mqtt://localhost:1883"
"#,
    );

    let config = AgentConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.machine.id, "client-1");
    assert_eq!(config.mqtt.broker_url, "mqtt://localhost:1883");
    assert_eq!(config.telemetry.publish_interval_secs, 5);
}

#[test]
fn test_load_rejects_invalid_machine_id() {
    let file = write_config(
        r#"
[machine]
id = "press 07"
"#,
    );

    let result = AgentConfig::load_from_file(file.path());
    assert!(matches!(result, Err(ConfigError::InvalidMachineId(_))));
}

#[test]
fn test_load_rejects_malformed_toml() {
    let file = write_config("[machine\nid = ");
    let result = AgentConfig::load_from_file(file.path());
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_load_missing_file_is_an_error() {
    let result = AgentConfig::load_from_file(std::path::Path::new("/nonexistent/machine.toml"));
    assert!(matches!(result, Err(ConfigError::FileRead(_))));
}
