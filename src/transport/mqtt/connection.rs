//! Connection state and MQTT option handling
//!
//! Pure functions for building rumqttc options from configuration, plus the
//! connection state and error types shared across the transport.

use crate::config::MqttSection;
use rumqttc::v5::MqttOptions;
use rumqttc::Transport as RumqttcTransport;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Connection state for the MQTT client
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    /// Initial state - attempting to connect
    Connecting,
    /// Successfully connected and ready for operations
    Connected,
    /// Disconnected with reason
    Disconnected(String),
}

/// MQTT transport errors
#[derive(Debug, Error)]
pub enum MqttError {
    #[error("Connection failed")]
    ConnectionFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Publishing failed")]
    PublishFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Subscription failed")]
    SubscriptionFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Invalid broker URL: {0}")]
    InvalidBrokerUrl(String),
    #[error("Not connected - current state: {state:?}")]
    NotConnected { state: ConnectionState },
    #[error("Connection failed: {0}")]
    ConnectionFailedStr(String),
}

/// Build MQTT options from configuration.
///
/// The machine ID doubles as the MQTT client ID, so the broker sees a stable
/// identity across restarts.
pub fn configure_mqtt_options(
    machine_id: &str,
    config: &MqttSection,
) -> Result<MqttOptions, MqttError> {
    let url = Url::parse(&config.broker_url)
        .map_err(|_| MqttError::InvalidBrokerUrl(config.broker_url.clone()))?;

    let host = url
        .host_str()
        .ok_or_else(|| MqttError::InvalidBrokerUrl(config.broker_url.clone()))?;
    let port = url
        .port()
        .unwrap_or(if url.scheme() == "mqtts" { 8883 } else { 1883 });

    let mut mqtt_options = MqttOptions::new(machine_id, host, port);

    if url.scheme() == "mqtts" {
        mqtt_options.set_transport(RumqttcTransport::tls_with_default_config());
    }

    mqtt_options.set_keep_alive(Duration::from_secs(60));

    Ok(mqtt_options)
}
