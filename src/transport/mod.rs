//! Transport layer for broker communication
//!
//! This module provides the transport abstraction and MQTT implementation the
//! machine agent publishes through. The trait exists as a seam for dependency
//! injection and testing.

use tokio::sync::mpsc;

pub mod mqtt;

/// Transport trait for publish/subscribe sessions
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Connect to the broker and start the background network loop.
    ///
    /// Returns only once the broker has acknowledged the connection. The
    /// shutdown topic is subscribed as part of the connect handshake.
    async fn connect(&mut self) -> Result<(), Self::Error>;

    /// Disconnect from the broker and stop the background network loop
    async fn disconnect(&mut self) -> Result<(), Self::Error>;

    /// Publish a payload to a topic.
    ///
    /// `Ok(())` means the publish was enqueued locally; delivery is never
    /// confirmed ("enqueue success", not a broker acknowledgment).
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), Self::Error>;

    /// Check if the transport is currently connected
    fn is_connected(&self) -> bool;

    /// Set the sender that inbound shutdown payloads are forwarded on
    fn set_command_sender(&self, sender: mpsc::Sender<String>);
}

/// Type alias for the MQTT transport
pub type MqttTransport = mqtt::MqttClient;
