//! MQTT transport implementation
//!
//! Split between pure logic (connection state, event routing) and impure I/O
//! (the rumqttc client and its background event loop):
//!
//! - `connection` - connection state, errors, option construction
//! - `message_handler` - pure event routing and command forwarding
//! - `client` - the rumqttc session and background task

pub mod client;
pub mod connection;
pub mod message_handler;

pub use client::MqttClient;
pub use connection::{configure_mqtt_options, ConnectionState, MqttError};
pub use message_handler::{CommandForwarder, EventRoute, MessageHandler};
