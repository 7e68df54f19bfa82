//! Pure routing and forwarding logic for MQTT events
//!
//! Routing decisions are separated from I/O so they can be tested without a
//! broker. Inbound shutdown payloads are forwarded to the agent over an mpsc
//! channel.

use crate::protocol::SHUTDOWN_TOPIC;
use rumqttc::v5::Event;
use tokio::sync::mpsc;

/// Pure routing decisions based on MQTT events
pub struct MessageHandler;

impl MessageHandler {
    /// Route an MQTT v5 event to the appropriate handler (pure function)
    pub fn route_mqtt_event(event: &Event) -> EventRoute {
        match event {
            Event::Incoming(incoming) => {
                use rumqttc::v5::mqttbytes::v5::Packet;
                match incoming {
                    Packet::ConnAck(_) => EventRoute::ConnectionAcknowledged,
                    Packet::Publish(publish) => EventRoute::MessageReceived {
                        topic: String::from_utf8_lossy(&publish.topic).to_string(),
                        payload: publish.payload.to_vec(),
                    },
                    Packet::Disconnect(_) => EventRoute::Disconnected,
                    Packet::SubAck(suback) => EventRoute::SubscriptionConfirmed {
                        packet_id: suback.pkid,
                    },
                    other => EventRoute::InfrastructureEvent(format!("{other:?}")),
                }
            }
            Event::Outgoing(_) => EventRoute::OutgoingEvent,
        }
    }

    /// Whether an inbound message belongs to the shutdown contract (pure function)
    pub fn is_shutdown_message(topic: &str) -> bool {
        topic == SHUTDOWN_TOPIC
    }

    /// Decode an inbound payload as text (pure function)
    pub fn decode_payload(payload: &[u8]) -> String {
        String::from_utf8_lossy(payload).to_string()
    }
}

/// Routing decisions for MQTT events
#[derive(Debug, Clone)]
pub enum EventRoute {
    /// Connection acknowledged - ready to publish/subscribe
    ConnectionAcknowledged,
    /// Message received on a subscribed topic
    MessageReceived { topic: String, payload: Vec<u8> },
    /// MQTT broker disconnected
    Disconnected,
    /// Subscription confirmed
    SubscriptionConfirmed { packet_id: u16 },
    /// Infrastructure event (PingResp, etc.)
    InfrastructureEvent(String),
    /// Outgoing event (handled automatically)
    OutgoingEvent,
}

/// Forwards decoded shutdown payloads to the agent (impure I/O)
#[derive(Debug, Default)]
pub struct CommandForwarder {
    sender: Option<mpsc::Sender<String>>,
}

impl CommandForwarder {
    pub fn new() -> Self {
        Self { sender: None }
    }

    pub fn set_sender(&mut self, sender: mpsc::Sender<String>) {
        self.sender = Some(sender);
    }

    /// Clone out the sender so the caller can forward without holding a lock
    pub fn sender(&self) -> Option<mpsc::Sender<String>> {
        self.sender.clone()
    }
}
