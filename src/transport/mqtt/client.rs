//! MQTT client I/O
//!
//! Owns the rumqttc client and the background task that drives its event
//! loop. The event loop plays the role of the asynchronous callback context:
//! it reacts to ConnAck by subscribing to the shutdown topic, decodes inbound
//! publishes, and forwards shutdown payloads to the agent. No reconnection
//! policy of our own lives here; if the link drops, the task keeps polling
//! and rumqttc re-dials on its own schedule.

use super::connection::{configure_mqtt_options, ConnectionState, MqttError};
use super::message_handler::{CommandForwarder, EventRoute, MessageHandler};
use crate::config::MqttSection;
use crate::protocol::SHUTDOWN_TOPIC;
use crate::transport::Transport;
use async_trait::async_trait;
use rumqttc::v5::{mqttbytes::QoS, AsyncClient, EventLoop};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// MQTT transport session for the machine agent
pub struct MqttClient {
    machine_id: String,
    client: AsyncClient,
    // Mutex only to make the struct Sync; EventLoop itself is not Sync
    event_loop: Mutex<Option<EventLoop>>,
    config: MqttSection,
    event_loop_handle: Option<JoinHandle<()>>,
    state_rx: Option<watch::Receiver<ConnectionState>>,
    shutdown_tx: Option<watch::Sender<bool>>,
    command_forwarder: Arc<Mutex<CommandForwarder>>,
}

impl MqttClient {
    pub fn new(machine_id: &str, config: MqttSection) -> Result<Self, MqttError> {
        let mqtt_options = configure_mqtt_options(machine_id, &config)?;
        let (client, event_loop) = AsyncClient::new(mqtt_options, 10);

        Ok(MqttClient {
            machine_id: machine_id.to_string(),
            client,
            event_loop: Mutex::new(Some(event_loop)),
            config,
            event_loop_handle: None,
            state_rx: None,
            shutdown_tx: None,
            command_forwarder: Arc::new(Mutex::new(CommandForwarder::new())),
        })
    }

    /// Wait for connection confirmation (ConnAck) with timeout
    async fn wait_for_connection_confirmation(
        mut state_rx: watch::Receiver<ConnectionState>,
        timeout: Duration,
    ) -> Result<(), MqttError> {
        let timeout_result = tokio::time::timeout(timeout, async {
            loop {
                if state_rx.changed().await.is_err() {
                    return Err(MqttError::ConnectionFailedStr(
                        "State channel closed".to_string(),
                    ));
                }
                match *state_rx.borrow() {
                    ConnectionState::Connected => return Ok(()),
                    ConnectionState::Disconnected(ref reason) => {
                        return Err(MqttError::ConnectionFailedStr(reason.clone()));
                    }
                    ConnectionState::Connecting => continue,
                }
            }
        })
        .await;

        match timeout_result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(MqttError::ConnectionFailedStr(
                "ConnAck timeout - no connection confirmation received".to_string(),
            )),
        }
    }

    /// Forward an inbound publish to the agent if it is a shutdown command
    async fn handle_message_received(
        forwarder: &Arc<Mutex<CommandForwarder>>,
        topic: &str,
        payload: &[u8],
    ) {
        let text = MessageHandler::decode_payload(payload);
        info!(topic = %topic, payload = %text, "Received MQTT message");

        if !MessageHandler::is_shutdown_message(topic) {
            return;
        }

        let sender = forwarder.lock().ok().and_then(|guard| guard.sender());
        match sender {
            Some(sender) => {
                if let Err(e) = sender.send(text).await {
                    error!(error = %e, "Failed to forward shutdown command to agent");
                }
            }
            None => {
                warn!("Received shutdown command but no command sender configured - dropped");
            }
        }
    }

    /// Get current connection state, or None if connect() was never called
    pub fn connection_state(&self) -> Option<ConnectionState> {
        self.state_rx.as_ref().map(|rx| rx.borrow().clone())
    }

    /// Check connection state before publish operations
    fn check_connection_state(&self) -> Result<(), MqttError> {
        let state_rx = self.state_rx.as_ref().ok_or_else(|| {
            MqttError::ConnectionFailedStr("Client not connected: connect() never called".into())
        })?;

        let current_state = state_rx.borrow().clone();
        if current_state != ConnectionState::Connected {
            return Err(MqttError::NotConnected {
                state: current_state,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Transport for MqttClient {
    type Error = MqttError;

    async fn connect(&mut self) -> Result<(), MqttError> {
        let mut event_loop = self
            .event_loop
            .lock()
            .ok()
            .and_then(|mut guard| guard.take())
            .ok_or_else(|| {
            MqttError::ConnectionFailedStr("Event loop already started".to_string())
        })?;

        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        self.state_rx = Some(state_rx.clone());
        self.shutdown_tx = Some(shutdown_tx);

        let client = self.client.clone();
        let machine_id = self.machine_id.clone();
        let forwarder = self.command_forwarder.clone();

        let handle = tokio::spawn(async move {
            info!(machine_id = %machine_id, "Starting MQTT event loop");

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            info!("Shutdown signal received, stopping MQTT event loop");
                            break;
                        }
                    }

                    event = event_loop.poll() => match event {
                        Ok(event) => match MessageHandler::route_mqtt_event(&event) {
                            EventRoute::ConnectionAcknowledged => {
                                info!("Connected successfully to MQTT broker");
                                let _ = state_tx.send(ConnectionState::Connected);

                                // Subscribe on every ConnAck so the
                                // subscription survives a broker reconnect
                                if let Err(e) =
                                    client.subscribe(SHUTDOWN_TOPIC, QoS::AtMostOnce).await
                                {
                                    error!(
                                        error = %e,
                                        topic = SHUTDOWN_TOPIC,
                                        "Failed to subscribe to shutdown topic"
                                    );
                                }
                            }
                            EventRoute::MessageReceived { topic, payload } => {
                                Self::handle_message_received(&forwarder, &topic, &payload).await;
                            }
                            EventRoute::Disconnected => {
                                warn!("Disconnected by MQTT broker");
                                let _ = state_tx.send(ConnectionState::Disconnected(
                                    "broker disconnect".to_string(),
                                ));
                            }
                            EventRoute::SubscriptionConfirmed { packet_id } => {
                                debug!(packet_id, "Subscription confirmed");
                            }
                            EventRoute::InfrastructureEvent(event_str) => {
                                debug!(target: "mqtt_transport", "MQTT event: {}", event_str);
                            }
                            EventRoute::OutgoingEvent => {}
                        },
                        Err(e) => {
                            warn!(error = %e, "MQTT event loop error");
                            let _ = state_tx.send(ConnectionState::Disconnected(e.to_string()));
                            // rumqttc re-dials on the next poll; pace the attempts
                            tokio::time::sleep(Duration::from_secs(1)).await;
                        }
                    }
                }
            }

            info!(machine_id = %machine_id, "MQTT event loop stopped");
        });

        self.event_loop_handle = Some(handle);

        let connect_timeout = Duration::from_secs(self.config.connect_timeout_secs);
        if let Err(e) = Self::wait_for_connection_confirmation(state_rx, connect_timeout).await {
            // A failed connect leaves the agent inert; stop the background task
            if let Some(shutdown_tx) = &self.shutdown_tx {
                let _ = shutdown_tx.send(true);
            }
            return Err(e);
        }

        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), MqttError> {
        if self.is_connected() {
            if let Err(e) = self.client.disconnect().await {
                debug!(error = %e, "MQTT disconnect request failed");
            }
        }

        if let Some(shutdown_tx) = &self.shutdown_tx {
            let _ = shutdown_tx.send(true);
        }

        if let Some(handle) = self.event_loop_handle.take() {
            match tokio::time::timeout(Duration::from_secs(2), handle).await {
                Ok(Ok(())) => info!("MQTT event loop shut down cleanly"),
                Ok(Err(e)) if !e.is_cancelled() => {
                    warn!(error = %e, "MQTT event loop task ended with error");
                }
                Err(_) => warn!("MQTT event loop did not stop in time"),
                _ => {}
            }
        }

        info!("MQTT client disconnected");
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), MqttError> {
        self.check_connection_state()?;

        // Fire-and-forget: Ok means the publish was enqueued locally,
        // not that the broker received it
        self.client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .await
            .map_err(|e| MqttError::PublishFailed(Box::new(e)))?;

        Ok(())
    }

    fn is_connected(&self) -> bool {
        matches!(self.connection_state(), Some(ConnectionState::Connected))
    }

    fn set_command_sender(&self, sender: mpsc::Sender<String>) {
        if let Ok(mut forwarder) = self.command_forwarder.lock() {
            forwarder.set_sender(sender);
        }
    }
}

impl Drop for MqttClient {
    fn drop(&mut self) {
        // Signal shutdown to the background task if it is still running.
        // Async teardown is not possible here; callers should use
        // disconnect() for a clean session close.
        if let Some(shutdown_tx) = &self.shutdown_tx {
            let _ = shutdown_tx.send(true);
        }
        if let Some(handle) = self.event_loop_handle.take() {
            handle.abort();
        }
    }
}
