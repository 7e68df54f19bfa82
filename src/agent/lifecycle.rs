//! Machine agent lifecycle
//!
//! Drives the machine through its phases: connect, register, telemetry loop.
//! The loop runs on the calling task while the transport's background event
//! loop delivers inbound shutdown commands over an mpsc channel. Registration
//! readiness is a one-shot watch signal the loop awaits with a bounded
//! timeout instead of polling on a timer.
//!
//! Fatal conditions do not call `process::exit` from inside the loop; they
//! surface as a `StopReason` so the supervisor in `main` can tear the session
//! down before choosing an exit code.

use crate::config::AgentConfig;
use crate::error::{AgentError, AgentResult};
use crate::protocol::{
    registration_announcement, SensorReading, ShutdownSeverity, REGISTER_TOPIC, SENSOR_TOPIC,
};
use crate::telemetry::SensorSource;
use crate::transport::Transport;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

/// Why the agent loop stopped.
///
/// `CriticalShutdown` and `SensorFault` are fatal and map to a nonzero exit
/// code; `Interrupted` is the graceful operator-initiated path.
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// An inbound shutdown command classified as critical
    CriticalShutdown(String),
    /// A telemetry tick drew an ERROR status
    SensorFault(SensorReading),
    /// SIGINT/SIGTERM caught by the supervisor
    Interrupted,
}

/// Factory machine agent with injected transport and sensor source
pub struct MachineAgent<T, S>
where
    T: Transport,
    S: SensorSource,
{
    machine_id: String,
    transport: T,
    sensor: S,
    publish_interval: Duration,
    registration_wait: Duration,
    registered_tx: watch::Sender<bool>,
    registered_rx: watch::Receiver<bool>,
    commands_rx: mpsc::Receiver<String>,
}

impl<T, S> MachineAgent<T, S>
where
    T: Transport,
    S: SensorSource,
{
    /// Create a new agent with injected dependencies.
    ///
    /// Wires the command channel into the transport so inbound shutdown
    /// payloads reach the loop.
    pub fn new(config: &AgentConfig, transport: T, sensor: S) -> Self {
        let (registered_tx, registered_rx) = watch::channel(false);
        let (commands_tx, commands_rx) = mpsc::channel(16);
        transport.set_command_sender(commands_tx);

        Self {
            machine_id: config.machine.id.clone(),
            transport,
            sensor,
            publish_interval: Duration::from_secs(config.telemetry.publish_interval_secs),
            registration_wait: Duration::from_secs(config.telemetry.registration_wait_secs),
            registered_tx,
            registered_rx,
            commands_rx,
        }
    }

    /// Override the configured loop intervals
    pub fn with_intervals(
        mut self,
        publish_interval: Duration,
        registration_wait: Duration,
    ) -> Self {
        self.publish_interval = publish_interval;
        self.registration_wait = registration_wait;
        self
    }

    /// Whether the registration handshake has completed
    pub fn is_registered(&self) -> bool {
        *self.registered_rx.borrow()
    }

    /// Get the transport instance for testing
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run the agent until a stop condition is reached.
    ///
    /// Connect failure is logged and leaves the agent inert; only the
    /// supervisor's cancellation ends that state.
    pub async fn run(&mut self) -> AgentResult<StopReason> {
        if let Err(e) = self.transport.connect().await {
            error!(error = %e, "Failed to connect to MQTT broker");
            return self.idle().await;
        }

        info!(machine_id = %self.machine_id, "Session established");

        self.register_machine().await;
        self.telemetry_loop().await
    }

    /// Disconnect the transport; called by the supervisor on every exit path
    pub async fn shutdown(&mut self) {
        if let Err(e) = self.transport.disconnect().await {
            warn!(error = %e, "Error while disconnecting transport");
        }
    }

    /// Inert state after a connect failure: no registration, no telemetry,
    /// no retry
    async fn idle(&self) -> AgentResult<StopReason> {
        loop {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
    }

    /// One-time registration handshake.
    ///
    /// Enqueue success flips the readiness signal exactly once; failure is
    /// logged and never retried, which leaves telemetry gated forever.
    async fn register_machine(&mut self) {
        let announcement = registration_announcement(&self.machine_id);

        match self
            .transport
            .publish(REGISTER_TOPIC, announcement.into_bytes())
            .await
        {
            Ok(()) => {
                info!(machine_id = %self.machine_id, "Machine registered");
                let _ = self.registered_tx.send(true);
            }
            Err(e) => {
                error!(machine_id = %self.machine_id, error = %e, "Failed to register machine");
            }
        }
    }

    /// Foreground telemetry loop.
    ///
    /// Holds the invariant that no sensor publish happens before the
    /// registration signal is set. Shutdown commands are handled in every
    /// phase, including while still waiting for registration.
    async fn telemetry_loop(&mut self) -> AgentResult<StopReason> {
        loop {
            if !*self.registered_rx.borrow() {
                tokio::select! {
                    command = Self::next_command(&mut self.commands_rx) => {
                        if let Some(stop) = Self::handle_command(command) {
                            return Ok(stop);
                        }
                    }
                    _ = tokio::time::timeout(
                        self.registration_wait,
                        self.registered_rx.changed(),
                    ) => {}
                }
                continue;
            }

            let reading = self.sensor.next_reading(&self.machine_id);
            let payload = serde_json::to_vec(&reading)
                .map_err(|e| AgentError::internal(format!("Failed to serialize reading: {e}")))?;

            match self.transport.publish(SENSOR_TOPIC, payload).await {
                Ok(()) => {
                    info!(
                        machine_id = %self.machine_id,
                        vibration = reading.vibration,
                        temperature = reading.temperature,
                        status = %reading.error_code,
                        "Published sensor data"
                    );
                }
                Err(e) => {
                    // Enqueue failure is non-fatal; the loop continues
                    error!(error = %e, "Failed to publish sensor data");
                }
            }

            // Fatal-condition policy: the triggering reading is still
            // published (best effort) before the machine stops
            if reading.error_code.is_fatal() {
                error!(machine_id = %self.machine_id, "Sensor reported ERROR status, stopping machine");
                return Ok(StopReason::SensorFault(reading));
            }

            tokio::select! {
                command = Self::next_command(&mut self.commands_rx) => {
                    if let Some(stop) = Self::handle_command(command) {
                        return Ok(stop);
                    }
                }
                _ = tokio::time::sleep(self.publish_interval) => {}
            }
        }
    }

    /// Await the next inbound shutdown payload
    async fn next_command(commands_rx: &mut mpsc::Receiver<String>) -> String {
        match commands_rx.recv().await {
            Some(payload) => payload,
            // Transport dropped its sender; no more commands can arrive
            None => std::future::pending().await,
        }
    }

    /// Classify an inbound shutdown command; critical stops the machine
    fn handle_command(payload: String) -> Option<StopReason> {
        warn!(payload = %payload, "Shutdown command received");

        match ShutdownSeverity::classify(&payload) {
            ShutdownSeverity::Critical => {
                warn!("Shutting down machine due to critical alert");
                Some(StopReason::CriticalShutdown(payload))
            }
            ShutdownSeverity::Informational => None,
        }
    }
}
