//! Mock implementations for testing
//!
//! Provides a mock Transport and a scripted sensor source so lifecycle
//! scenarios can run without a broker or a random source.

use crate::error::AgentError;
use crate::protocol::{MachineStatus, SensorReading};
use crate::telemetry::SensorSource;
use crate::transport::Transport;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub type PublishedMessage = (String, Vec<u8>);

/// Mock transport recording every publish
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    published: Arc<Mutex<Vec<PublishedMessage>>>,
    connected: Arc<AtomicBool>,
    fail_connect: bool,
    fail_publish: bool,
    command_tx: Arc<Mutex<Option<mpsc::Sender<String>>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport whose connect attempt always fails
    pub fn with_connect_failure(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    /// Transport whose publish enqueues always fail
    pub fn with_publish_failure(mut self) -> Self {
        self.fail_publish = true;
        self
    }

    /// All recorded publishes, in order
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// Payloads recorded for one topic, in order
    pub fn published_on(&self, topic: &str) -> Vec<Vec<u8>> {
        self.published()
            .into_iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, payload)| payload)
            .collect()
    }

    /// Deliver an inbound shutdown payload to the agent, as the broker would
    pub async fn inject_shutdown(&self, payload: &str) {
        let sender = self
            .command_tx
            .lock()
            .ok()
            .and_then(|guard| guard.clone());
        if let Some(sender) = sender {
            let _ = sender.send(payload.to_string()).await;
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    type Error = AgentError;

    async fn connect(&mut self) -> Result<(), Self::Error> {
        if self.fail_connect {
            Err(AgentError::internal("Mock connection failure"))
        } else {
            self.connected.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    async fn disconnect(&mut self) -> Result<(), Self::Error> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), Self::Error> {
        if self.fail_publish {
            return Err(AgentError::internal("Mock publish failure"));
        }

        if let Ok(mut published) = self.published.lock() {
            published.push((topic.to_string(), payload));
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn set_command_sender(&self, sender: mpsc::Sender<String>) {
        if let Ok(mut command_tx) = self.command_tx.lock() {
            *command_tx = Some(sender);
        }
    }
}

/// Sensor source that plays back a scripted status sequence
///
/// Vibration and temperature are fixed mid-range values; tests that care
/// about the numeric ranges use `SimulatedSensor` directly.
#[derive(Debug, Clone)]
pub struct ScriptedSensor {
    script: Vec<MachineStatus>,
    position: usize,
    fallback: MachineStatus,
}

impl ScriptedSensor {
    /// Emit the given statuses in order, then keep emitting the last one
    pub fn sequence(script: Vec<MachineStatus>) -> Self {
        let fallback = script.last().copied().unwrap_or(MachineStatus::Ok);
        Self {
            script,
            position: 0,
            fallback,
        }
    }

    /// Emit the same status on every tick
    pub fn repeating(status: MachineStatus) -> Self {
        Self::sequence(vec![status])
    }
}

impl SensorSource for ScriptedSensor {
    fn next_reading(&mut self, machine_id: &str) -> SensorReading {
        let status = self
            .script
            .get(self.position)
            .copied()
            .unwrap_or(self.fallback);
        self.position += 1;

        SensorReading {
            timestamp: Utc::now(),
            machine_id: machine_id.to_string(),
            vibration: 1.0,
            temperature: 60.0,
            error_code: status,
        }
    }
}
