//! Factory Machine Agent
//!
//! A factory-floor IoT client that connects to an MQTT broker, announces
//! itself on a registration topic, and periodically publishes simulated
//! sensor telemetry while listening for shutdown commands.
//!
//! # Overview
//!
//! The crate is organized around one component, the machine agent, and the
//! seams it is tested through:
//! - Wire protocol: topic names, the sensor reading record, and shutdown
//!   command classification
//! - MQTT transport with a background event loop (rumqttc)
//! - Agent lifecycle: registration handshake and the telemetry loop
//! - Simulated sensor sampling
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use factory_agent::agent::MachineAgent;
//! use factory_agent::config::AgentConfig;
//! use factory_agent::telemetry::SimulatedSensor;
//! use factory_agent::transport::mqtt::MqttClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AgentConfig::default();
//! let transport = MqttClient::new(&config.machine.id, config.mqtt.clone())?;
//! let mut agent = MachineAgent::new(&config, transport, SimulatedSensor::new());
//!
//! let stop_reason = agent.run().await?;
//! agent.shutdown().await;
//! println!("machine stopped: {stop_reason:?}");
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod observability;
pub mod protocol;
pub mod telemetry;
pub mod testing;
pub mod transport;

pub use agent::{MachineAgent, StopReason};
pub use config::AgentConfig;
pub use error::{AgentError, AgentResult};
pub use protocol::{MachineStatus, SensorReading, ShutdownSeverity};
pub use telemetry::{SensorSource, SimulatedSensor};
pub use transport::mqtt::MqttClient;
