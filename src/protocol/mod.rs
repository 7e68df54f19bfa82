//! Wire-level protocol for the factory machine fleet
//!
//! Message formats and topic names shared with the broker side.

pub mod messages;
pub mod topics;

pub use messages::{registration_announcement, MachineStatus, SensorReading, ShutdownSeverity};
pub use topics::{
    validate_machine_id, ValidationError, REGISTER_TOPIC, SENSOR_TOPIC, SHUTDOWN_TOPIC,
};
