//! Synthetic sensor sampling
//!
//! Real sensor hardware is out of scope; `SimulatedSensor` stands in with
//! independent uniform draws. The `SensorSource` trait is the seam that lets
//! tests script exact reading sequences.

use crate::protocol::{MachineStatus, SensorReading};
use chrono::Utc;
use rand::Rng;

/// Source of sensor readings for the telemetry loop.
pub trait SensorSource: Send {
    /// Produce the reading for one telemetry tick.
    fn next_reading(&mut self, machine_id: &str) -> SensorReading;
}

/// Simulated sensor backed by a uniform random source.
///
/// Vibration is drawn from [0.5, 1.5], temperature from [20.0, 100.0], and
/// the status uniformly from {OK, WARN, ERROR}.
#[derive(Debug, Default)]
pub struct SimulatedSensor;

impl SimulatedSensor {
    pub fn new() -> Self {
        Self
    }
}

impl SensorSource for SimulatedSensor {
    fn next_reading(&mut self, machine_id: &str) -> SensorReading {
        let mut rng = rand::thread_rng();

        let status = match rng.gen_range(0..3) {
            0 => MachineStatus::Ok,
            1 => MachineStatus::Warn,
            _ => MachineStatus::Error,
        };

        SensorReading {
            timestamp: Utc::now(),
            machine_id: machine_id.to_string(),
            vibration: rng.gen_range(0.5..=1.5),
            temperature: rng.gen_range(20.0..=100.0),
            error_code: status,
        }
    }
}
