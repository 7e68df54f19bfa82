//! Wire message types for the factory machine protocol
//!
//! Sensor readings are serialized as JSON records; registration announcements
//! are a fixed-format text payload. Both formats are consumed by the broker
//! side as-is, so field names and casing are part of the contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Simulated machine health status drawn on every telemetry tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MachineStatus {
    Ok,
    Warn,
    Error,
}

impl MachineStatus {
    /// An `ERROR` status is treated as an unrecoverable machine fault.
    pub fn is_fatal(&self) -> bool {
        matches!(self, MachineStatus::Error)
    }
}

impl std::fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MachineStatus::Ok => write!(f, "OK"),
            MachineStatus::Warn => write!(f, "WARN"),
            MachineStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// One telemetry sample, immutable once constructed.
///
/// Field set is fixed by the wire contract: timestamp, machine_id, vibration,
/// temperature, error_code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// ISO-8601 UTC timestamp of the draw
    pub timestamp: DateTime<Utc>,
    /// Identity of the publishing machine
    pub machine_id: String,
    /// Vibration amplitude, uniform in [0.5, 1.5]
    pub vibration: f64,
    /// Temperature in degrees Celsius, uniform in [20.0, 100.0]
    pub temperature: f64,
    /// Simulated health status for this tick
    pub error_code: MachineStatus,
}

/// Classification of an inbound shutdown command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSeverity {
    /// Payload contains the token "critical" (case-insensitive): fatal.
    Critical,
    /// Anything else: logged and ignored.
    Informational,
}

impl ShutdownSeverity {
    /// Classify a shutdown payload by case-insensitive substring search for
    /// the literal token "critical".
    pub fn classify(payload: &str) -> Self {
        if payload.to_lowercase().contains("critical") {
            ShutdownSeverity::Critical
        } else {
            ShutdownSeverity::Informational
        }
    }
}

/// Fixed-format registration announcement published exactly once per run.
pub fn registration_announcement(machine_id: &str) -> String {
    format!("Machine {machine_id} registered.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_registration_announcement_format() {
        assert_eq!(
            registration_announcement("client-1"),
            "Machine client-1 registered."
        );
    }

    #[test]
    fn test_sensor_reading_serialization_field_set() {
        let reading = SensorReading {
            timestamp: Utc::now(),
            machine_id: "client-1".to_string(),
            vibration: 1.02,
            temperature: 61.5,
            error_code: MachineStatus::Warn,
        };

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&reading).unwrap()).unwrap();

        // The wire contract fixes exactly these five fields
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 5);
        assert!(obj.contains_key("timestamp"));
        assert_eq!(obj["machine_id"], "client-1");
        assert_eq!(obj["vibration"], 1.02);
        assert_eq!(obj["temperature"], 61.5);
        assert_eq!(obj["error_code"], "WARN");
    }

    #[test]
    fn test_machine_status_uppercase_serialization() {
        assert_eq!(serde_json::to_string(&MachineStatus::Ok).unwrap(), "\"OK\"");
        assert_eq!(
            serde_json::to_string(&MachineStatus::Warn).unwrap(),
            "\"WARN\""
        );
        assert_eq!(
            serde_json::to_string(&MachineStatus::Error).unwrap(),
            "\"ERROR\""
        );
    }

    #[test]
    fn test_only_error_is_fatal() {
        assert!(!MachineStatus::Ok.is_fatal());
        assert!(!MachineStatus::Warn.is_fatal());
        assert!(MachineStatus::Error.is_fatal());
    }

    #[test]
    fn test_classify_examples() {
        assert_eq!(
            ShutdownSeverity::classify("CRITICAL failure"),
            ShutdownSeverity::Critical
        );
        assert_eq!(
            ShutdownSeverity::classify("critical"),
            ShutdownSeverity::Critical
        );
        assert_eq!(
            ShutdownSeverity::classify("maintenance window at 02:00"),
            ShutdownSeverity::Informational
        );
        assert_eq!(
            ShutdownSeverity::classify(""),
            ShutdownSeverity::Informational
        );
    }

    proptest! {
        #[test]
        fn classify_finds_critical_in_any_case(prefix in ".{0,20}", suffix in ".{0,20}") {
            // Embedding the token anywhere, in any case, must classify Critical
            for token in ["critical", "CRITICAL", "CrItIcAl"] {
                let payload = format!("{prefix}{token}{suffix}");
                prop_assert_eq!(
                    ShutdownSeverity::classify(&payload),
                    ShutdownSeverity::Critical
                );
            }
        }

        #[test]
        fn classify_without_token_is_informational(payload in "[a-bd-z0-9 ]{0,64}") {
            // Alphabet excludes 'c' so the token can never appear
            prop_assert_eq!(
                ShutdownSeverity::classify(&payload),
                ShutdownSeverity::Informational
            );
        }
    }
}
