//! Integration tests for the machine agent lifecycle
//!
//! Runs the full connect / register / telemetry / shutdown flow against the
//! mock transport and a scripted sensor:
//! - Registration happens exactly once, before any sensor publish
//! - Telemetry ticks carry the full sensor record
//! - Inbound shutdown commands stop the machine only when critical
//! - An ERROR reading stops the machine after its own publish
//! - Connect and registration failures gate telemetry

use factory_agent::agent::{MachineAgent, StopReason};
use factory_agent::config::AgentConfig;
use factory_agent::protocol::{MachineStatus, REGISTER_TOPIC, SENSOR_TOPIC};
use factory_agent::testing::mocks::{MockTransport, ScriptedSensor};
use factory_agent::transport::Transport;
use std::time::Duration;
use tokio::time::timeout;

fn test_config() -> AgentConfig {
    let mut config = AgentConfig::default();
    config.machine.id = "press-07".to_string();
    config
}

/// Agent with millisecond intervals so tests run fast
fn fast_agent(
    transport: MockTransport,
    sensor: ScriptedSensor,
) -> MachineAgent<MockTransport, ScriptedSensor> {
    MachineAgent::new(&test_config(), transport, sensor)
        .with_intervals(Duration::from_millis(10), Duration::from_millis(10))
}

#[tokio::test]
async fn test_happy_path_registers_then_publishes() {
    let transport = MockTransport::new();
    let probe = transport.clone();
    let mut agent = fast_agent(transport, ScriptedSensor::repeating(MachineStatus::Ok));

    let handle = tokio::spawn(async move { agent.run().await });

    // Let a few telemetry ticks happen, then stop the machine
    tokio::time::sleep(Duration::from_millis(50)).await;
    probe.inject_shutdown("CRITICAL: emergency stop").await;

    let stop = timeout(Duration::from_secs(2), handle)
        .await
        .expect("agent should stop after critical command")
        .unwrap()
        .unwrap();
    assert_eq!(
        stop,
        StopReason::CriticalShutdown("CRITICAL: emergency stop".to_string())
    );

    let registered = probe.published_on(REGISTER_TOPIC);
    assert_eq!(registered.len(), 1, "registration must happen exactly once");
    assert_eq!(registered[0], b"Machine press-07 registered.");

    assert!(
        !probe.published_on(SENSOR_TOPIC).is_empty(),
        "at least one sensor publish expected"
    );

    // Registration precedes every sensor publish
    let all = probe.published();
    assert_eq!(all[0].0, REGISTER_TOPIC);
}

#[tokio::test]
async fn test_sensor_payload_carries_full_record() {
    let transport = MockTransport::new();
    let probe = transport.clone();
    let mut agent = fast_agent(transport, ScriptedSensor::repeating(MachineStatus::Warn));

    let handle = tokio::spawn(async move { agent.run().await });
    tokio::time::sleep(Duration::from_millis(30)).await;
    probe.inject_shutdown("critical").await;
    timeout(Duration::from_secs(2), handle)
        .await
        .expect("agent should stop")
        .unwrap()
        .unwrap();

    let payloads = probe.published_on(SENSOR_TOPIC);
    assert!(!payloads.is_empty());

    let record: serde_json::Value = serde_json::from_slice(&payloads[0]).unwrap();
    assert_eq!(record["machine_id"], "press-07");
    assert_eq!(record["error_code"], "WARN");
    assert!(record["timestamp"].is_string());
    assert!(record["vibration"].is_f64());
    assert!(record["temperature"].is_f64());
}

#[tokio::test]
async fn test_error_reading_stops_machine_after_publish() {
    let transport = MockTransport::new();
    let probe = transport.clone();
    let sensor = ScriptedSensor::sequence(vec![MachineStatus::Ok, MachineStatus::Error]);
    let mut agent = fast_agent(transport, sensor);

    let stop = timeout(Duration::from_secs(2), agent.run())
        .await
        .expect("agent should stop on ERROR reading")
        .unwrap();

    match stop {
        StopReason::SensorFault(reading) => {
            assert_eq!(reading.error_code, MachineStatus::Error);
            assert_eq!(reading.machine_id, "press-07");
        }
        other => panic!("expected SensorFault, got {other:?}"),
    }

    // The ERROR reading itself was published before the machine stopped
    let payloads = probe.published_on(SENSOR_TOPIC);
    assert_eq!(payloads.len(), 2);
    let last: serde_json::Value = serde_json::from_slice(&payloads[1]).unwrap();
    assert_eq!(last["error_code"], "ERROR");
}

#[tokio::test]
async fn test_informational_command_does_not_stop_machine() {
    let transport = MockTransport::new();
    let probe = transport.clone();
    let mut agent = fast_agent(transport, ScriptedSensor::repeating(MachineStatus::Ok));

    let handle = tokio::spawn(async move { agent.run().await });

    tokio::time::sleep(Duration::from_millis(30)).await;
    probe.inject_shutdown("scheduled maintenance at 02:00").await;
    tokio::time::sleep(Duration::from_millis(40)).await;

    let before = probe.published_on(SENSOR_TOPIC).len();
    tokio::time::sleep(Duration::from_millis(40)).await;
    let after = probe.published_on(SENSOR_TOPIC).len();
    assert!(
        after > before,
        "telemetry should continue after an informational command"
    );

    probe.inject_shutdown("critical").await;
    let stop = timeout(Duration::from_secs(2), handle)
        .await
        .expect("agent should stop on the critical command")
        .unwrap()
        .unwrap();
    assert_eq!(stop, StopReason::CriticalShutdown("critical".to_string()));
}

#[tokio::test]
async fn test_critical_command_honored_while_unregistered() {
    // Publish failure blocks registration, so the agent sits in the
    // pre-registration wait where shutdown commands must still be handled
    let transport = MockTransport::new().with_publish_failure();
    let probe = transport.clone();
    let mut agent = fast_agent(transport, ScriptedSensor::repeating(MachineStatus::Ok));

    let handle = tokio::spawn(async move { agent.run().await });
    tokio::time::sleep(Duration::from_millis(30)).await;
    probe.inject_shutdown("Critical overheat in hall B").await;

    let stop = timeout(Duration::from_secs(2), handle)
        .await
        .expect("agent should stop")
        .unwrap()
        .unwrap();
    assert_eq!(
        stop,
        StopReason::CriticalShutdown("Critical overheat in hall B".to_string())
    );
}

#[tokio::test]
async fn test_connect_failure_leaves_agent_inert() {
    let transport = MockTransport::new().with_connect_failure();
    let probe = transport.clone();
    let mut agent = fast_agent(transport, ScriptedSensor::repeating(MachineStatus::Ok));

    // The agent neither exits nor publishes after a failed connect
    let result = timeout(Duration::from_millis(100), agent.run()).await;
    assert!(result.is_err(), "agent should idle, not return");
    assert!(probe.published().is_empty());
    assert!(!agent.is_registered());
}

#[tokio::test]
async fn test_registration_failure_gates_telemetry_forever() {
    let transport = MockTransport::new().with_publish_failure();
    let probe = transport.clone();
    let mut agent = fast_agent(transport, ScriptedSensor::repeating(MachineStatus::Ok));

    // Many publish intervals pass without a single sensor publish
    let result = timeout(Duration::from_millis(100), agent.run()).await;
    assert!(result.is_err(), "agent should keep waiting for registration");
    assert!(probe.published_on(SENSOR_TOPIC).is_empty());
    assert!(!agent.is_registered());
}

#[tokio::test]
async fn test_shutdown_disconnects_transport() {
    let transport = MockTransport::new();
    let probe = transport.clone();
    let mut agent = fast_agent(transport, ScriptedSensor::repeating(MachineStatus::Ok));

    let _ = timeout(Duration::from_millis(20), agent.run()).await;
    assert!(probe.is_connected());

    agent.shutdown().await;
    assert!(!probe.is_connected());
}
