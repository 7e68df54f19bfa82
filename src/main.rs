//! Factory Machine Agent - Main Entry Point
//!
//! Supervises the agent loop: loads configuration, wires the MQTT transport
//! and the simulated sensor into the agent, and maps the stop reason to the
//! process exit code. The session is torn down on every exit path before the
//! process ends.

use clap::{Parser, Subcommand};
use factory_agent::agent::{MachineAgent, StopReason};
use factory_agent::config::AgentConfig;
use factory_agent::observability::init_default_logging;
use factory_agent::telemetry::SimulatedSensor;
use factory_agent::transport::mqtt::MqttClient;
use std::path::PathBuf;
use std::process;
use tokio::signal;
use tracing::{error, info};

/// Factory-floor machine agent publishing simulated sensor telemetry
#[derive(Parser)]
#[command(name = "factory-agent")]
#[command(about = "Factory-floor machine agent publishing simulated sensor telemetry over MQTT")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the machine agent
    Run,
    /// Validate configuration
    Config {
        /// Show the effective configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    info!(
        "Starting factory machine agent v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let exit_code = match cli.command {
        Commands::Run => match run_agent(config).await {
            Ok(code) => code,
            Err(e) => {
                error!("Agent failed: {}", e);
                1
            }
        },
        Commands::Config { show } => match handle_config_command(config, show) {
            Ok(()) => 0,
            Err(e) => {
                error!("Command failed: {}", e);
                1
            }
        },
    };

    info!("Application shutdown complete");
    if exit_code != 0 {
        process::exit(exit_code);
    }
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<AgentConfig, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(AgentConfig::load_from_file(path)?)
        }
        None => {
            // Try default locations, otherwise fall back to built-in defaults
            let default_paths = ["machine.toml", "config/machine.toml"];

            for path_str in default_paths {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("Loading configuration from: {}", path.display());
                    return Ok(AgentConfig::load_from_file(&path)?);
                }
            }

            info!("No configuration file found, using built-in defaults");
            Ok(AgentConfig::default())
        }
    }
}

async fn run_agent(config: AgentConfig) -> Result<i32, Box<dyn std::error::Error>> {
    info!(machine_id = %config.machine.id, "Starting machine agent");

    let transport = MqttClient::new(&config.machine.id, config.mqtt.clone())?;
    let sensor = SimulatedSensor::new();
    let mut agent = MachineAgent::new(&config, transport, sensor);

    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    let stop_reason = tokio::select! {
        result = agent.run() => result?,
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down gracefully...");
            StopReason::Interrupted
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down gracefully...");
            StopReason::Interrupted
        }
    };

    // Clean session teardown on every exit path
    agent.shutdown().await;

    let exit_code = match stop_reason {
        StopReason::Interrupted => {
            info!("Graceful shutdown");
            0
        }
        StopReason::CriticalShutdown(payload) => {
            error!(payload = %payload, "Machine stopped by critical shutdown command");
            1
        }
        StopReason::SensorFault(reading) => {
            error!(
                machine_id = %reading.machine_id,
                vibration = reading.vibration,
                temperature = reading.temperature,
                "Machine stopped by simulated sensor fault"
            );
            1
        }
    };

    Ok(exit_code)
}

fn handle_config_command(
    config: AgentConfig,
    show: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("Effective configuration:");
        println!("{}", toml::to_string_pretty(&config)?);
    }

    info!("Configuration validation complete");
    Ok(())
}
