use std::time::Duration;

use anyhow::Context;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use tracing::{error, info};

use tilenav_motion::{InputConfig, MovementConfig};

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Everything the simulation binary reads from configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub simulation: SimulationConfig,
    pub movement: MovementConfig,
    pub input: InputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub frame_rate_hz: u32,
    pub run_seconds: f32,
    pub tile_size: f32,
    pub seed: u64,
    /// Extra obstacles scattered over `map` at startup.
    pub random_obstacles: usize,
    pub input_interval_ms: u64,
    pub watchdog_stall_ms: u64,
    pub map: Vec<String>,
    pub agents: Vec<AgentSpawn>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: 60,
            run_seconds: 10.0,
            tile_size: 32.0,
            seed: 7,
            random_obstacles: 0,
            input_interval_ms: 500,
            watchdog_stall_ms: 250,
            map: vec![".".repeat(16); 12],
            agents: vec![
                AgentSpawn {
                    id: 1,
                    x: 16.0,
                    y: 16.0,
                },
                AgentSpawn {
                    id: 2,
                    x: 496.0,
                    y: 368.0,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AgentSpawn {
    pub id: u64,
    pub x: f32,
    pub y: f32,
}

impl SimulationConfig {
    /// Fixed time step of one frame, in seconds.
    pub fn frame_dt(&self) -> f32 {
        1.0 / self.frame_rate_hz.max(1) as f32
    }

    /// How long the binary runs before shutting down. Negative values mean zero.
    pub fn run_duration(&self) -> anyhow::Result<Duration> {
        Duration::try_from_secs_f32(self.run_seconds.max(0.0))
            .with_context(|| format!("invalid run_seconds {}", self.run_seconds))
    }
}

/// Loads `config/default.toml` (if present) layered with `TILENAV__*`
/// environment overrides.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    info!("Attempting to load configuration from {}", DEFAULT_CONFIG_PATH);

    let settings = Config::builder()
        .add_source(File::new(DEFAULT_CONFIG_PATH, FileFormat::Toml).required(false))
        .add_source(
            Environment::with_prefix("TILENAV")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .and_then(|c| c.try_deserialize::<AppConfig>());

    match settings {
        Ok(config) => {
            info!(
                frame_rate_hz = config.simulation.frame_rate_hz,
                run_seconds = config.simulation.run_seconds,
                agents = config.simulation.agents.len(),
                heuristic = ?config.movement.pathfinder.heuristic,
                "Successfully loaded configuration"
            );
            Ok(config)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Err(e)
        }
    }
}
