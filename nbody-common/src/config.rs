use serde::{Deserialize, Serialize};
use anyhow::Result;
use crate::sim_params::{SimParams, DEFAULT_DT, GRAVITATIONAL_CONSTANT};
use std::path::Path;

// Configuration for timing
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct TimingConfig {
    #[serde(default = "default_dt")]
    pub dt: f64,
    #[serde(default)]
    pub num_steps: u32,
}

// Configuration for the force-evaluation worker pool
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ParallelConfig {
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrajectoryFormat {
    /// Compressed NumPy archive holding one `[step][body][axis]` array.
    Npz,
    Bincode,
    MessagePack,
    Json,
}

impl TrajectoryFormat {
    /// Guesses the format from a file extension, if it is one we know.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "npz" => Some(TrajectoryFormat::Npz),
            "bin" | "bincode" => Some(TrajectoryFormat::Bincode),
            "msgpack" | "mp" => Some(TrajectoryFormat::MessagePack),
            "json" => Some(TrajectoryFormat::Json),
            _ => None,
        }
    }
}

impl std::str::FromStr for TrajectoryFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "npz" => Ok(TrajectoryFormat::Npz),
            "bincode" => Ok(TrajectoryFormat::Bincode),
            "messagepack" | "msgpack" => Ok(TrajectoryFormat::MessagePack),
            "json" => Ok(TrajectoryFormat::Json),
            other => anyhow::bail!(
                "Unknown trajectory format '{}' (expected npz, bincode, messagepack or json)",
                other
            ),
        }
    }
}

// Configuration for output settings
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub trajectory_format: Option<TrajectoryFormat>,
}

// Main simulation configuration structure, loaded from a TOML file.
// Every section is optional so an empty file is a valid configuration.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct SimulationConfig {
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub parallel: ParallelConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig { dt: DEFAULT_DT, num_steps: 0 }
    }
}

impl Default for ParallelConfig {
    fn default() -> Self {
        ParallelConfig { num_workers: default_num_workers() }
    }
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config file '{}': {}", path_ref.display(), e))
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.timing.dt.is_finite() || self.timing.dt <= 0.0 {
            anyhow::bail!("dt must be a positive finite number, got {}.", self.timing.dt);
        }
        if self.parallel.num_workers == 0 {
            anyhow::bail!("num_workers must be at least 1.");
        }
        Ok(())
    }

    /// Converts the configuration into simulation parameters used at runtime.
    pub fn sim_params(&self) -> SimParams {
        SimParams {
            g: GRAVITATIONAL_CONSTANT,
            dt: self.timing.dt,
            num_steps: self.timing.num_steps,
            num_workers: self.parallel.num_workers,
        }
    }
}

fn default_dt() -> f64 {
    DEFAULT_DT
}

fn default_num_workers() -> usize {
    1
}
