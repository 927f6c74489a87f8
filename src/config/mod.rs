use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod intersection;
pub mod timing;
pub mod vehicles;

pub use intersection::*;
pub use timing::*;
pub use vehicles::*;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub intersection: IntersectionConfig,
    pub signals: SignalTiming,
    pub traffic: TrafficConfig,
}

impl SimulationConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading configuration from {}", path))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}

impl Validate for SimulationConfig {
    fn validate(&self) -> Result<()> {
        self.intersection.validate()?;
        self.signals.validate()?;
        self.traffic.validate()?;
        Ok(())
    }
}

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Converts a configured number of seconds into a millisecond-exact duration.
pub fn secs_to_duration(secs: f32) -> Duration {
    Duration::from_millis((secs.max(0.0) * 1000.0).round() as u64)
}
