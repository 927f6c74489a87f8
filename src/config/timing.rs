use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};
use std::time::Duration;
use super::{Validate, secs_to_duration};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SignalTiming {
    /// Seconds each axis stays green in the normal cycle.
    pub green_time: f32,
    pub yellow_time: f32,
    /// Seconds an emergency override holds its axis green.
    pub emergency_hold: f32,
    pub control_interval_ms: u64,
    /// Emergency vehicles closer than this to the center preempt the cycle.
    pub approach_distance: f32,
}

impl Default for SignalTiming {
    fn default() -> Self {
        Self {
            green_time: 8.0,
            yellow_time: 2.0,
            emergency_hold: 8.0,
            control_interval_ms: 200,
            approach_distance: 200.0,
        }
    }
}

impl SignalTiming {
    pub fn green(&self) -> Duration {
        secs_to_duration(self.green_time)
    }

    pub fn yellow(&self) -> Duration {
        secs_to_duration(self.yellow_time)
    }

    pub fn hold(&self) -> Duration {
        secs_to_duration(self.emergency_hold)
    }

    pub fn control_interval(&self) -> Duration {
        Duration::from_millis(self.control_interval_ms)
    }
}

impl Validate for SignalTiming {
    fn validate(&self) -> Result<()> {
        if self.green() == Duration::ZERO || self.yellow() == Duration::ZERO {
            return Err(anyhow!("Green and yellow times must be at least one millisecond"));
        }

        if self.hold() == Duration::ZERO {
            return Err(anyhow!("Emergency hold must be at least one millisecond"));
        }

        if self.control_interval_ms == 0 {
            return Err(anyhow!("Control interval must be greater than zero"));
        }

        if self.approach_distance < 0.0 {
            return Err(anyhow!("Approach distance must be non-negative"));
        }

        Ok(())
    }
}
