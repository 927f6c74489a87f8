use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};
use std::time::Duration;
use super::Validate;
use crate::simulation::VehicleClass;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrafficConfig {
    pub animation_interval_ms: u64,
    /// Period between ambient spawn attempts.
    pub spawn_interval_ms: u64,
    pub speed_multiplier: f32,
    /// Minimum gap between a new vehicle and the previous one on its approach.
    pub min_spacing: f32,
    /// Animation frames between siren blink toggles.
    pub siren_blink_frames: u32,
    /// When false, ambulances and fire trucks drive through red signals.
    pub emergency_vehicles_obey_signals: bool,
    pub speeds: BaseSpeeds,
    pub ambient_mix: Vec<AmbientWeight>,
    pub random: RandomConfig,
}

/// Base speeds in units per second.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BaseSpeeds {
    pub car: f32,
    pub bus: f32,
    pub ambulance: f32,
    pub firetruck: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AmbientWeight {
    pub class: VehicleClass,
    pub weight: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RandomConfig {
    pub seed: Option<u64>,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            animation_interval_ms: 16,
            spawn_interval_ms: 1500,
            speed_multiplier: 1.0,
            min_spacing: 40.0,
            siren_blink_frames: 10,
            emergency_vehicles_obey_signals: false,
            speeds: BaseSpeeds::default(),
            ambient_mix: vec![AmbientWeight { class: VehicleClass::Car, weight: 100 }],
            random: RandomConfig::default(),
        }
    }
}

impl Default for BaseSpeeds {
    fn default() -> Self {
        Self {
            car: 156.25,
            bus: 125.0,
            ambulance: 250.0,
            firetruck: 218.75,
        }
    }
}

impl BaseSpeeds {
    pub fn for_class(&self, class: VehicleClass) -> f32 {
        match class {
            VehicleClass::Car => self.car,
            VehicleClass::Bus => self.bus,
            VehicleClass::Ambulance => self.ambulance,
            VehicleClass::Firetruck => self.firetruck,
        }
    }
}

impl TrafficConfig {
    pub fn animation_interval(&self) -> Duration {
        Duration::from_millis(self.animation_interval_ms)
    }

    pub fn spawn_interval(&self) -> Duration {
        Duration::from_millis(self.spawn_interval_ms)
    }
}

impl Validate for TrafficConfig {
    fn validate(&self) -> Result<()> {
        if self.animation_interval_ms == 0 || self.spawn_interval_ms == 0 {
            return Err(anyhow!("Animation and spawn intervals must be greater than zero"));
        }

        if self.speed_multiplier < 0.0 {
            return Err(anyhow!("Speed multiplier must be non-negative"));
        }

        if self.min_spacing < 0.0 {
            return Err(anyhow!("Minimum spacing must be non-negative"));
        }

        if self.siren_blink_frames == 0 {
            return Err(anyhow!("Siren blink frames must be greater than zero"));
        }

        for class in VehicleClass::ALL {
            if self.speeds.for_class(class) <= 0.0 {
                return Err(anyhow!("Base speed for '{}' must be positive", class));
            }
        }

        if self.ambient_mix.is_empty() {
            return Err(anyhow!("At least one ambient vehicle class must be defined"));
        }

        for entry in &self.ambient_mix {
            if entry.class.is_emergency() {
                return Err(anyhow!(
                    "Ambient traffic cannot contain emergency class '{}'; spawn those explicitly",
                    entry.class
                ));
            }
        }

        let total_weight: u32 = self.ambient_mix.iter().map(|w| w.weight).sum();
        if total_weight == 0 {
            return Err(anyhow!("Ambient class weights must sum to more than zero"));
        }

        Ok(())
    }
}
