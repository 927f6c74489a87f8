use serde::Serialize;
use std::time::Duration;

use super::VehicleClass;

/// Transit time of an emergency vehicle from spawn to exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WaitSample {
    pub class: VehicleClass,
    pub transit: Duration,
}

/// Counters shown next to the intersection view.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationStats {
    pub total_spawned: u32,
    pub total_completed: u32,
    pub ambulances_served: u32,
    pub firetrucks_served: u32,
    pub wait_samples: Vec<WaitSample>,
}

impl SimulationStats {
    pub fn record_spawn(&mut self) {
        self.total_spawned += 1;
    }

    /// Folds a departed vehicle into the counters. Emergency vehicles only
    /// count as served when they actually crossed the intersection.
    pub fn record_departure(&mut self, class: VehicleClass, crossed: bool, transit: Duration) {
        self.total_completed += 1;

        if !crossed {
            return;
        }

        match class {
            VehicleClass::Ambulance => self.ambulances_served += 1,
            VehicleClass::Firetruck => self.firetrucks_served += 1,
            VehicleClass::Car | VehicleClass::Bus => return,
        }
        self.wait_samples.push(WaitSample { class, transit });
    }

    pub fn served(&self, class: VehicleClass) -> u32 {
        match class {
            VehicleClass::Ambulance => self.ambulances_served,
            VehicleClass::Firetruck => self.firetrucks_served,
            VehicleClass::Car | VehicleClass::Bus => 0,
        }
    }

    pub fn average_transit(&self, class: VehicleClass) -> Option<Duration> {
        let samples: Vec<Duration> = self.wait_samples
            .iter()
            .filter(|s| s.class == class)
            .map(|s| s.transit)
            .collect();

        if samples.is_empty() {
            return None;
        }

        Some(samples.iter().sum::<Duration>() / samples.len() as u32)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
