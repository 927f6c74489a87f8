use super::{
    Direction, IntersectionGeometry, PhysicsEngine, SignalState, SimulationStats, Vehicle, VehicleClass,
    VehicleId, VehicleSnapshot,
};
use crate::config::{AmbientWeight, SimulationConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// A vehicle that left the simulation during a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Departure {
    pub id: VehicleId,
    pub direction: Direction,
    pub class: VehicleClass,
    pub crossed: bool,
    pub transit: Duration,
}

/// Owns every active vehicle. Structural changes happen only in `spawn`,
/// `tick` and `clear`.
pub struct VehicleRegistry {
    physics: PhysicsEngine,
    ambient_mix: Vec<AmbientWeight>,
    min_spacing: f32,
    vehicles: Vec<Vehicle>,
    next_vehicle_id: u64,
    clock: Duration,
    stats: SimulationStats,
    rng: StdRng,
}

impl VehicleRegistry {
    pub fn new(config: &SimulationConfig, seed: Option<u64>) -> Self {
        let geometry = IntersectionGeometry::new(&config.intersection);
        let physics = PhysicsEngine::new(geometry, &config.traffic);

        let rng = if let Some(seed) = seed {
            StdRng::seed_from_u64(seed)
        } else {
            StdRng::from_entropy()
        };

        Self {
            physics,
            ambient_mix: config.traffic.ambient_mix.clone(),
            min_spacing: config.traffic.min_spacing,
            vehicles: Vec::new(),
            next_vehicle_id: 0,
            clock: Duration::ZERO,
            stats: SimulationStats::default(),
            rng,
        }
    }

    /// Places a vehicle at the spawn point of `direction`, or of a random
    /// approach when `None`. Returns `None` if the entry is still occupied.
    pub fn spawn(&mut self, direction: Option<Direction>, class: VehicleClass) -> Option<VehicleId> {
        let direction = direction.unwrap_or_else(|| Direction::ALL[self.rng.gen_range(0..Direction::ALL.len())]);

        if !self.can_spawn_at(direction) {
            log::debug!("Cannot spawn {} from {} - entry occupied", class, direction);
            return None;
        }

        // Create new vehicle
        let id = VehicleId(self.next_vehicle_id);
        self.next_vehicle_id += 1;

        let position = self.physics.geometry().spawn_point(direction);
        self.vehicles.push(Vehicle::new(id, direction, class, position, self.clock));
        self.stats.record_spawn();

        log::debug!("Spawned {} {} from {} at ({:.1}, {:.1})", class, id.0, direction, position.x, position.y);
        Some(id)
    }

    /// Ambient traffic: random approach, class drawn from the weighted mix.
    pub fn spawn_ambient(&mut self) -> Option<VehicleId> {
        let class = self.select_ambient_class();
        self.spawn(None, class)
    }

    pub fn can_spawn_at(&self, direction: Direction) -> bool {
        let spawn_point = self.physics.geometry().spawn_point(direction);

        for vehicle in self.vehicles.iter().filter(|v| v.direction == direction) {
            let distance = (vehicle.position - spawn_point).magnitude();
            if distance < self.min_spacing {
                return false;
            }
        }

        true
    }

    fn select_ambient_class(&mut self) -> VehicleClass {
        let total_weight: u32 = self.ambient_mix.iter().map(|w| w.weight).sum();
        if total_weight == 0 {
            return VehicleClass::Car;
        }

        let mut random_value = self.rng.gen_range(0..total_weight);
        for entry in &self.ambient_mix {
            if random_value < entry.weight {
                return entry.class;
            }
            random_value -= entry.weight;
        }
        VehicleClass::Car
    }

    /// Advances every vehicle by one animation step against `signals`, then
    /// removes and accounts for those that left the area.
    pub fn tick(&mut self, signals: &SignalState, speed_multiplier: f32, dt: Duration) -> Vec<Departure> {
        self.clock += dt;
        let dt_secs = dt.as_secs_f32();

        // Update all vehicles
        for vehicle in &mut self.vehicles {
            self.physics.update(vehicle, signals, speed_multiplier, dt_secs);
        }

        // Remove vehicles that left the area
        let geometry = self.physics.geometry();
        let (departed, remaining): (Vec<Vehicle>, Vec<Vehicle>) = std::mem::take(&mut self.vehicles)
            .into_iter()
            .partition(|v| geometry.has_exited(v.direction, &v.position));
        self.vehicles = remaining;

        let mut departures = Vec::with_capacity(departed.len());
        // Record completed trips
        for vehicle in departed {
            let transit = self.clock.saturating_sub(vehicle.spawned_at);
            self.stats.record_departure(vehicle.class, vehicle.has_passed_intersection, transit);

            if vehicle.is_emergency() && vehicle.has_passed_intersection {
                log::info!("{} {} from {} cleared the intersection in {:.2}s",
                           vehicle.class, vehicle.id.0, vehicle.direction, transit.as_secs_f32());
            }

            departures.push(Departure {
                id: vehicle.id,
                direction: vehicle.direction,
                class: vehicle.class,
                crossed: vehicle.has_passed_intersection,
                transit,
            });
        }

        departures
    }

    /// Drops all vehicles without touching the service counters.
    pub fn clear(&mut self) {
        self.vehicles.clear();
    }

    pub fn reset_statistics(&mut self) {
        self.stats.reset();
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn get_vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    pub fn live_count(&self) -> usize {
        self.vehicles.len()
    }

    pub fn snapshot(&self) -> Vec<VehicleSnapshot> {
        self.vehicles.iter().map(Vehicle::snapshot).collect()
    }

    /// Vehicles currently held in the stop zone of `direction`, re-derived
    /// from geometry rather than the `stopped` flag.
    pub fn waiting_count(&self, direction: Direction, signals: &SignalState) -> usize {
        if signals.is_green(direction) {
            return 0;
        }

        let geometry = self.physics.geometry();
        self.vehicles
            .iter()
            .filter(|v| v.direction == direction && self.physics.is_gated(v))
            .filter(|v| geometry.in_stop_zone(v.direction, &v.position))
            .count()
    }

    pub fn geometry(&self) -> &IntersectionGeometry {
        self.physics.geometry()
    }

    pub fn statistics(&self) -> &SimulationStats {
        &self.stats
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }
}
