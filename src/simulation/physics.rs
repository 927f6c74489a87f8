use super::{Direction, Point, SignalState, Vec2, Vehicle};
use crate::config::{BaseSpeeds, IntersectionConfig, TrafficConfig};

/// Fixed geometry of the crossing: where each approach starts and ends.
#[derive(Debug, Clone)]
pub struct IntersectionGeometry {
    center: Point,
    config: IntersectionConfig,
}

impl IntersectionGeometry {
    pub fn new(config: &IntersectionConfig) -> Self {
        Self {
            center: config.center(),
            config: config.clone(),
        }
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn stop_distance(&self) -> f32 {
        self.config.stop_distance
    }

    pub fn spawn_point(&self, direction: Direction) -> Point {
        let c = &self.config;
        match direction {
            Direction::North => Point::new(self.center.x - c.ns_lane_offset, -c.spawn_distance),
            Direction::South => Point::new(self.center.x + c.ns_lane_offset, c.height + c.spawn_distance),
            Direction::West => Point::new(-c.spawn_distance, self.center.y - c.ew_lane_offset),
            Direction::East => Point::new(c.width + c.spawn_distance, self.center.y + c.ew_lane_offset),
        }
    }

    /// True once a vehicle is far enough past the far edge to leave the simulation.
    pub fn has_exited(&self, direction: Direction, position: &Point) -> bool {
        let c = &self.config;
        match direction {
            Direction::North => position.y > c.height + c.despawn_distance,
            Direction::South => position.y < -c.despawn_distance,
            Direction::West => position.x > c.width + c.despawn_distance,
            Direction::East => position.x < -c.despawn_distance,
        }
    }

    /// Distance left to travel before reaching the center; negative once past it.
    pub fn signed_distance(&self, direction: Direction, position: &Point) -> f32 {
        (self.center - *position).dot(&direction.unit_vector())
    }

    /// Approach-side band where motion is gated by the signal. Both bounds are
    /// inclusive so a vehicle sitting exactly on the line stays stopped.
    pub fn in_stop_zone(&self, direction: Direction, position: &Point) -> bool {
        let distance = self.signed_distance(direction, position);
        distance >= 0.0 && distance <= self.config.stop_distance
    }

    pub fn is_past_intersection(&self, direction: Direction, position: &Point) -> bool {
        self.signed_distance(direction, position) < -self.config.stop_distance
    }

    pub fn distance_to_center(&self, position: &Point) -> f32 {
        (*position - self.center).magnitude()
    }
}

pub struct PhysicsEngine {
    geometry: IntersectionGeometry,
    speeds: BaseSpeeds,
    emergency_obeys_signals: bool,
    siren_blink_frames: u32,
}

impl PhysicsEngine {
    pub fn new(geometry: IntersectionGeometry, traffic: &TrafficConfig) -> Self {
        Self {
            geometry,
            speeds: traffic.speeds.clone(),
            emergency_obeys_signals: traffic.emergency_vehicles_obey_signals,
            siren_blink_frames: traffic.siren_blink_frames,
        }
    }

    pub fn geometry(&self) -> &IntersectionGeometry {
        &self.geometry
    }

    /// One animation step for a single vehicle: signal compliance, motion and
    /// siren. `dt` is in seconds.
    pub fn update(&self, vehicle: &mut Vehicle, signals: &SignalState, speed_multiplier: f32, dt: f32) {
        self.apply_stop_line(vehicle, signals);

        // Integrate position
        if !vehicle.stopped {
            vehicle.position += self.velocity(vehicle, speed_multiplier) * dt;
        }

        if vehicle.is_emergency() {
            self.update_siren(vehicle);
        }
    }

    /// Whether the signal applies to this vehicle at all.
    pub fn is_gated(&self, vehicle: &Vehicle) -> bool {
        !vehicle.is_emergency() || self.emergency_obeys_signals
    }

    pub fn apply_stop_line(&self, vehicle: &mut Vehicle, signals: &SignalState) {
        if self.geometry.in_stop_zone(vehicle.direction, &vehicle.position) {
            // Yellow counts as stop
            vehicle.stopped = self.is_gated(vehicle) && !signals.is_green(vehicle.direction);
        } else {
            vehicle.stopped = false;
            if self.geometry.is_past_intersection(vehicle.direction, &vehicle.position) {
                vehicle.has_passed_intersection = true;
            }
        }
    }

    pub fn velocity(&self, vehicle: &Vehicle, speed_multiplier: f32) -> Vec2 {
        if vehicle.stopped {
            return Vec2::zeros();
        }
        vehicle.direction.unit_vector() * self.speeds.for_class(vehicle.class) * speed_multiplier
    }

    fn update_siren(&self, vehicle: &mut Vehicle) {
        vehicle.siren.frames += 1;
        if vehicle.siren.frames >= self.siren_blink_frames {
            vehicle.siren.frames = 0;
            vehicle.siren.lit = !vehicle.siren.lit;
        }
    }
}
