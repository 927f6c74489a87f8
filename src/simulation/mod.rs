use nalgebra::{Vector2, Point2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;
use std::str::FromStr;
use std::time::Duration;

use crate::error::SimError;

pub mod physics;
pub mod signals;
pub mod stats;
pub mod traffic;

pub use physics::*;
pub use signals::*;
pub use stats::*;
pub use traffic::*;

pub type Vec2 = Vector2<f32>;
pub type Point = Point2<f32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VehicleId(pub u64);

/// The side of the intersection a vehicle approaches from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    NorthSouth,
    EastWest,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::North, Direction::South, Direction::East, Direction::West];

    /// Travel direction. North-bound traffic enters at the top edge and moves
    /// down the screen (+y).
    pub fn unit_vector(self) -> Vec2 {
        match self {
            Direction::North => Vec2::new(0.0, 1.0),
            Direction::South => Vec2::new(0.0, -1.0),
            Direction::West => Vec2::new(1.0, 0.0),
            Direction::East => Vec2::new(-1.0, 0.0),
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Direction::North | Direction::South => Axis::NorthSouth,
            Direction::East | Direction::West => Axis::EastWest,
        }
    }

    fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::South => 1,
            Direction::East => 2,
            Direction::West => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "north" | "n" => Ok(Direction::North),
            "south" | "s" => Ok(Direction::South),
            "east" | "e" => Ok(Direction::East),
            "west" | "w" => Ok(Direction::West),
            _ => Err(SimError::UnknownDirection(s.to_string())),
        }
    }
}

impl Axis {
    pub fn cross(self) -> Axis {
        match self {
            Axis::NorthSouth => Axis::EastWest,
            Axis::EastWest => Axis::NorthSouth,
        }
    }

    pub fn directions(self) -> [Direction; 2] {
        match self {
            Axis::NorthSouth => [Direction::North, Direction::South],
            Axis::EastWest => [Direction::East, Direction::West],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Axis::NorthSouth => "North-South",
            Axis::EastWest => "East-West",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleClass {
    Car,
    Bus,
    Ambulance,
    Firetruck,
}

impl VehicleClass {
    pub const ALL: [VehicleClass; 4] = [
        VehicleClass::Car,
        VehicleClass::Bus,
        VehicleClass::Ambulance,
        VehicleClass::Firetruck,
    ];

    /// Preemption priority; lower ranks are served first. `None` for classes
    /// that never request preemption.
    pub fn emergency_rank(self) -> Option<u8> {
        match self {
            VehicleClass::Ambulance => Some(0),
            VehicleClass::Firetruck => Some(1),
            VehicleClass::Car | VehicleClass::Bus => None,
        }
    }

    pub fn is_emergency(self) -> bool {
        self.emergency_rank().is_some()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VehicleClass::Car => "car",
            VehicleClass::Bus => "bus",
            VehicleClass::Ambulance => "ambulance",
            VehicleClass::Firetruck => "firetruck",
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleClass {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "car" => Ok(VehicleClass::Car),
            "bus" => Ok(VehicleClass::Bus),
            "ambulance" => Ok(VehicleClass::Ambulance),
            "firetruck" | "fire_truck" | "fire-truck" => Ok(VehicleClass::Firetruck),
            _ => Err(SimError::UnknownVehicleClass(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalColor {
    Red,
    Yellow,
    Green,
}

impl fmt::Display for SignalColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SignalColor::Red => "red",
            SignalColor::Yellow => "yellow",
            SignalColor::Green => "green",
        })
    }
}

/// Color shown to each approach. Always produced whole by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalState {
    colors: [SignalColor; 4],
}

impl SignalState {
    pub fn all_red() -> Self {
        Self { colors: [SignalColor::Red; 4] }
    }

    /// `active` shows `color`, the cross axis is held red.
    pub fn for_axis(active: Axis, color: SignalColor) -> Self {
        let mut state = Self::all_red();
        for direction in active.directions() {
            state.colors[direction.index()] = color;
        }
        state
    }

    pub fn get(&self, direction: Direction) -> SignalColor {
        self.colors[direction.index()]
    }

    pub fn is_green(&self, direction: Direction) -> bool {
        self.get(direction) == SignalColor::Green
    }

    pub fn green_directions(&self) -> Vec<Direction> {
        Direction::ALL.into_iter().filter(|d| self.is_green(*d)).collect()
    }
}

impl Index<Direction> for SignalState {
    type Output = SignalColor;

    fn index(&self, direction: Direction) -> &SignalColor {
        &self.colors[direction.index()]
    }
}

#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    pub direction: Direction,
    pub class: VehicleClass,
    pub position: Point,
    pub stopped: bool,
    pub has_passed_intersection: bool,
    pub spawned_at: Duration,
    pub siren: SirenState,
}

/// Blink state of an emergency vehicle's light bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SirenState {
    pub frames: u32,
    pub lit: bool,
}

impl Vehicle {
    pub fn new(id: VehicleId, direction: Direction, class: VehicleClass, position: Point, spawned_at: Duration) -> Self {
        Self {
            id,
            direction,
            class,
            position,
            stopped: false,
            has_passed_intersection: false,
            spawned_at,
            siren: SirenState::default(),
        }
    }

    pub fn is_emergency(&self) -> bool {
        self.class.is_emergency()
    }

    pub fn snapshot(&self) -> VehicleSnapshot {
        VehicleSnapshot {
            id: self.id,
            direction: self.direction,
            class: self.class,
            x: self.position.x,
            y: self.position.y,
            stopped: self.stopped,
        }
    }
}

/// Read-only view handed to renderers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    pub id: VehicleId,
    pub direction: Direction,
    pub class: VehicleClass,
    pub x: f32,
    pub y: f32,
    pub stopped: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_directions_case_insensitively() {
        assert_eq!("WEST".parse::<Direction>(), Ok(Direction::West));
        assert_eq!(" north ".parse::<Direction>(), Ok(Direction::North));
        assert_eq!(
            "up".parse::<Direction>(),
            Err(SimError::UnknownDirection("up".to_string()))
        );
    }

    #[test]
    fn only_emergency_classes_have_rank() {
        assert!(VehicleClass::Ambulance.emergency_rank() < VehicleClass::Firetruck.emergency_rank());
        assert_eq!(VehicleClass::Car.emergency_rank(), None);
        assert_eq!(VehicleClass::Bus.emergency_rank(), None);
        assert!("tractor".parse::<VehicleClass>().is_err());
    }

    #[test]
    fn axis_projection_holds_cross_axis_red() {
        let state = SignalState::for_axis(Axis::EastWest, SignalColor::Yellow);
        assert_eq!(state[Direction::East], SignalColor::Yellow);
        assert_eq!(state[Direction::West], SignalColor::Yellow);
        assert_eq!(state[Direction::North], SignalColor::Red);
        assert_eq!(state[Direction::South], SignalColor::Red);
        assert!(state.green_directions().is_empty());
    }
}
