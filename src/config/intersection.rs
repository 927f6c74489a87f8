use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};
use super::Validate;
use crate::simulation::Point;

/// Layout of the crossing. Coordinates follow screen convention: the origin
/// is the top-left corner of a `width` x `height` area and y grows downward.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IntersectionConfig {
    pub width: f32,
    pub height: f32,
    /// Lateral offset of the north/south travel lanes from the center line.
    pub ns_lane_offset: f32,
    /// Lateral offset of the east/west travel lanes from the center line.
    pub ew_lane_offset: f32,
    pub stop_distance: f32,
    /// How far outside the area edge vehicles appear.
    pub spawn_distance: f32,
    /// How far past the opposite edge vehicles are removed.
    pub despawn_distance: f32,
}

impl Default for IntersectionConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 700.0,
            ns_lane_offset: 60.0,
            ew_lane_offset: 40.0,
            stop_distance: 70.0,
            spawn_distance: 150.0,
            despawn_distance: 300.0,
        }
    }
}

impl IntersectionConfig {
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

impl Validate for IntersectionConfig {
    fn validate(&self) -> Result<()> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(anyhow!("Intersection dimensions must be positive"));
        }

        if self.stop_distance <= 0.0 {
            return Err(anyhow!("Stop distance must be positive"));
        }

        if self.stop_distance >= self.width.min(self.height) / 2.0 {
            return Err(anyhow!(
                "Stop distance {} must fit inside the intersection area",
                self.stop_distance
            ));
        }

        if self.spawn_distance < 0.0 || self.despawn_distance < 0.0 {
            return Err(anyhow!("Spawn and despawn distances must be non-negative"));
        }

        if self.ns_lane_offset.abs() >= self.width / 2.0 || self.ew_lane_offset.abs() >= self.height / 2.0 {
            return Err(anyhow!("Lane offsets must stay inside the intersection area"));
        }

        Ok(())
    }
}
