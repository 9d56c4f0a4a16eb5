//! Direction and obstacle geometry codec
//!
//! Pure lookups from entity fields to rotations and box sizes. Blocks are
//! modelled pointing down, so every direction is a roll about the depth axis.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use super::math::Vec3;
use crate::error::EditorError;
use crate::timeline::{CutDirection, ObstacleType};

/// Sizes shared by everything drawn in the scene
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneMetrics {
    /// Edge length of a note cube
    pub block_size: f32,
    /// Distance between lane (and layer) centres
    pub lane_width: f32,
    /// How far behind the scene origin beat 0 sits
    pub song_offset: f32,
    /// Depth of the visible field, in scene units
    pub render_depth: f64,
    /// Depth given to zero-length obstacles so they stay pickable
    pub min_obstacle_depth: f32,
    /// Pushes obstacle boxes slightly towards the viewer to avoid z-fighting
    pub obstacle_z_bias: f32,
}

impl Default for SceneMetrics {
    fn default() -> Self {
        Self {
            block_size: 1.0,
            lane_width: 1.1,
            song_offset: 6.0,
            render_depth: 100.0,
            min_obstacle_depth: 0.01,
            obstacle_z_bias: 0.1,
        }
    }
}

/// Width, height and depth of an obstacle box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxExtent {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

/// Roll angle for a cut direction
pub fn direction_rotation(direction: CutDirection) -> f32 {
    match direction {
        CutDirection::Up => PI,
        CutDirection::Down => 0.0,
        CutDirection::Left => PI * -0.5,
        CutDirection::Right => PI * 0.5,
        CutDirection::UpLeft => PI * -0.75,
        CutDirection::UpRight => PI * 0.75,
        CutDirection::DownLeft => PI * -0.25,
        CutDirection::DownRight => PI * 0.25,
        CutDirection::Center => 0.0,
    }
}

/// Roll angle for a raw direction code (0..=8)
pub fn rotation_for_direction(code: i64) -> Result<f32, EditorError> {
    CutDirection::try_from(code).map(direction_rotation)
}

/// Box size for an obstacle. Walls reach the floor, ceilings only hang down
/// to head height.
pub fn box_extent_for_obstacle(
    colspan: u8,
    obstacle_type: ObstacleType,
    beat_duration: f64,
    beat_depth: f64,
    metrics: &SceneMetrics,
) -> BoxExtent {
    let width = colspan as f32 * metrics.lane_width;
    let height = match obstacle_type {
        ObstacleType::Wall => metrics.lane_width * 3.5,
        ObstacleType::Ceiling => metrics.lane_width * 1.25,
    };
    let depth = ((beat_duration * beat_depth) as f32).max(metrics.min_obstacle_depth);
    BoxExtent { width, height, depth }
}

/// Convert a top-left-front anchored position into the box centre the
/// renderer expects
pub fn anchor_to_center_offset(position: Vec3, extent: BoxExtent, metrics: &SceneMetrics) -> Vec3 {
    Vec3::new(
        position.x + metrics.block_size * (extent.width / 2.0),
        position.y - extent.height / 2.0,
        position.z - extent.depth / 2.0 + metrics.obstacle_z_bias,
    )
}
