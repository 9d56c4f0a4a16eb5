//! Small vector type for projected scene positions

use serde::{Deserialize, Serialize};

/// 3D Vector in scene units
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Same vector moved along the depth axis
    pub fn offset_z(self, dz: f32) -> Vec3 {
        Vec3 { z: self.z + dz, ..self }
    }
}

impl From<Vec3> for macroquad::math::Vec3 {
    fn from(v: Vec3) -> Self {
        macroquad::math::vec3(v.x, v.y, v.z)
    }
}
