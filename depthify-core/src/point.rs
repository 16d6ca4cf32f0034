//! Point types and related functionality

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// One sampled depth pixel.
///
/// `x`/`y` are pixel coordinates, `z` the fused depth in `[0, 1]` before any
/// scaling, and `color` the gamma-mapped 8-bit colour of the pixel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub x: u32,
    pub y: u32,
    pub z: f32,
    pub color: [u8; 3],
}

impl PointRecord {
    pub fn new(x: u32, y: u32, z: f32, color: [u8; 3]) -> Self {
        Self { x, y, z, color }
    }

    /// Planar position as used by triangulation and spatial indexing
    pub fn xy(&self) -> [f64; 2] {
        [self.x as f64, self.y as f64]
    }

    /// 3D position with depth multiplied by `scale_z`
    pub fn position(&self, scale_z: f32) -> Point3f {
        Point3f::new(self.x as f32, self.y as f32, self.z * scale_z)
    }
}

impl Default for PointRecord {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            z: 0.0,
            color: [255, 255, 255],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_scales_only_depth() {
        let record = PointRecord::new(3, 7, 0.5, [1, 2, 3]);
        let p = record.position(60.0);
        assert_eq!(p, Point3f::new(3.0, 7.0, 30.0));
        assert_eq!(record.xy(), [3.0, 7.0]);
    }
}
