//! Point types and related functionality

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A vertex with color information
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColoredPoint3f {
    pub position: Point3f,
    pub color: [u8; 3],
}

impl ColoredPoint3f {
    /// Create a colored point from a position and an RGB color
    pub fn new(position: Point3f, color: [u8; 3]) -> Self {
        Self { position, color }
    }

    /// Create a white point at the given position
    pub fn from_position(position: Point3f) -> Self {
        Self {
            position,
            color: [255, 255, 255],
        }
    }
}

impl Default for ColoredPoint3f {
    fn default() -> Self {
        Self {
            position: Point3f::origin(),
            color: [255, 255, 255],
        }
    }
}
