//! Point and coordinate types for the occupancy grid.

use serde::{Deserialize, Serialize};

/// Grid coordinates (integer cell indices)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridCoord {
    /// Column index
    pub col: i32,
    /// Row index
    pub row: i32,
}

impl GridCoord {
    /// Create a new grid coordinate
    #[inline]
    pub fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }
}

/// World coordinates (meters)
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPoint {
    /// X coordinate in meters
    pub x: f32,
    /// Y coordinate in meters
    pub y: f32,
}

impl WorldPoint {
    /// Create a new world point
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    #[inline]
    pub fn distance(&self, other: &WorldPoint) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}
