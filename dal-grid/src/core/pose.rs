//! 2D pose type for robot position and heading.

use super::math::normalize_angle;
use super::point::WorldPoint;
use serde::{Deserialize, Serialize};

/// Robot position and heading.
///
/// Supplied by the caller each tick and taken as ground truth; the grid never
/// corrects it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    /// X position in meters.
    pub x: f32,
    /// Y position in meters.
    pub y: f32,
    /// Heading in radians (-π, π], CCW positive from X-axis.
    pub theta: f32,
}

impl Pose2D {
    /// Create a new pose, normalizing the heading to (-π, π].
    #[inline]
    pub fn new(x: f32, y: f32, theta: f32) -> Self {
        Self {
            x,
            y,
            theta: normalize_angle(theta),
        }
    }

    /// Position as a world point.
    #[inline]
    pub fn position(&self) -> WorldPoint {
        WorldPoint::new(self.x, self.y)
    }

    /// Distance from this pose's position to a point.
    #[inline]
    pub fn distance_to(&self, point: WorldPoint) -> f32 {
        self.position().distance(&point)
    }

    /// Same position with an additive heading correction.
    #[inline]
    pub fn with_heading_offset(&self, offset: f32) -> Self {
        Self::new(self.x, self.y, self.theta + offset)
    }
}
