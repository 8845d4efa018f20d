//! Range scan type.

use std::f32::consts::TAU;

/// One sweep of a planar range sensor.
///
/// Beam `i` points at `angle_min + i * angle_increment` in the robot frame.
/// A reading that is not a positive finite number means "no return within
/// range"; the grid still clears free space along such a beam.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RangeScan {
    /// Distances in meters, one per beam
    pub ranges: Vec<f32>,
    /// Angle of the first beam relative to the robot heading (radians)
    pub angle_min: f32,
    /// Angular step between consecutive beams (radians)
    pub angle_increment: f32,
}

impl RangeScan {
    /// Create a scan with an explicit angular layout.
    pub fn new(ranges: Vec<f32>, angle_min: f32, angle_increment: f32) -> Self {
        Self {
            ranges,
            angle_min,
            angle_increment,
        }
    }

    /// Create a scan whose beams evenly cover a full turn (increment 2π/N).
    pub fn full_circle(ranges: Vec<f32>, angle_min: f32) -> Self {
        let angle_increment = if ranges.is_empty() {
            0.0
        } else {
            TAU / ranges.len() as f32
        };
        Self::new(ranges, angle_min, angle_increment)
    }

    /// Number of beams
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Check if the scan has no beams
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Robot-frame angle of beam `index`
    #[inline]
    pub fn beam_angle(&self, index: usize) -> f32 {
        self.angle_min + index as f32 * self.angle_increment
    }

    /// Whether a raw reading is a usable return (finite and positive)
    #[inline]
    pub fn is_return(range: f32) -> bool {
        range.is_finite() && range > 0.0
    }
}
