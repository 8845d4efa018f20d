//! Core types shared by the grid and its producers.
//!
//! Coordinate convention:
//! - **X-axis**: world x in meters
//! - **Y-axis**: world y in meters
//! - **Heading**: counter-clockwise rotation from +X (radians), normalized to (-π, π]
//!
//! ## Type Categories
//!
//! - [`GridCoord`]: Integer cell indices (column, row)
//! - [`WorldPoint`]: Floating-point world coordinates in meters
//! - [`Pose2D`]: Robot position and heading, taken as ground truth
//! - [`RangeScan`]: Ordered beams with a start angle and fixed increment

mod math;
mod point;
mod pose;
mod scan;

pub use math::{angle_diff, normalize_angle};
pub use point::{GridCoord, WorldPoint};
pub use pose::Pose2D;
pub use scan::RangeScan;
