//! # DAL Grid
//!
//! 2D occupancy grid that fuses streamed range-sensor beams into a stable,
//! bounded-confidence probability map.
//!
//! ## Overview
//!
//! Each cell stores a log-odds value `L = ln(p / (1 - p))` clamped to
//! `[-4, 4]`. Beams are traced with Bresenham's algorithm: cells the beam
//! passes through receive a "miss" (evidence of free space) and the endpoint
//! receives a "hit" when the reading is inside the sensor's range.
//!
//! Unlike a plain Bayesian grid, a cell **freezes** once its evidence is
//! strong (`L <= -2` or `L >= +2`) and ignores every later observation. A
//! single noisy beam can therefore never reopen a settled wall.
//!
//! ## Quick Start
//!
//! ```rust
//! use dal_grid::{GridConfig, OccupancyGrid, Pose2D, RangeScan};
//!
//! let config = GridConfig::with_bounds(-2.0, 2.0, -2.0, 2.0, 0.1);
//! let mut grid = OccupancyGrid::new(config).expect("valid geometry");
//!
//! let scan = RangeScan::full_circle(vec![1.0; 360], 0.0);
//! let stats = grid.fold(&Pose2D::new(0.0, 0.0, 0.0), &scan);
//! assert_eq!(stats.beams, 360);
//!
//! let snapshot = grid.snapshot();
//! assert_eq!(snapshot.probability.len(), snapshot.width * snapshot.height);
//! ```
//!
//! ## Coordinate System
//!
//! - X: world x in meters, columns grow with x
//! - Y: world y in meters, rows grow with y
//! - Heading: radians, CCW positive from +X, normalized to (-π, π]
//!
//! ## Synchronization
//!
//! The grid has no internal locking. When several sensor sources map into one
//! grid, the caller serializes the `fold` calls.

#![warn(missing_docs)]

pub mod core;
pub mod error;
pub mod grid;

pub use core::{GridCoord, Pose2D, RangeScan, WorldPoint, angle_diff, normalize_angle};
pub use error::{GridError, Result};
pub use grid::{
    FoldStats, GridBounds, GridConfig, GridSnapshot, GridStats, LogOddsConfig, MAX_CELLS,
    OccupancyGrid,
};
