//! Waypoint navigation
//!
//! Straight-line pursuit of one target at a time. The [`Navigator`] owns the
//! `Idle` / `Navigating` state, a [`SteeringPolicy`] turns heading error into
//! drivetrain commands, and a [`HeadingCalibrator`] measures the heading
//! sensor's misalignment once before navigation starts.

mod calibration;
mod state;
mod steering;

pub use calibration::HeadingCalibrator;
pub use state::{NavState, NavStep, Navigator};
pub use steering::{Differential, Holonomic, SteeringIntent, SteeringPolicy};
