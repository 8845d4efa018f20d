//! # DAL Link
//!
//! Robot-side and host-side plumbing for DAL multi-robot mapping runs.
//!
//! - [`wire`]: telemetry datagram codecs and the line-based command protocol
//! - [`navigation`]: waypoint navigator, steering policies, heading calibration
//! - [`session`]: per-robot tick loop tying device, navigator and sockets together
//! - [`observer`]: UDP receivers that fold every robot's scans into one grid
//! - [`planner`]: blocking client that feeds a robot one waypoint at a time
//! - [`sim`]: kinematic stand-in for the robot hardware
//!
//! ## Data Flow
//!
//! ```text
//! planner ──WAYPOINT──> session ──pose+ranges──> MapObserver ──fold──> grid
//!    ^                     │    ──image───────> ImageObserver
//!    └──────REACHED────────┘
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod navigation;
pub mod observer;
pub mod planner;
pub mod session;
pub mod sim;
pub mod wire;

pub use config::{AppConfig, Drivetrain};
pub use error::{Error, Result};
pub use navigation::{Differential, Holonomic, NavState, Navigator, SteeringIntent, SteeringPolicy};
pub use observer::{ImageObserver, MapObserver};
pub use planner::PlannerClient;
pub use session::{RobotIo, TelemetrySession};
pub use sim::SimulatedRobot;
