//! Configuration for DAL agents, planners and observers
//!
//! Loads configuration from a TOML file. Every field has a default, so an
//! empty file (or no file at all) yields the reference setup: robot 0 on a
//! holonomic base streaming to localhost.

use crate::error::{Error, Result};
use dal_grid::{GridConfig, RangeScan};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fs;
use std::path::Path;

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Robot identity and drivetrain
    pub robot: RobotConfig,
    /// Socket endpoints
    pub network: NetworkConfig,
    /// Waypoint following
    pub navigation: NavigationConfig,
    /// Tick loop timing
    pub telemetry: TelemetryConfig,
    /// Observer grid and scan layout
    pub mapping: MappingConfig,
    /// Simulated vehicle
    pub simulation: SimulationConfig,
    /// Log filter
    pub logging: LoggingConfig,
}

/// Drive base kinematics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Drivetrain {
    /// Mecanum / omni base, translates in any direction
    #[default]
    Holonomic,
    /// Two-wheel differential base
    Differential,
}

impl Drivetrain {
    /// Reference drivetrain for a robot id (1 is the differential vehicle)
    pub fn for_robot_id(id: u8) -> Self {
        if id == 1 {
            Drivetrain::Differential
        } else {
            Drivetrain::Holonomic
        }
    }
}

impl std::fmt::Display for Drivetrain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Drivetrain::Holonomic => write!(f, "holonomic"),
            Drivetrain::Differential => write!(f, "differential"),
        }
    }
}

impl std::str::FromStr for Drivetrain {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "holonomic" => Ok(Drivetrain::Holonomic),
            "differential" => Ok(Drivetrain::Differential),
            other => Err(format!("unknown drivetrain '{}'", other)),
        }
    }
}

/// Robot identity
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RobotConfig {
    /// Robot id carried in every datagram; command port is base + id
    #[serde(default)]
    pub id: u8,

    /// Steering policy selected once at startup
    #[serde(default)]
    pub drivetrain: Drivetrain,

    /// Refuse to start without a range sensor
    #[serde(default)]
    pub require_range_sensor: bool,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            id: 0,
            drivetrain: Drivetrain::default(),
            require_range_sensor: false,
        }
    }
}

/// Socket endpoints
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// Host receiving pose and image datagrams
    #[serde(default = "default_telemetry_host")]
    pub telemetry_host: String,

    /// UDP port for pose+range datagrams (default: 5555)
    #[serde(default = "default_pose_port")]
    pub pose_port: u16,

    /// UDP port for image datagrams (default: 5556)
    #[serde(default = "default_image_port")]
    pub image_port: u16,

    /// Interface the command listener binds to
    #[serde(default = "default_command_bind")]
    pub command_bind: String,

    /// Command port of robot 0 (default: 6000)
    #[serde(default = "default_command_port_base")]
    pub command_port_base: u16,

    /// Largest image datagram sent; bigger frames are dropped
    #[serde(default = "default_max_image_datagram")]
    pub max_image_datagram: usize,
}

impl NetworkConfig {
    /// TCP command port for a robot
    pub fn command_port(&self, robot_id: u8) -> u16 {
        self.command_port_base.saturating_add(robot_id as u16)
    }

    /// `host:port` the command listener binds to
    pub fn command_addr(&self, robot_id: u8) -> String {
        format!("{}:{}", self.command_bind, self.command_port(robot_id))
    }

    /// `host:port` pose datagrams are sent to
    pub fn pose_addr(&self) -> String {
        format!("{}:{}", self.telemetry_host, self.pose_port)
    }

    /// `host:port` image datagrams are sent to
    pub fn image_addr(&self) -> String {
        format!("{}:{}", self.telemetry_host, self.image_port)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            telemetry_host: default_telemetry_host(),
            pose_port: default_pose_port(),
            image_port: default_image_port(),
            command_bind: default_command_bind(),
            command_port_base: default_command_port_base(),
            max_image_datagram: default_max_image_datagram(),
        }
    }
}

/// Waypoint following parameters
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NavigationConfig {
    /// Arrival radius in meters (default: 0.30)
    #[serde(default = "default_arrival_tolerance")]
    pub arrival_tolerance: f32,

    /// Drive speed in actuator units (default: 5.0)
    #[serde(default = "default_speed")]
    pub speed: f32,

    /// Differential turn gain per radian of heading error (default: 8.0)
    #[serde(default = "default_turn_gain")]
    pub turn_gain: f32,

    /// Heading error above which a differential base turns in place (rad)
    #[serde(default = "default_turn_threshold")]
    pub turn_threshold: f32,

    /// Share of the turn command mixed into a forward arc (default: 0.3)
    #[serde(default = "default_arc_gain")]
    pub arc_gain: f32,

    /// Forward ticks used to calibrate heading, 0 disables (default: 15)
    #[serde(default = "default_calibration_ticks")]
    pub calibration_ticks: u32,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            arrival_tolerance: default_arrival_tolerance(),
            speed: default_speed(),
            turn_gain: default_turn_gain(),
            turn_threshold: default_turn_threshold(),
            arc_gain: default_arc_gain(),
            calibration_ticks: default_calibration_ticks(),
        }
    }
}

/// Tick loop timing
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// Control period in milliseconds (default: 32)
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Send an image every N ticks (default: 4)
    #[serde(default = "default_image_every")]
    pub image_every: u64,

    /// Log navigation progress every N ticks (default: 100)
    #[serde(default = "default_progress_every")]
    pub progress_every: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            image_every: default_image_every(),
            progress_every: default_progress_every(),
        }
    }
}

/// Observer-side occupancy map
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MappingConfig {
    /// Left edge of the mapped area (meters)
    #[serde(default = "default_map_x_min")]
    pub x_min: f32,
    /// Right edge
    #[serde(default = "default_map_x_max")]
    pub x_max: f32,
    /// Bottom edge
    #[serde(default = "default_map_y_min")]
    pub y_min: f32,
    /// Top edge
    #[serde(default = "default_map_y_max")]
    pub y_max: f32,

    /// Cell size in meters (default: 0.15)
    #[serde(default = "default_map_resolution")]
    pub resolution: f32,

    /// Sensor range; longer readings count as no return (default: 3.5)
    #[serde(default = "default_max_range")]
    pub max_range: f32,

    /// Angle of beam 0 relative to heading (default: π)
    #[serde(default = "default_angle_min")]
    pub angle_min: f32,

    /// Angular step between beams; 2π/N when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle_increment: Option<f32>,
}

impl MappingConfig {
    /// Validated grid geometry
    pub fn grid_config(&self) -> Result<GridConfig> {
        let config = GridConfig::with_bounds(
            self.x_min,
            self.x_max,
            self.y_min,
            self.y_max,
            self.resolution,
        )
        .with_max_range(self.max_range);
        config.validate()?;
        Ok(config)
    }

    /// Lay raw ranges out with the configured beam geometry
    pub fn scan_from(&self, ranges: Vec<f32>) -> RangeScan {
        match self.angle_increment {
            Some(increment) => RangeScan::new(ranges, self.angle_min, increment),
            None => RangeScan::full_circle(ranges, self.angle_min),
        }
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            x_min: default_map_x_min(),
            x_max: default_map_x_max(),
            y_min: default_map_y_min(),
            y_max: default_map_y_max(),
            resolution: default_map_resolution(),
            max_range: default_max_range(),
            angle_min: default_angle_min(),
            angle_increment: None,
        }
    }
}

/// Built-in simulated vehicle used when no hardware is attached
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// West wall of the rectangular room (meters)
    #[serde(default = "default_room_x_min")]
    pub room_x_min: f32,
    /// East wall
    #[serde(default = "default_room_x_max")]
    pub room_x_max: f32,
    /// South wall
    #[serde(default = "default_room_y_min")]
    pub room_y_min: f32,
    /// North wall
    #[serde(default = "default_room_y_max")]
    pub room_y_max: f32,

    /// Starting X (meters)
    #[serde(default)]
    pub start_x: f32,
    /// Starting Y (meters)
    #[serde(default)]
    pub start_y: f32,
    /// Starting heading (radians)
    #[serde(default)]
    pub start_heading: f32,

    /// Error added to every reported heading (radians)
    #[serde(default)]
    pub heading_bias: f32,

    /// Meters per second per actuator unit (default: 0.05)
    #[serde(default = "default_velocity_scale")]
    pub velocity_scale: f32,

    /// Wheel separation of the differential base (default: 0.33)
    #[serde(default = "default_wheel_base")]
    pub wheel_base: f32,

    /// Number of range beams, 0 removes the sensor (default: 360)
    #[serde(default = "default_beam_count")]
    pub beam_count: usize,

    /// Camera width in pixels, 0 removes the camera (default: 32)
    #[serde(default = "default_camera_width")]
    pub camera_width: u16,
    /// Camera height in pixels (default: 24)
    #[serde(default = "default_camera_height")]
    pub camera_height: u16,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            room_x_min: default_room_x_min(),
            room_x_max: default_room_x_max(),
            room_y_min: default_room_y_min(),
            room_y_max: default_room_y_max(),
            start_x: 0.0,
            start_y: 0.0,
            start_heading: 0.0,
            heading_bias: 0.0,
            velocity_scale: default_velocity_scale(),
            wheel_base: default_wheel_base(),
            beam_count: default_beam_count(),
            camera_width: default_camera_width(),
            camera_height: default_camera_height(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    ///
    /// # Example
    /// ```no_run
    /// use dal_link::config::AppConfig;
    ///
    /// let config = AppConfig::from_file("dal.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values the session cannot run with
    pub fn validate(&self) -> Result<()> {
        let nav = &self.navigation;
        if !(nav.arrival_tolerance.is_finite() && nav.arrival_tolerance > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "arrival_tolerance must be positive, got {}",
                nav.arrival_tolerance
            )));
        }
        if !(nav.speed.is_finite() && nav.speed > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "speed must be positive, got {}",
                nav.speed
            )));
        }
        if self.telemetry.tick_ms == 0 {
            return Err(Error::InvalidParameter("tick_ms must be non-zero".into()));
        }
        if self.telemetry.image_every == 0 {
            return Err(Error::InvalidParameter(
                "image_every must be non-zero".into(),
            ));
        }
        self.mapping.grid_config()?;
        Ok(())
    }
}

// Default value functions
fn default_telemetry_host() -> String {
    "127.0.0.1".to_string()
}
fn default_pose_port() -> u16 {
    5555
}
fn default_image_port() -> u16 {
    5556
}
fn default_command_bind() -> String {
    "127.0.0.1".to_string()
}
fn default_command_port_base() -> u16 {
    6000
}
fn default_max_image_datagram() -> usize {
    60_000
}

// Navigation defaults
fn default_arrival_tolerance() -> f32 {
    0.30
}
fn default_speed() -> f32 {
    5.0
}
fn default_turn_gain() -> f32 {
    8.0
}
fn default_turn_threshold() -> f32 {
    0.4
}
fn default_arc_gain() -> f32 {
    0.3
}
fn default_calibration_ticks() -> u32 {
    15
}

fn default_tick_ms() -> u64 {
    32
}
fn default_image_every() -> u64 {
    4
}
fn default_progress_every() -> u64 {
    100
}

// Reference arena: 6.95m x 22.54m
fn default_map_x_min() -> f32 {
    -3.475
}
fn default_map_x_max() -> f32 {
    3.475
}
fn default_map_y_min() -> f32 {
    -11.13
}
fn default_map_y_max() -> f32 {
    11.41
}
fn default_map_resolution() -> f32 {
    0.15
}
fn default_max_range() -> f32 {
    3.5
}
fn default_angle_min() -> f32 {
    PI
}

// Simulated room matches the mapped arena
fn default_room_x_min() -> f32 {
    default_map_x_min()
}
fn default_room_x_max() -> f32 {
    default_map_x_max()
}
fn default_room_y_min() -> f32 {
    default_map_y_min()
}
fn default_room_y_max() -> f32 {
    default_map_y_max()
}
fn default_velocity_scale() -> f32 {
    0.05
}
fn default_wheel_base() -> f32 {
    0.33
}
fn default_beam_count() -> usize {
    360
}
fn default_camera_width() -> u16 {
    32
}
fn default_camera_height() -> u16 {
    24
}

fn default_log_level() -> String {
    "info".to_string()
}
