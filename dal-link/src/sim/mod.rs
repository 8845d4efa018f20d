//! Simulated robot
//!
//! Stand-in device layer for running agents without hardware: a disc-shaped
//! vehicle in a rectangular room with a ray-cast range sensor and a
//! synthetic camera. Every [`RobotIo::apply`] advances the simulation by one
//! tick using the command just given.
//!
//! Kinematics:
//! - Holonomic: body velocity `(vx, vy)` rotated into the world frame
//! - Differential: `v = (vr + vl) / 2`, `ω = (vr − vl) / wheel_base`
//!
//! Actuator units are converted to m/s with `velocity_scale`. A move that
//! would put the vehicle into a wall is rejected (rotation still applies).
//! The reported heading carries `heading_bias` so calibration has something
//! to find.

mod room;

pub use room::Room;

use crate::config::{AppConfig, SimulationConfig};
use crate::navigation::SteeringIntent;
use crate::session::RobotIo;
use crate::wire::ImageFrame;
use dal_grid::{Pose2D, normalize_angle};
use std::f32::consts::TAU;

/// Collision radius of the vehicle (meters)
const ROBOT_RADIUS: f32 = 0.15;

/// Beam layout of the simulated range sensor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeamLayout {
    /// Beams per scan, 0 for no sensor
    pub count: usize,
    /// Angle of beam 0 relative to the heading (radians)
    pub angle_min: f32,
    /// Angle between beams (radians)
    pub angle_increment: f32,
    /// Readings at or past this are reported as infinity
    pub max_range: f32,
}

/// Kinematic vehicle in a [`Room`].
pub struct SimulatedRobot {
    room: Room,
    x: f32,
    y: f32,
    theta: f32,
    heading_bias: f32,
    velocity_scale: f32,
    wheel_base: f32,
    dt: f32,
    beams: BeamLayout,
    camera: (u16, u16),
    collisions: u64,
}

impl SimulatedRobot {
    /// Robot at the configured start pose, integrating `tick_ms` per command
    pub fn new(config: &SimulationConfig, beams: BeamLayout, tick_ms: u64) -> Self {
        Self {
            room: Room::new(
                config.room_x_min,
                config.room_x_max,
                config.room_y_min,
                config.room_y_max,
            ),
            x: config.start_x,
            y: config.start_y,
            theta: normalize_angle(config.start_heading),
            heading_bias: config.heading_bias,
            velocity_scale: config.velocity_scale,
            wheel_base: config.wheel_base,
            dt: tick_ms as f32 / 1000.0,
            beams,
            camera: (config.camera_width, config.camera_height),
            collisions: 0,
        }
    }

    /// Build from the application config, matching the observer's beam layout.
    pub fn from_config(config: &AppConfig) -> Self {
        let count = config.simulation.beam_count;
        let angle_increment = match config.mapping.angle_increment {
            Some(increment) => increment,
            None if count > 0 => TAU / count as f32,
            None => 0.0,
        };
        let beams = BeamLayout {
            count,
            angle_min: config.mapping.angle_min,
            angle_increment,
            max_range: config.mapping.max_range,
        };
        Self::new(&config.simulation, beams, config.telemetry.tick_ms)
    }

    /// Ground-truth pose (no heading bias)
    pub fn true_pose(&self) -> Pose2D {
        Pose2D::new(self.x, self.y, self.theta)
    }

    /// Teleport, bypassing collision checks
    pub fn set_pose(&mut self, pose: Pose2D) {
        self.x = pose.x;
        self.y = pose.y;
        self.theta = pose.theta;
    }

    /// Moves rejected by a wall
    pub fn collisions(&self) -> u64 {
        self.collisions
    }

    fn integrate(&mut self, intent: SteeringIntent) {
        let (new_x, new_y, new_theta) = match intent {
            SteeringIntent::Holonomic { vx, vy, omega } => {
                let (sin, cos) = self.theta.sin_cos();
                let vx = vx * self.velocity_scale;
                let vy = vy * self.velocity_scale;
                let omega = omega * self.velocity_scale;
                (
                    self.x + (vx * cos - vy * sin) * self.dt,
                    self.y + (vx * sin + vy * cos) * self.dt,
                    self.theta + omega * self.dt,
                )
            }
            SteeringIntent::Differential { left, right } => {
                let vl = left * self.velocity_scale;
                let vr = right * self.velocity_scale;
                let v = (vr + vl) / 2.0;
                let omega = (vr - vl) / self.wheel_base;

                if omega.abs() < 1e-6 {
                    (
                        self.x + v * self.theta.cos() * self.dt,
                        self.y + v * self.theta.sin() * self.dt,
                        self.theta,
                    )
                } else {
                    let r = v / omega;
                    let new_theta = self.theta + omega * self.dt;
                    (
                        self.x + r * (new_theta.sin() - self.theta.sin()),
                        self.y + r * (self.theta.cos() - new_theta.cos()),
                        new_theta,
                    )
                }
            }
        };

        if self.room.fits(new_x, new_y, ROBOT_RADIUS) {
            self.x = new_x;
            self.y = new_y;
        } else {
            self.collisions += 1;
            log::debug!("Simulated collision at ({:.2}, {:.2})", new_x, new_y);
        }
        self.theta = normalize_angle(new_theta);
    }
}

impl RobotIo for SimulatedRobot {
    fn pose(&mut self) -> Pose2D {
        Pose2D::new(self.x, self.y, self.theta + self.heading_bias)
    }

    fn range_scan(&mut self) -> Option<Vec<f32>> {
        if self.beams.count == 0 {
            return None;
        }
        let ranges = (0..self.beams.count)
            .map(|i| {
                let angle = self.theta + self.beams.angle_min + i as f32 * self.beams.angle_increment;
                let d = self.room.ray_cast(self.x, self.y, angle, self.beams.max_range);
                // No return reads as infinity, like the hardware
                if d >= self.beams.max_range {
                    f32::INFINITY
                } else {
                    d
                }
            })
            .collect();
        Some(ranges)
    }

    fn image(&mut self) -> Option<ImageFrame> {
        let (width, height) = self.camera;
        if width == 0 || height == 0 {
            return None;
        }

        // Heading-tinted gradient, BGRA like a capture device
        let tint = ((self.theta + std::f32::consts::PI) / TAU * 255.0) as u8;
        let mut bgra = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                let r = (x as u32 * 255 / width as u32) as u8;
                let g = (y as u32 * 255 / height as u32) as u8;
                bgra.extend_from_slice(&[tint, g, r, 255]);
            }
        }
        ImageFrame::from_bgra(width, height, &bgra).ok()
    }

    fn apply(&mut self, intent: SteeringIntent) {
        self.integrate(intent);
    }

    fn has_range_sensor(&self) -> bool {
        self.beams.count > 0
    }

    fn has_image_sensor(&self) -> bool {
        self.camera.0 > 0 && self.camera.1 > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn robot() -> SimulatedRobot {
        SimulatedRobot::from_config(&AppConfig::default())
    }

    #[test]
    fn test_holonomic_forward() {
        let mut sim = robot();
        // 5 units * 0.05 = 0.25 m/s for 32ms
        sim.apply(SteeringIntent::Holonomic {
            vx: 5.0,
            vy: 0.0,
            omega: 0.0,
        });
        assert_relative_eq!(sim.true_pose().x, 0.008, epsilon = 1e-6);
        assert_relative_eq!(sim.true_pose().y, 0.0);
    }

    #[test]
    fn test_holonomic_strafe_is_body_frame() {
        let mut sim = robot();
        sim.set_pose(Pose2D::new(0.0, 0.0, FRAC_PI_2));
        sim.apply(SteeringIntent::Holonomic {
            vx: 0.0,
            vy: 5.0,
            omega: 0.0,
        });
        // Facing +Y, strafing left moves toward -X
        assert_relative_eq!(sim.true_pose().x, -0.008, epsilon = 1e-6);
        assert_relative_eq!(sim.true_pose().y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_differential_turn_direction() {
        let mut sim = robot();
        // right > left turns counter-clockwise
        sim.apply(SteeringIntent::Differential {
            left: -5.0,
            right: 5.0,
        });
        assert!(sim.true_pose().theta > 0.0);
        assert_relative_eq!(sim.true_pose().x, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_wall_blocks_motion() {
        let mut sim = robot();
        sim.set_pose(Pose2D::new(3.32, 0.0, 0.0));
        sim.apply(SteeringIntent::Holonomic {
            vx: 5.0,
            vy: 0.0,
            omega: 0.0,
        });
        assert_eq!(sim.true_pose().x, 3.32);
        assert_eq!(sim.collisions(), 1);
    }

    #[test]
    fn test_heading_bias_reported() {
        let mut config = AppConfig::default();
        config.simulation.heading_bias = 0.3;
        let mut sim = SimulatedRobot::from_config(&config);
        assert_relative_eq!(sim.pose().theta, 0.3, epsilon = 1e-6);
        assert_eq!(sim.true_pose().theta, 0.0);
    }

    #[test]
    fn test_range_scan_layout() {
        let mut sim = robot();
        let ranges = sim.range_scan().unwrap();
        assert_eq!(ranges.len(), 360);
        // Beam 0 points backwards (angle_min = π): wall at x = -3.475
        assert_relative_eq!(ranges[0], 3.475, epsilon = 1e-3);
        // Beam 180 points forward: wall at x = 3.475
        assert_relative_eq!(ranges[180], 3.475, epsilon = 1e-3);
        // Diagonals exceed max range
        assert!(ranges[45].is_infinite());
    }

    #[test]
    fn test_sensors_can_be_removed() {
        let mut config = AppConfig::default();
        config.simulation.beam_count = 0;
        config.simulation.camera_width = 0;
        let mut sim = SimulatedRobot::from_config(&config);
        assert!(!sim.has_range_sensor());
        assert!(!sim.has_image_sensor());
        assert_eq!(sim.range_scan(), None);
        assert_eq!(sim.image(), None);
    }

    #[test]
    fn test_camera_frame() {
        let mut sim = robot();
        sim.set_pose(Pose2D::new(0.0, 0.0, PI / 2.0));
        let frame = sim.image().unwrap();
        assert_eq!((frame.width, frame.height), (32, 24));
        assert_eq!(frame.rgb().len(), 32 * 24 * 3);
        assert_eq!(frame.pixel(0, 0), Some([0, 0, 191]));
    }
}
