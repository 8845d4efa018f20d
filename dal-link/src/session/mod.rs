//! Per-robot telemetry session
//!
//! One [`TelemetrySession`] owns everything a robot agent needs: the device
//! layer, the navigator, the outbound telemetry socket and the inbound
//! command connection. An external fixed-rate loop calls
//! [`TelemetrySession::tick`]; nothing inside blocks.
//!
//! # Tick Sequence
//!
//! ```text
//! calibrating? ── yes ──> calibrator step → apply → done
//!      │ no
//!      ▼
//! sample pose (+ heading offset)
//!      ▼
//! send Pose+Range datagram            (best effort)
//!      ▼
//! every Nth tick: send Image datagram (best effort, oversize dropped)
//!      ▼
//! poll command link → waypoints / disconnect
//!      ▼
//! navigator step → apply intent
//!      ▼
//! arrived? → send REACHED             (failure drops the link)
//! ```
//!
//! Errors never leave `tick()`: transport failures are logged and the tick
//! carries on with whatever data it has.

mod link;
mod robot;
mod telemetry;

pub use link::{CommandLink, LinkEvents};
pub use robot::RobotIo;
pub use telemetry::TelemetrySink;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::navigation::{HeadingCalibrator, NavState, Navigator, SteeringPolicy};
use crate::wire::{ImageDatagram, PoseDatagram};
use dal_grid::Pose2D;

/// Session tuning that is not socket configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionOptions {
    /// Id carried in every datagram
    pub robot_id: u8,
    /// Arrival radius (meters)
    pub arrival_tolerance: f32,
    /// Forward ticks of heading calibration, 0 disables it
    pub calibration_ticks: u32,
    /// Send an image every N ticks
    pub image_every: u64,
    /// Log progress every N ticks, 0 disables it
    pub progress_every: u64,
}

impl SessionOptions {
    /// Options from the application config
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            robot_id: config.robot.id,
            arrival_tolerance: config.navigation.arrival_tolerance,
            calibration_ticks: config.navigation.calibration_ticks,
            image_every: config.telemetry.image_every,
            progress_every: config.telemetry.progress_every,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// What happened during one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct TickReport {
    /// 1-based tick number
    pub tick: u64,
    /// Pose used this tick (heading corrected once calibrated)
    pub pose: Pose2D,
    /// Navigation state at the end of the tick
    pub state: NavState,
    /// Tick was spent on heading calibration
    pub calibrating: bool,
    /// Pose datagram went out
    pub telemetry_sent: bool,
    /// Image datagram went out
    pub image_sent: bool,
    /// Waypoints received this tick
    pub commands_received: usize,
    /// `REACHED` was written to the planner
    pub ack_sent: bool,
    /// The command connection was lost this tick
    pub disconnected: bool,
}

/// Robot agent session, generic over device layer and drivetrain.
pub struct TelemetrySession<R, P> {
    options: SessionOptions,
    robot: R,
    navigator: Navigator<P>,
    calibrator: HeadingCalibrator,
    sink: TelemetrySink,
    link: CommandLink,
    tick: u64,
}

impl<R: RobotIo, P: SteeringPolicy> TelemetrySession<R, P> {
    /// Session over already opened sockets
    pub fn new(
        options: SessionOptions,
        robot: R,
        policy: P,
        sink: TelemetrySink,
        link: CommandLink,
    ) -> Self {
        log::info!(
            "Session for robot {} ({} drive, range sensor: {}, camera: {})",
            options.robot_id,
            policy.name(),
            robot.has_range_sensor(),
            robot.has_image_sensor()
        );
        Self {
            navigator: Navigator::with_tolerance(policy, options.arrival_tolerance),
            calibrator: HeadingCalibrator::new(options.calibration_ticks),
            options,
            robot,
            sink,
            link,
            tick: 0,
        }
    }

    /// Open sockets as configured and build the session.
    ///
    /// Fails when `require_range_sensor` is set and the robot has none.
    pub fn from_config(config: &AppConfig, robot: R, policy: P) -> Result<Self> {
        if config.robot.require_range_sensor && !robot.has_range_sensor() {
            return Err(Error::Config(format!(
                "robot {} has no range sensor",
                config.robot.id
            )));
        }

        let net = &config.network;
        let sink = TelemetrySink::new(net.pose_addr(), net.image_addr(), net.max_image_datagram)?;
        let link = CommandLink::bind(net.command_addr(config.robot.id))?;
        Ok(Self::new(
            SessionOptions::from_config(config),
            robot,
            policy,
            sink,
            link,
        ))
    }

    /// Run one control period.
    pub fn tick(&mut self) -> TickReport {
        self.tick += 1;
        let raw = self.robot.pose();

        let mut report = TickReport {
            tick: self.tick,
            pose: raw,
            state: self.navigator.state(),
            calibrating: false,
            telemetry_sent: false,
            image_sent: false,
            commands_received: 0,
            ack_sent: false,
            disconnected: false,
        };

        if !self.calibrator.is_done() {
            let intent = self.calibrator.step(&raw, self.navigator.policy());
            self.robot.apply(intent);
            report.calibrating = true;
            return report;
        }

        let pose = raw.with_heading_offset(self.calibrator.offset());
        report.pose = pose;

        report.telemetry_sent = self.send_pose(&pose);
        if self.tick % self.options.image_every.max(1) == 0 {
            report.image_sent = self.send_image();
        }

        let events = self.link.poll();
        report.commands_received = events.waypoints.len();
        for waypoint in events.waypoints {
            self.navigator.set_waypoint(waypoint);
        }
        if events.disconnected {
            report.disconnected = true;
            self.navigator.connection_lost();
        }

        let step = self.navigator.step(&pose);
        self.robot.apply(step.intent);

        if let Some(target) = step.arrived {
            match self.link.send_ack(target) {
                Ok(()) => {
                    log::info!("Acknowledged ({:.2}, {:.2})", target.x, target.y);
                    report.ack_sent = true;
                }
                Err(e) => {
                    log::warn!("Failed to send acknowledgment: {}", e);
                    report.disconnected = true;
                    self.navigator.connection_lost();
                }
            }
        }

        if let Some(distance) = step.distance
            && self.options.progress_every > 0
            && self.tick % self.options.progress_every == 0
        {
            log::info!(
                "[robot {}] X={:.2} Y={:.2} H={:.0}deg dist={:.2}m",
                self.options.robot_id,
                pose.x,
                pose.y,
                pose.theta.to_degrees(),
                distance
            );
        }

        report.state = self.navigator.state();
        report
    }

    /// Stop the drivetrain and close the command connection.
    pub fn shutdown(&mut self) {
        let stop = self.navigator.policy().stop();
        self.robot.apply(stop);
        self.link.disconnect();
        log::info!("Session for robot {} stopped", self.options.robot_id);
    }

    /// Navigation state
    pub fn state(&self) -> NavState {
        self.navigator.state()
    }

    /// Heading calibration finished
    pub fn is_calibrated(&self) -> bool {
        self.calibrator.is_done()
    }

    /// Correction added to raw headings
    pub fn heading_offset(&self) -> f32 {
        self.calibrator.offset()
    }

    /// Device layer
    pub fn robot(&self) -> &R {
        &self.robot
    }

    /// Mutable device layer
    pub fn robot_mut(&mut self) -> &mut R {
        &mut self.robot
    }

    /// Address planners connect to
    pub fn command_addr(&self) -> Result<std::net::SocketAddr> {
        self.link.local_addr()
    }

    fn send_pose(&mut self, pose: &Pose2D) -> bool {
        let ranges = self.robot.range_scan().unwrap_or_default();
        let dgram = PoseDatagram::new(self.options.robot_id, pose, ranges);
        match self.sink.send_pose(&dgram) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("Pose telemetry not sent: {}", e);
                false
            }
        }
    }

    fn send_image(&mut self) -> bool {
        let Some(frame) = self.robot.image() else {
            return false;
        };
        let dgram = ImageDatagram::new(self.options.robot_id, frame);
        match self.sink.send_image(&dgram) {
            Ok(()) => true,
            Err(Error::Oversize { size, limit }) => {
                log::warn!("Dropping {} byte image (limit {})", size, limit);
                false
            }
            Err(e) => {
                log::debug!("Image telemetry not sent: {}", e);
                false
            }
        }
    }
}
