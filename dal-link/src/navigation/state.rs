//! Navigation state machine.

use super::steering::{SteeringIntent, SteeringPolicy};
use dal_grid::{Pose2D, WorldPoint, angle_diff};
use std::fmt;

/// Default arrival radius (meters)
pub const ARRIVAL_TOLERANCE: f32 = 0.30;

/// Per-robot navigation state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NavState {
    /// No target; the drivetrain is stopped
    Idle,
    /// Driving toward the target
    Navigating(WorldPoint),
}

impl fmt::Display for NavState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavState::Idle => write!(f, "Idle"),
            NavState::Navigating(_) => write!(f, "Navigating"),
        }
    }
}

/// Outcome of one [`Navigator::step`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NavStep {
    /// Command for the drivetrain this tick
    pub intent: SteeringIntent,
    /// Target reached this tick (the commanded point, not the pose)
    pub arrived: Option<WorldPoint>,
    /// Distance to the target before this step, if navigating
    pub distance: Option<f32>,
    /// Heading error toward the target, if steering
    pub heading_error: Option<f32>,
}

/// Straight-line pursuit of a single waypoint.
///
/// A new waypoint replaces the current one immediately; there is no queue.
#[derive(Debug)]
pub struct Navigator<P> {
    policy: P,
    state: NavState,
    tolerance: f32,
}

impl<P: SteeringPolicy> Navigator<P> {
    /// Idle navigator with the default arrival radius
    pub fn new(policy: P) -> Self {
        Self::with_tolerance(policy, ARRIVAL_TOLERANCE)
    }

    /// Idle navigator arriving within `tolerance` meters
    pub fn with_tolerance(policy: P, tolerance: f32) -> Self {
        Self {
            policy,
            state: NavState::Idle,
            tolerance,
        }
    }

    /// Current state
    pub fn state(&self) -> NavState {
        self.state
    }

    /// Steering policy in use
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Current target, if navigating
    pub fn target(&self) -> Option<WorldPoint> {
        match self.state {
            NavState::Navigating(target) => Some(target),
            NavState::Idle => None,
        }
    }

    /// Whether a target is active
    pub fn is_navigating(&self) -> bool {
        matches!(self.state, NavState::Navigating(_))
    }

    /// Start (or redirect) navigation toward `target`
    pub fn set_waypoint(&mut self, target: WorldPoint) {
        log::info!("Waypoint received: ({:.2}, {:.2})", target.x, target.y);
        if let NavState::Navigating(previous) = self.state {
            log::info!(
                "Preempting waypoint ({:.2}, {:.2})",
                previous.x,
                previous.y
            );
        }
        self.transition(NavState::Navigating(target));
    }

    /// Drop the current target without acknowledging it
    pub fn connection_lost(&mut self) {
        if let NavState::Navigating(target) = self.state {
            log::info!(
                "Connection lost, abandoning waypoint ({:.2}, {:.2})",
                target.x,
                target.y
            );
            self.transition(NavState::Idle);
        }
    }

    /// Advance one tick from `pose` (heading already corrected).
    pub fn step(&mut self, pose: &Pose2D) -> NavStep {
        let NavState::Navigating(target) = self.state else {
            return NavStep {
                intent: self.policy.stop(),
                arrived: None,
                distance: None,
                heading_error: None,
            };
        };

        let distance = pose.distance_to(target);
        if distance < self.tolerance {
            log::info!(
                "Reached ({:.2}, {:.2}) at distance {:.3}m",
                target.x,
                target.y,
                distance
            );
            self.transition(NavState::Idle);
            return NavStep {
                intent: self.policy.stop(),
                arrived: Some(target),
                distance: Some(distance),
                heading_error: None,
            };
        }

        let desired = (target.y - pose.y).atan2(target.x - pose.x);
        let heading_error = angle_diff(pose.theta, desired);

        NavStep {
            intent: self.policy.steer(heading_error, distance),
            arrived: None,
            distance: Some(distance),
            heading_error: Some(heading_error),
        }
    }

    fn transition(&mut self, next: NavState) {
        log::info!("{} -> {}", self.state, next);
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::{Differential, Holonomic};
    use approx::assert_relative_eq;

    fn navigator() -> Navigator<Holonomic> {
        Navigator::new(Holonomic::new(5.0))
    }

    #[test]
    fn test_idle_stops() {
        let mut nav = navigator();
        let step = nav.step(&Pose2D::default());
        assert!(step.intent.is_stop());
        assert_eq!(step.arrived, None);
        assert_eq!(nav.state(), NavState::Idle);
    }

    #[test]
    fn test_waypoint_starts_navigation() {
        let mut nav = navigator();
        nav.set_waypoint(WorldPoint::new(2.0, 2.0));
        assert_eq!(nav.state(), NavState::Navigating(WorldPoint::new(2.0, 2.0)));

        let step = nav.step(&Pose2D::default());
        assert!(!step.intent.is_stop());
        assert_relative_eq!(step.distance.unwrap(), 8.0f32.sqrt(), epsilon = 1e-5);
        assert_relative_eq!(
            step.heading_error.unwrap(),
            std::f32::consts::FRAC_PI_4,
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_arrival_echoes_target() {
        let mut nav = navigator();
        nav.set_waypoint(WorldPoint::new(2.0, 2.0));
        let step = nav.step(&Pose2D::new(2.05, 1.98, 0.3));
        assert_eq!(step.arrived, Some(WorldPoint::new(2.0, 2.0)));
        assert!(step.intent.is_stop());
        assert_eq!(nav.state(), NavState::Idle);
        // No second acknowledgment
        assert_eq!(nav.step(&Pose2D::new(2.05, 1.98, 0.3)).arrived, None);
    }

    #[test]
    fn test_tolerance_is_strict() {
        let mut nav = navigator();
        nav.set_waypoint(WorldPoint::new(0.5, 0.0));
        assert_eq!(nav.step(&Pose2D::new(0.0, 0.0, 0.0)).arrived, None);
        assert!(nav.step(&Pose2D::new(0.21, 0.0, 0.0)).arrived.is_some());
    }

    #[test]
    fn test_preemption() {
        let mut nav = navigator();
        nav.set_waypoint(WorldPoint::new(5.0, 0.0));
        nav.set_waypoint(WorldPoint::new(-1.0, 0.0));
        assert_eq!(nav.target(), Some(WorldPoint::new(-1.0, 0.0)));
        // Reaching the old target no longer counts
        assert_eq!(nav.step(&Pose2D::new(5.0, 0.0, 0.0)).arrived, None);
    }

    #[test]
    fn test_connection_lost_discards_target() {
        let mut nav = navigator();
        nav.set_waypoint(WorldPoint::new(1.0, 1.0));
        nav.connection_lost();
        assert_eq!(nav.state(), NavState::Idle);
        assert_eq!(nav.step(&Pose2D::new(1.0, 1.0, 0.0)).arrived, None);
        // Idempotent when already idle
        nav.connection_lost();
        assert_eq!(nav.state(), NavState::Idle);
    }

    #[test]
    fn test_approach_terminates_once() {
        let mut nav = Navigator::new(Differential::default());
        let target = WorldPoint::new(3.0, 0.0);
        nav.set_waypoint(target);

        let mut acks = Vec::new();
        let mut first_arrival_x = None;
        for x in [0.0, 1.0, 2.0, 2.5, 2.65, 2.69, 2.75, 2.8, 2.9, 3.0] {
            if let Some(t) = nav.step(&Pose2D::new(x, 0.0, 0.0)).arrived {
                acks.push(t);
                first_arrival_x.get_or_insert(x);
            }
        }
        assert_eq!(acks, vec![target]);
        // 2.75 is the first pose closer than 0.30
        assert_eq!(first_arrival_x, Some(2.75));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(NavState::Idle.to_string(), "Idle");
        assert_eq!(
            NavState::Navigating(WorldPoint::default()).to_string(),
            "Navigating"
        );
    }
}
