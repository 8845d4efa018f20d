//! One-shot heading calibration.
//!
//! The reported heading of some vehicles is rotated relative to the axis
//! they actually drive along. Before navigating, the vehicle drives straight
//! for a few ticks and the direction of its displacement is compared with
//! the heading it reported at the start. The difference is added to every
//! later heading reading.
//!
//! The measurement assumes the vehicle moved freely. Against a wall the
//! displacement is a collision response and the offset is meaningless; a
//! displacement under 1 cm is reported as a warning and used anyway.

use super::steering::{SteeringIntent, SteeringPolicy};
use dal_grid::{Pose2D, angle_diff};

/// Displacement below which the offset is unreliable (meters)
const MIN_DISPLACEMENT: f32 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Start,
    Driving { remaining: u32 },
    Settling,
    Done,
}

/// Drive-forward heading calibration.
#[derive(Clone, Debug)]
pub struct HeadingCalibrator {
    ticks: u32,
    phase: Phase,
    start: Pose2D,
    offset: f32,
}

impl HeadingCalibrator {
    /// Calibrate over `ticks` forward ticks; zero disables calibration.
    pub fn new(ticks: u32) -> Self {
        let phase = if ticks == 0 { Phase::Done } else { Phase::Start };
        Self {
            ticks,
            phase,
            start: Pose2D::default(),
            offset: 0.0,
        }
    }

    /// Offset measured (or calibration disabled)
    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Correction to add to raw headings (0 until done)
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Feed the raw pose of this tick, get the command to apply.
    pub fn step<P: SteeringPolicy>(&mut self, pose: &Pose2D, policy: &P) -> SteeringIntent {
        match self.phase {
            Phase::Done => policy.stop(),
            Phase::Start => {
                log::info!("Calibrating heading over {} ticks", self.ticks);
                self.start = *pose;
                self.phase = Phase::Driving {
                    remaining: self.ticks - 1,
                };
                policy.forward()
            }
            Phase::Driving { remaining: 0 } => {
                self.phase = Phase::Settling;
                policy.stop()
            }
            Phase::Driving { remaining } => {
                self.phase = Phase::Driving {
                    remaining: remaining - 1,
                };
                policy.forward()
            }
            Phase::Settling => {
                self.finish(pose);
                policy.stop()
            }
        }
    }

    fn finish(&mut self, pose: &Pose2D) {
        let dx = pose.x - self.start.x;
        let dy = pose.y - self.start.y;
        let displacement = dx.hypot(dy);
        if displacement < MIN_DISPLACEMENT {
            log::warn!(
                "Calibration moved only {:.4}m, heading offset is unreliable",
                displacement
            );
        }

        self.offset = angle_diff(self.start.theta, dy.atan2(dx));
        self.phase = Phase::Done;
        log::info!("Heading offset: {:.1} deg", self.offset.to_degrees());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::{Differential, Holonomic};
    use approx::assert_relative_eq;

    #[test]
    fn test_disabled_with_zero_ticks() {
        let mut cal = HeadingCalibrator::new(0);
        assert!(cal.is_done());
        assert_eq!(cal.offset(), 0.0);
        assert!(cal.step(&Pose2D::default(), &Holonomic::new(5.0)).is_stop());
    }

    #[test]
    fn test_intent_sequence() {
        let policy = Differential::default();
        let mut cal = HeadingCalibrator::new(3);
        let pose = Pose2D::default();

        assert_eq!(cal.step(&pose, &policy), policy.forward());
        assert_eq!(cal.step(&pose, &policy), policy.forward());
        assert_eq!(cal.step(&pose, &policy), policy.forward());
        assert_eq!(cal.step(&pose, &policy), policy.stop());
        assert!(!cal.is_done());
        assert_eq!(cal.step(&pose, &policy), policy.stop());
        assert!(cal.is_done());
    }

    #[test]
    fn test_offset_from_displacement() {
        let policy = Holonomic::new(5.0);
        let mut cal = HeadingCalibrator::new(1);

        // Reports heading 0.2 but actually drives along +X
        cal.step(&Pose2D::new(1.0, 1.0, 0.2), &policy);
        cal.step(&Pose2D::new(1.5, 1.0, 0.2), &policy);
        cal.step(&Pose2D::new(1.5, 1.0, 0.2), &policy);

        assert!(cal.is_done());
        assert_relative_eq!(cal.offset(), -0.2, epsilon = 1e-6);
        let corrected = Pose2D::new(1.5, 1.0, 0.2).with_heading_offset(cal.offset());
        assert_relative_eq!(corrected.theta, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_offset_wraps() {
        let policy = Holonomic::new(5.0);
        let mut cal = HeadingCalibrator::new(1);

        // Reports ~+π while driving along ~-π
        cal.step(&Pose2D::new(0.0, 0.0, 3.1), &policy);
        cal.step(&Pose2D::new(-1.0, -0.05, 3.1), &policy);
        cal.step(&Pose2D::new(-1.0, -0.05, 3.1), &policy);

        let expected = angle_diff(3.1, (-0.05f32).atan2(-1.0));
        assert_relative_eq!(cal.offset(), expected, epsilon = 1e-6);
        assert!(cal.offset().abs() < 0.2);
    }

    #[test]
    fn test_blocked_vehicle_still_completes() {
        let policy = Holonomic::new(5.0);
        let mut cal = HeadingCalibrator::new(2);
        let pose = Pose2D::new(0.0, 0.0, 0.7);
        for _ in 0..4 {
            cal.step(&pose, &policy);
        }
        assert!(cal.is_done());
        // atan2(0, 0) = 0, so the offset cancels the reported heading
        assert_relative_eq!(cal.offset(), -0.7, epsilon = 1e-6);
    }
}
