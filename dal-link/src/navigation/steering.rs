//! Drivetrain steering policies.

use crate::config::NavigationConfig;

/// Drivetrain command produced once per tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SteeringIntent {
    /// Body-frame velocity: forward, left, counter-clockwise rate
    Holonomic {
        /// Forward velocity
        vx: f32,
        /// Leftward velocity
        vy: f32,
        /// Counter-clockwise turn rate
        omega: f32,
    },
    /// Wheel speeds; `left > right` turns clockwise
    Differential {
        /// Left wheel speed
        left: f32,
        /// Right wheel speed
        right: f32,
    },
}

impl SteeringIntent {
    /// Whether the command leaves the vehicle at rest
    pub fn is_stop(&self) -> bool {
        match *self {
            SteeringIntent::Holonomic { vx, vy, omega } => vx == 0.0 && vy == 0.0 && omega == 0.0,
            SteeringIntent::Differential { left, right } => left == 0.0 && right == 0.0,
        }
    }
}

/// Converts pursuit geometry into a drivetrain command.
pub trait SteeringPolicy {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Command toward a target `heading_error` radians off the nose
    /// (positive = target to the left) and `distance` meters away.
    fn steer(&self, heading_error: f32, distance: f32) -> SteeringIntent;

    /// Straight ahead at cruise speed
    fn forward(&self) -> SteeringIntent;

    /// Zero command
    fn stop(&self) -> SteeringIntent;
}

/// Mecanum / omni base: translate straight at the target, never rotate.
#[derive(Clone, Debug, PartialEq)]
pub struct Holonomic {
    /// Cruise speed (actuator units)
    pub speed: f32,
}

impl Holonomic {
    /// Policy driving at `speed`
    pub fn new(speed: f32) -> Self {
        Self { speed }
    }

    /// Policy from the navigation section
    pub fn from_config(config: &NavigationConfig) -> Self {
        Self::new(config.speed)
    }
}

impl SteeringPolicy for Holonomic {
    fn name(&self) -> &'static str {
        "holonomic"
    }

    fn steer(&self, heading_error: f32, _distance: f32) -> SteeringIntent {
        // World direction to target rotated into the body frame
        SteeringIntent::Holonomic {
            vx: self.speed * heading_error.cos(),
            vy: self.speed * heading_error.sin(),
            omega: 0.0,
        }
    }

    fn forward(&self) -> SteeringIntent {
        SteeringIntent::Holonomic {
            vx: self.speed,
            vy: 0.0,
            omega: 0.0,
        }
    }

    fn stop(&self) -> SteeringIntent {
        SteeringIntent::Holonomic {
            vx: 0.0,
            vy: 0.0,
            omega: 0.0,
        }
    }
}

/// Two-wheel base: turn in place when far off heading, otherwise arc.
#[derive(Clone, Debug, PartialEq)]
pub struct Differential {
    /// Cruise speed (actuator units)
    pub speed: f32,
    /// Turn command per radian of heading error
    pub turn_gain: f32,
    /// Heading error above which the base turns in place (radians)
    pub turn_threshold: f32,
    /// Share of the turn command mixed into forward arcs
    pub arc_gain: f32,
}

impl Differential {
    /// Policy from the navigation section
    pub fn from_config(config: &NavigationConfig) -> Self {
        Self {
            speed: config.speed,
            turn_gain: config.turn_gain,
            turn_threshold: config.turn_threshold,
            arc_gain: config.arc_gain,
        }
    }
}

impl Default for Differential {
    fn default() -> Self {
        Self::from_config(&NavigationConfig::default())
    }
}

impl SteeringPolicy for Differential {
    fn name(&self) -> &'static str {
        "differential"
    }

    fn steer(&self, heading_error: f32, _distance: f32) -> SteeringIntent {
        // Positive turn is clockwise
        let turn = (-self.turn_gain * heading_error).clamp(-self.speed, self.speed);

        if heading_error.abs() > self.turn_threshold {
            SteeringIntent::Differential {
                left: turn,
                right: -turn,
            }
        } else {
            SteeringIntent::Differential {
                left: self.speed + self.arc_gain * turn,
                right: self.speed - self.arc_gain * turn,
            }
        }
    }

    fn forward(&self) -> SteeringIntent {
        SteeringIntent::Differential {
            left: self.speed,
            right: self.speed,
        }
    }

    fn stop(&self) -> SteeringIntent {
        SteeringIntent::Differential {
            left: 0.0,
            right: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_holonomic_straight_ahead() {
        let policy = Holonomic::new(5.0);
        assert_eq!(policy.steer(0.0, 1.0), policy.forward());
    }

    #[test]
    fn test_holonomic_target_to_the_left() {
        let SteeringIntent::Holonomic { vx, vy, omega } = Holonomic::new(5.0).steer(FRAC_PI_2, 1.0)
        else {
            panic!("wrong intent kind");
        };
        assert_relative_eq!(vx, 0.0, epsilon = 1e-5);
        assert_relative_eq!(vy, 5.0, epsilon = 1e-5);
        assert_eq!(omega, 0.0);
    }

    #[test]
    fn test_differential_turns_in_place() {
        let policy = Differential::default();
        // Target well to the left: counter-clockwise, so right wheel leads
        let SteeringIntent::Differential { left, right } = policy.steer(1.0, 2.0) else {
            panic!("wrong intent kind");
        };
        assert_relative_eq!(left, -5.0);
        assert_relative_eq!(right, 5.0);
    }

    #[test]
    fn test_differential_arcs_when_aligned() {
        let policy = Differential::default();
        // turn = clamp(-8 * 0.1) = -0.8
        let SteeringIntent::Differential { left, right } = policy.steer(0.1, 2.0) else {
            panic!("wrong intent kind");
        };
        assert_relative_eq!(left, 5.0 - 0.24, epsilon = 1e-5);
        assert_relative_eq!(right, 5.0 + 0.24, epsilon = 1e-5);
        assert!(right > left);
    }

    #[test]
    fn test_differential_threshold_boundary() {
        let policy = Differential::default();
        // Exactly at the threshold still arcs
        let SteeringIntent::Differential { left, right } = policy.steer(-0.4, 1.0) else {
            panic!("wrong intent kind");
        };
        assert!(left > 0.0 && right > 0.0);
        assert!(left > right);
    }

    #[test]
    fn test_stop_is_stop() {
        assert!(Holonomic::new(5.0).stop().is_stop());
        assert!(Differential::default().stop().is_stop());
        assert!(!Differential::default().forward().is_stop());
    }
}
