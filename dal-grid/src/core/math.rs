//! Angle utilities.
//!
//! All angles are in radians, counter-clockwise positive.

use std::f32::consts::{PI, TAU};

/// Normalize an angle to (-π, π].
///
/// Works for any finite input, including values many turns away from zero.
///
/// # Example
/// ```
/// use dal_grid::normalize_angle;
/// use std::f32::consts::PI;
///
/// // Odd multiples of π land on the boundary, either side of it after rounding
/// assert!((normalize_angle(3.0 * PI).abs() - PI).abs() < 1e-5);
/// assert!((normalize_angle(PI / 2.0) - PI / 2.0).abs() < 1e-6);
/// ```
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let mut a = angle % TAU;
    if a > PI {
        a -= TAU;
    }
    // Also catches a rounded `a - TAU` landing exactly on -π
    if a <= -PI {
        a += TAU;
    }
    a
}

/// Signed shortest rotation from `from` to `to`, in (-π, π].
///
/// Positive result means counter-clockwise rotation from `from` to `to`.
///
/// # Example
/// ```
/// use dal_grid::angle_diff;
/// use std::f32::consts::PI;
///
/// let diff = angle_diff(-0.9 * PI, 0.9 * PI);
/// assert!((diff - (-0.2 * PI)).abs() < 1e-5);
/// ```
#[inline]
pub fn angle_diff(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}
