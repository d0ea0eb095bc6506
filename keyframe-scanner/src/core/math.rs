//! Angle helpers for the pose types.

use std::f32::consts::{PI, TAU};

/// Wrap `angle` into [-π, π].
///
/// ```
/// use keyframe_scanner::core::math::normalize_angle;
/// use std::f32::consts::PI;
///
/// assert!((normalize_angle(2.5 * PI) - 0.5 * PI).abs() < 1e-5);
/// ```
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    if (-PI..=PI).contains(&angle) {
        return angle;
    }
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped == -PI && angle > 0.0 { PI } else { wrapped }
}

/// Yaw of a rotation matrix, read from its first column.
#[inline]
pub fn yaw_from_rotation(r00: f32, r10: f32) -> f32 {
    r10.atan2(r00)
}
