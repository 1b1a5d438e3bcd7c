//! Line angle computation
//!
//! Computes the signed rotation between two line segments. Each segment's
//! direction comes from a four-quadrant arctangent; the difference is wrapped
//! into `(-π, π]` and rescaled by a multiplier so that downstream thresholds
//! can be expressed in convenient units.

use std::f64::consts::PI;

use crate::types::LineSegment;

/// Multiplier applied to orientation angles before thresholding
pub const DEFAULT_ANGLE_MULTIPLIER: f64 = 100.0;

/// Signed angle between `line_a` and `line_b`, in radians scaled by `multiplier`.
///
/// The unscaled value always lies in `(-π, π]`, i.e. it is the smallest signed
/// rotation taking the direction of `line_b` onto the direction of `line_a`.
/// Zero-length segments have direction 0 and never cause a panic.
pub fn angle_between(line_a: &LineSegment, line_b: &LineSegment, multiplier: f64) -> f64 {
    normalize_angle(line_a.direction() - line_b.direction()) * multiplier
}

/// Wrap a raw angle difference into `(-π, π]`.
///
/// Inputs are differences of two `atan2` results, so a single correction
/// step is always enough.
pub fn normalize_angle(angle: f64) -> f64 {
    if angle > PI {
        angle - 2.0 * PI
    } else if angle <= -PI {
        angle + 2.0 * PI
    } else {
        angle
    }
}
