//! Scalar tolerances and epsilon-guarded vector helpers.
//!
//! `glam` supplies the vector algebra (dot, perp, lerp, rotation,
//! reflection); this module adds the guards the detectors and solver
//! rely on so degenerate inputs collapse to zero instead of NaN.

use glam::DVec2;

/// Tolerance for near-zero scalar comparisons.
pub const EPSILON: f64 = 1e-10;

/// Tolerance for near-zero squared-length comparisons.
pub const EPSILON_SQ: f64 = EPSILON * EPSILON;

/// Normalize `v`, or return zero when its length is below tolerance.
#[inline]
pub fn normalize_or_zero(v: DVec2) -> DVec2 {
    let len_sq = v.length_squared();
    if len_sq < EPSILON_SQ {
        DVec2::ZERO
    } else {
        v / len_sq.sqrt()
    }
}

/// Divide `v` by `s`, or return zero when `s` is below tolerance.
#[inline]
pub fn div_or_zero(v: DVec2, s: f64) -> DVec2 {
    if s.abs() < EPSILON {
        DVec2::ZERO
    } else {
        v / s
    }
}

/// Project `v` onto `onto`, or return zero when `onto` is degenerate.
#[inline]
pub fn project(v: DVec2, onto: DVec2) -> DVec2 {
    let len_sq = onto.length_squared();
    if len_sq < EPSILON_SQ {
        DVec2::ZERO
    } else {
        onto * (v.dot(onto) / len_sq)
    }
}
