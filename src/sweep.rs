//! Continuous collision detection.
//!
//! Discrete detection samples positions once per step, so a body that
//! crosses a thin obstacle between samples never reports a contact.
//! The swept tests here find the first time of impact within the step
//! instead, and the world advances both bodies to that instant.

use glam::DVec2;

use crate::aabb::Aabb;
use crate::body::Body;
use crate::math::{self, EPSILON, EPSILON_SQ};
use crate::shape::Shape;

/// First time of impact for a candidate pair.
#[derive(Debug, Clone, Copy)]
pub struct SweptHit {
    /// Fraction of the step in `(0, 1]` at which the pair first touches.
    pub toi: f64,
    /// Surface normal at impact, pointing from `b` toward `a`.
    pub normal: DVec2,
}

/// Whether `body` moves far enough in one step to require a swept test:
/// more than half of its bounding box's shorter side.
pub fn needs_swept_test(body: &Body, dt: f64) -> bool {
    let travel = body.velocity().length() * dt;
    travel > 0.5 * body.aabb().min_dimension()
}

/// First time of impact between `a` and `b` within `dt`, if any.
///
/// A hit promises that advancing both bodies by `toi * dt` along their
/// current velocities leaves them at (near-)exact surface contact.
/// Pairs already overlapping at the start of the step report no hit;
/// the discrete narrow phase owns those.
pub fn time_of_impact(a: &Body, b: &Body, dt: f64) -> Option<SweptHit> {
    match (a.shape(), b.shape()) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => swept_circle_circle(
            a.position(),
            ra,
            a.velocity(),
            b.position(),
            rb,
            b.velocity(),
            dt,
        ),
        (Shape::Circle { radius }, Shape::Rect { half_extents }) => swept_vs_expanded_rect(
            a.position(),
            DVec2::splat(radius),
            a.velocity(),
            b.position(),
            half_extents,
            b.velocity(),
            dt,
        ),
        (Shape::Rect { half_extents }, Shape::Circle { radius }) => swept_vs_expanded_rect(
            b.position(),
            DVec2::splat(radius),
            b.velocity(),
            a.position(),
            half_extents,
            a.velocity(),
            dt,
        )
        .map(|hit| SweptHit {
            normal: -hit.normal,
            ..hit
        }),
        (Shape::Rect { half_extents: ha }, Shape::Rect { half_extents: hb }) => {
            swept_vs_expanded_rect(
                a.position(),
                ha,
                a.velocity(),
                b.position(),
                hb,
                b.velocity(),
                dt,
            )
        }
    }
}

/// Relative-motion quadratic: the centers close to `ra + rb` apart at
/// the smaller root of `|p + v*t|^2 = r_sum^2`.
fn swept_circle_circle(
    pa: DVec2,
    ra: f64,
    va: DVec2,
    pb: DVec2,
    rb: f64,
    vb: DVec2,
    dt: f64,
) -> Option<SweptHit> {
    let rel_pos = pa - pb;
    let rel_move = (va - vb) * dt;
    let r_sum = ra + rb;

    let a_coef = rel_move.length_squared();
    if a_coef < EPSILON_SQ {
        return None;
    }
    let c_coef = rel_pos.length_squared() - r_sum * r_sum;
    if c_coef < 0.0 {
        // Already overlapping.
        return None;
    }
    let b_coef = 2.0 * rel_pos.dot(rel_move);
    let discriminant = b_coef * b_coef - 4.0 * a_coef * c_coef;
    if discriminant < 0.0 {
        return None;
    }

    let toi = (-b_coef - discriminant.sqrt()) / (2.0 * a_coef);
    if toi <= 0.0 || toi > 1.0 {
        return None;
    }

    let at_impact = rel_pos + rel_move * toi;
    Some(SweptHit {
        toi,
        normal: math::normalize_or_zero(at_impact),
    })
}

/// Minkowski reduction: grow the rectangle by the mover's extents and
/// trace the mover's center through it as a ray.
fn swept_vs_expanded_rect(
    moving_center: DVec2,
    moving_half: DVec2,
    moving_vel: DVec2,
    rect_center: DVec2,
    rect_half: DVec2,
    rect_vel: DVec2,
    dt: f64,
) -> Option<SweptHit> {
    let expanded = Aabb::new(
        rect_center - rect_half - moving_half,
        rect_center + rect_half + moving_half,
    );
    let delta = (moving_vel - rect_vel) * dt;
    raycast_aabb(moving_center, delta, &expanded).map(|(toi, normal)| SweptHit { toi, normal })
}

/// Slab-method raycast against `aabb` for the ray `origin + delta * t`,
/// `t` in `(0, 1]`. Returns the entry time and the outward normal of
/// the face crossed. Rays starting inside the box do not hit.
pub fn raycast_aabb(origin: DVec2, delta: DVec2, aabb: &Aabb) -> Option<(f64, DVec2)> {
    let mut t_min = f64::NEG_INFINITY;
    let mut t_max = f64::INFINITY;
    let mut normal = DVec2::ZERO;

    for axis in 0..2 {
        let (o, d, min, max) = if axis == 0 {
            (origin.x, delta.x, aabb.min.x, aabb.max.x)
        } else {
            (origin.y, delta.y, aabb.min.y, aabb.max.y)
        };

        if d.abs() < EPSILON {
            // Parallel to the slab: misses unless already inside it.
            if o < min || o > max {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let mut t_enter = (min - o) * inv;
        let mut t_exit = (max - o) * inv;
        let mut axis_normal = if axis == 0 { DVec2::NEG_X } else { DVec2::NEG_Y };
        if t_enter > t_exit {
            std::mem::swap(&mut t_enter, &mut t_exit);
            axis_normal = -axis_normal;
        }

        if t_enter > t_min {
            t_min = t_enter;
            normal = axis_normal;
        }
        t_max = t_max.min(t_exit);
    }

    if t_min > t_max || t_max < 0.0 || t_min > 1.0 {
        return None;
    }
    if t_min <= 0.0 {
        // Started inside; existing overlap belongs to the discrete pass.
        return None;
    }
    Some((t_min, normal))
}
