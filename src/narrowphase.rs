//! Narrow-phase collision detection: per-pair contact manifolds.

use glam::DVec2;

use crate::body::Body;
use crate::contact::{Contact, Manifold};
use crate::math::EPSILON;
use crate::shape::Shape;

/// Detect a collision between two bodies at their current positions.
///
/// Manifold normals always point from `a` toward `b`. The circle-rect
/// detector computes rect-to-circle internally and is flipped here when
/// the circle plays the A role.
pub fn detect(a: &Body, b: &Body) -> Option<Manifold> {
    let contact = match (a.shape(), b.shape()) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            circle_circle(a.position(), ra, b.position(), rb)
        }
        (Shape::Circle { radius }, Shape::Rect { half_extents }) => {
            circle_rect(a.position(), radius, b.position(), half_extents).map(flip)
        }
        (Shape::Rect { half_extents }, Shape::Circle { radius }) => {
            circle_rect(b.position(), radius, a.position(), half_extents)
        }
        (Shape::Rect { half_extents: ha }, Shape::Rect { half_extents: hb }) => {
            rect_rect(a.position(), ha, b.position(), hb)
        }
    }?;
    Some(Manifold::new(a, b, vec![contact]))
}

fn flip(contact: Contact) -> Contact {
    Contact {
        normal: -contact.normal,
        ..contact
    }
}

/// Circle-circle contact; normal points from the first circle to the
/// second.
fn circle_circle(pa: DVec2, ra: f64, pb: DVec2, rb: f64) -> Option<Contact> {
    let delta = pb - pa;
    let dist_sq = delta.length_squared();
    let r_sum = ra + rb;
    if dist_sq >= r_sum * r_sum {
        return None;
    }

    let dist = dist_sq.sqrt();
    if dist < EPSILON {
        // Coincident centers leave no separation direction; pick one.
        return Some(Contact {
            point: pa,
            normal: DVec2::X,
            penetration: r_sum,
        });
    }

    let normal = delta / dist;
    Some(Contact {
        point: pa + normal * ra,
        normal,
        penetration: r_sum - dist,
    })
}

/// Circle-rectangle contact; normal points from the rectangle to the
/// circle.
fn circle_rect(
    circle_center: DVec2,
    radius: f64,
    rect_center: DVec2,
    half_extents: DVec2,
) -> Option<Contact> {
    let min = rect_center - half_extents;
    let max = rect_center + half_extents;
    let closest = circle_center.clamp(min, max);
    let offset = circle_center - closest;
    let dist_sq = offset.length_squared();
    if dist_sq > radius * radius + EPSILON {
        return None;
    }

    let dist = dist_sq.sqrt();
    if dist < EPSILON {
        // Center inside the rectangle: push out through the nearest edge.
        let mut depth = max.x - circle_center.x;
        let mut normal = DVec2::X;
        if circle_center.x - min.x < depth {
            depth = circle_center.x - min.x;
            normal = DVec2::NEG_X;
        }
        if max.y - circle_center.y < depth {
            depth = max.y - circle_center.y;
            normal = DVec2::Y;
        }
        if circle_center.y - min.y < depth {
            depth = circle_center.y - min.y;
            normal = DVec2::NEG_Y;
        }
        return Some(Contact {
            point: circle_center,
            normal,
            penetration: radius + depth,
        });
    }

    let normal = offset / dist;
    Some(Contact {
        point: circle_center - normal * radius,
        normal,
        penetration: radius - dist,
    })
}

/// Rectangle-rectangle contact via the separating axis test on the two
/// world axes; normal points from the first rectangle to the second.
fn rect_rect(center_a: DVec2, half_a: DVec2, center_b: DVec2, half_b: DVec2) -> Option<Contact> {
    let delta = center_b - center_a;
    let overlap = half_a + half_b - delta.abs();
    if overlap.x <= EPSILON || overlap.y <= EPSILON {
        return None;
    }

    // Separate along the axis of least penetration, toward B.
    let (penetration, normal) = if overlap.x < overlap.y {
        let axis = if delta.x >= 0.0 { DVec2::X } else { DVec2::NEG_X };
        (overlap.x, axis)
    } else {
        let axis = if delta.y >= 0.0 { DVec2::Y } else { DVec2::NEG_Y };
        (overlap.y, axis)
    };

    // Contact point at the center of the overlap region.
    let min = (center_a - half_a).max(center_b - half_b);
    let max = (center_a + half_a).min(center_b + half_b);
    Some(Contact {
        point: (min + max) * 0.5,
        normal,
        penetration,
    })
}
