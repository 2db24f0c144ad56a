//! Contact and manifold records produced by the narrow phase.

use glam::DVec2;

use crate::body::{Body, BodyId};

/// A single point of collision.
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    /// World-space contact point.
    pub point: DVec2,
    /// Unit normal pointing from body A toward body B.
    pub normal: DVec2,
    /// Non-negative overlap depth along the normal.
    pub penetration: f64,
}

/// The contacts between one pair of bodies, with the combined surface
/// material the solver applies to them.
#[derive(Debug, Clone)]
pub struct Manifold {
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub contacts: Vec<Contact>,
    /// Combined restitution: the dynamic side's value against a static
    /// body, the mean otherwise.
    pub restitution: f64,
    /// Combined friction: geometric mean of both surfaces.
    pub friction: f64,
}

impl Manifold {
    /// Build a manifold for `a` and `b`, combining their materials.
    pub fn new(a: &Body, b: &Body, contacts: Vec<Contact>) -> Self {
        let restitution = match (a.is_static(), b.is_static()) {
            (true, false) => b.material.restitution,
            (false, true) => a.material.restitution,
            _ => (a.material.restitution + b.material.restitution) * 0.5,
        };
        let friction = (a.material.friction * b.material.friction).sqrt();
        Self {
            body_a: a.id(),
            body_b: b.id(),
            contacts,
            restitution,
            friction,
        }
    }
}
