//! Sequential impulse contact solver with positional correction.
//!
//! The velocity phase applies normal and Coulomb friction impulses over
//! several iterations so stacked and chained contacts converge; the
//! position phase then projects residual penetration out along the
//! contact normals, split by inverse mass.

use std::collections::HashMap;

use glam::DVec2;

use crate::body::{Body, BodyId};
use crate::contact::Manifold;
use crate::math::{EPSILON, EPSILON_SQ};
use crate::narrowphase;

/// Iteration counts and stabilization parameters.
#[derive(Debug, Clone)]
pub struct ContactSolver {
    pub velocity_iterations: u32,
    pub position_iterations: u32,
    /// Penetration depth tolerated before position correction engages.
    pub position_slop: f64,
    /// Fraction of the remaining penetration removed per iteration.
    pub correction_percent: f64,
    /// Normal speeds below this resolve without restitution.
    pub resting_velocity_threshold: f64,
}

impl Default for ContactSolver {
    fn default() -> Self {
        Self {
            velocity_iterations: 6,
            position_iterations: 3,
            position_slop: 0.01,
            correction_percent: 0.8,
            resting_velocity_threshold: 0.5,
        }
    }
}

impl ContactSolver {
    /// Resolve all manifolds: velocity impulses first, then positional
    /// correction of whatever penetration remains.
    pub fn solve(&self, manifolds: &mut [Manifold], bodies: &mut HashMap<BodyId, Body>) {
        for _ in 0..self.velocity_iterations {
            for manifold in manifolds.iter() {
                self.solve_velocity(manifold, bodies);
            }
        }
        for _ in 0..self.position_iterations {
            for manifold in manifolds.iter_mut() {
                self.solve_position(manifold, bodies);
            }
        }
    }

    fn solve_velocity(&self, manifold: &Manifold, bodies: &mut HashMap<BodyId, Body>) {
        for contact in &manifold.contacts {
            let (Some(a), Some(b)) = (bodies.get(&manifold.body_a), bodies.get(&manifold.body_b))
            else {
                return;
            };
            let inv_mass_sum = a.inverse_mass() + b.inverse_mass();
            if inv_mass_sum < EPSILON {
                return;
            }

            let normal = contact.normal;
            let relative_velocity = b.velocity() - a.velocity();
            let contact_velocity = relative_velocity.dot(normal);
            if contact_velocity > 0.0 {
                // Already separating.
                continue;
            }

            let restitution = self.effective_restitution(manifold, a, b, normal, contact_velocity);
            let j = -(1.0 + restitution) * contact_velocity / inv_mass_sum;
            let impulse = normal * j;

            if let Some(a) = bodies.get_mut(&manifold.body_a) {
                a.apply_impulse(-impulse);
            }
            if let Some(b) = bodies.get_mut(&manifold.body_b) {
                b.apply_impulse(impulse);
            }

            self.apply_friction(manifold, normal, j, inv_mass_sum, bodies);
        }
    }

    /// Coulomb friction along the contact tangent, capped by the normal
    /// impulse magnitude.
    fn apply_friction(
        &self,
        manifold: &Manifold,
        normal: DVec2,
        normal_impulse: f64,
        inv_mass_sum: f64,
        bodies: &mut HashMap<BodyId, Body>,
    ) {
        let (Some(a), Some(b)) = (bodies.get(&manifold.body_a), bodies.get(&manifold.body_b))
        else {
            return;
        };

        // Re-read after the normal impulse changed the velocities.
        let relative_velocity = b.velocity() - a.velocity();
        let tangent = relative_velocity - normal * relative_velocity.dot(normal);
        if tangent.length_squared() <= EPSILON_SQ {
            return;
        }
        let tangent = tangent.normalize();

        let jt = -relative_velocity.dot(tangent) / inv_mass_sum;
        let max_friction = normal_impulse.abs() * manifold.friction;
        let jt = jt.clamp(-max_friction, max_friction);
        let impulse = tangent * jt;

        if let Some(a) = bodies.get_mut(&manifold.body_a) {
            a.apply_impulse(-impulse);
        }
        if let Some(b) = bodies.get_mut(&manifold.body_b) {
            b.apply_impulse(impulse);
        }
    }

    fn effective_restitution(
        &self,
        manifold: &Manifold,
        a: &Body,
        b: &Body,
        normal: DVec2,
        contact_velocity: f64,
    ) -> f64 {
        // A body deliberately pushing into a static obstacle never
        // bounces off it.
        let moving_into_wall = match (a.is_static(), b.is_static()) {
            (true, false) => {
                let movement = b.movement();
                movement.length_squared() > EPSILON_SQ && movement.dot(normal) < -EPSILON
            }
            (false, true) => {
                let movement = a.movement();
                movement.length_squared() > EPSILON_SQ && movement.dot(normal) > EPSILON
            }
            _ => false,
        };
        if moving_into_wall {
            return 0.0;
        }
        // No micro-bounce at resting contact speeds.
        if contact_velocity.abs() < self.resting_velocity_threshold {
            return 0.0;
        }
        manifold.restitution
    }

    /// Move the bodies apart along the contact normal, split by inverse
    /// mass. Contacts are refreshed against the already-corrected
    /// positions first, so chained corrections in a stack see each
    /// other's effect instead of fighting over stale depths.
    fn solve_position(&self, manifold: &mut Manifold, bodies: &mut HashMap<BodyId, Body>) {
        let (body_a, body_b) = (manifold.body_a, manifold.body_b);
        let refreshed = {
            let (Some(a), Some(b)) = (bodies.get(&body_a), bodies.get(&body_b)) else {
                return;
            };
            narrowphase::detect(a, b)
        };
        let Some(refreshed) = refreshed else {
            // Earlier corrections already separated the pair.
            return;
        };
        manifold.contacts = refreshed.contacts;

        for contact in &manifold.contacts {
            let (Some(a), Some(b)) = (bodies.get(&body_a), bodies.get(&body_b)) else {
                return;
            };
            let inv_mass_a = a.inverse_mass();
            let inv_mass_b = b.inverse_mass();
            let inv_mass_sum = inv_mass_a + inv_mass_b;
            if inv_mass_sum < EPSILON {
                continue;
            }

            let correction =
                (contact.penetration - self.position_slop).max(0.0) * self.correction_percent;
            if correction <= 0.0 {
                continue;
            }
            let offset = contact.normal * correction;

            if inv_mass_a > 0.0 {
                if let Some(a) = bodies.get_mut(&body_a) {
                    a.translate(-offset * (inv_mass_a / inv_mass_sum));
                }
            }
            if inv_mass_b > 0.0 {
                if let Some(b) = bodies.get_mut(&body_b) {
                    b.translate(offset * (inv_mass_b / inv_mass_sum));
                }
            }
        }
    }
}
