//! Rigid bodies: a shape bound to mass, kinematic state, and filters.

use std::sync::atomic::{AtomicU64, Ordering};

use glam::DVec2;

use crate::aabb::Aabb;
use crate::error::PhysicsError;
use crate::events::{CollisionEvent, CollisionEventKind, CollisionEvents, HandlerId};
use crate::material::Material;
use crate::math::{self, EPSILON_SQ};
use crate::shape::Shape;

static NEXT_BODY_ID: AtomicU64 = AtomicU64::new(0);

/// Unique body identifier, assigned from a process-wide monotonic
/// counter and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(u64);

impl BodyId {
    pub(crate) fn next() -> BodyId {
        BodyId(NEXT_BODY_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Order-independent key for a body pair: Cantor pairing of the sorted
/// ids, widened to u128 so long-lived processes cannot overflow it.
pub(crate) fn pair_key(a: BodyId, b: BodyId) -> u128 {
    let (lo, hi) = if a.0 <= b.0 {
        (a.0 as u128, b.0 as u128)
    } else {
        (b.0 as u128, a.0 as u128)
    };
    (lo + hi) * (lo + hi + 1) / 2 + hi
}

/// A shape participating in the simulation.
///
/// A body is static exactly when its mass is infinite; its inverse mass
/// is then zero and no force, impulse, or positional correction can
/// move it. Static bodies are created dynamic and frozen with
/// [`set_static`](Body::set_static).
#[derive(Debug)]
pub struct Body {
    id: BodyId,
    shape: Shape,
    position: DVec2,
    velocity: DVec2,
    acceleration: DVec2,
    force: DVec2,
    /// Intentional movement direction; unit length or zero.
    movement: DVec2,
    mass: f64,
    inverse_mass: f64,
    /// Surface properties combined per contact.
    pub material: Material,
    /// Sensors detect and report collisions but produce no impulses,
    /// and their events bypass the event masks.
    pub is_sensor: bool,
    /// Layer bits this body occupies.
    pub layer: u32,
    /// Layers allowed to exchange impulses with this body (bilateral).
    pub resolution_mask: u32,
    /// Layers whose contact triggers this body's events (unilateral).
    pub event_mask: u32,
    pub(crate) events: CollisionEvents,
}

impl Body {
    /// Create a dynamic body. `mass` must be positive and finite; use
    /// [`set_static`](Body::set_static) to freeze a body afterwards.
    pub fn new(shape: Shape, position: DVec2, mass: f64) -> Result<Self, PhysicsError> {
        if !mass.is_finite() || mass <= 0.0 {
            return Err(PhysicsError::InvalidMass(mass));
        }
        Ok(Self {
            id: BodyId::next(),
            shape,
            position,
            velocity: DVec2::ZERO,
            acceleration: DVec2::ZERO,
            force: DVec2::ZERO,
            movement: DVec2::ZERO,
            mass,
            inverse_mass: 1.0 / mass,
            material: Material::DEFAULT,
            is_sensor: false,
            layer: 1,
            resolution_mask: u32::MAX,
            event_mask: u32::MAX,
            events: CollisionEvents::new(),
        })
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn position(&self) -> DVec2 {
        self.position
    }

    pub fn velocity(&self) -> DVec2 {
        self.velocity
    }

    pub fn acceleration(&self) -> DVec2 {
        self.acceleration
    }

    pub fn movement(&self) -> DVec2 {
        self.movement
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn inverse_mass(&self) -> f64 {
        self.inverse_mass
    }

    pub fn is_static(&self) -> bool {
        self.inverse_mass == 0.0
    }

    /// Freeze the body: infinite mass, zero velocity and acceleration.
    pub fn set_static(&mut self) {
        self.mass = f64::INFINITY;
        self.inverse_mass = 0.0;
        self.velocity = DVec2::ZERO;
        self.acceleration = DVec2::ZERO;
        self.force = DVec2::ZERO;
    }

    /// Change the mass of a dynamic body. No-op on static bodies; an
    /// invalid mass is an error.
    pub fn set_mass(&mut self, mass: f64) -> Result<(), PhysicsError> {
        if self.is_static() {
            return Ok(());
        }
        if !mass.is_finite() || mass <= 0.0 {
            return Err(PhysicsError::InvalidMass(mass));
        }
        self.mass = mass;
        self.inverse_mass = 1.0 / mass;
        Ok(())
    }

    /// Accumulate a force for this step; applied at integration time.
    pub fn apply_force(&mut self, force: DVec2) {
        self.force += force;
    }

    /// Instantaneous velocity change, scaled by inverse mass. Exact
    /// no-op on static bodies.
    pub fn apply_impulse(&mut self, impulse: DVec2) {
        if self.is_static() {
            return;
        }
        self.velocity += impulse * self.inverse_mass;
    }

    /// Record the intended movement direction for this step.
    ///
    /// The direction is normalized (a zero vector clears the intent).
    /// Movement does not accelerate the body by itself; pair it with
    /// forces or impulses. The solver suppresses restitution when a
    /// body deliberately pushes into a static obstacle, and the world
    /// clears the intent at the end of every fixed step.
    pub fn apply_movement(&mut self, direction: DVec2) {
        self.movement = math::normalize_or_zero(direction);
    }

    pub fn set_position(&mut self, position: DVec2) {
        self.position = position;
    }

    /// Set the velocity of a dynamic body. No-op on static bodies.
    pub fn set_velocity(&mut self, velocity: DVec2) {
        if self.is_static() {
            return;
        }
        self.velocity = velocity;
    }

    pub(crate) fn translate(&mut self, offset: DVec2) {
        self.position += offset;
    }

    /// World-space bounding box at the current position.
    pub fn aabb(&self) -> Aabb {
        self.shape.aabb(self.position)
    }

    /// `½·m·|v|²`; zero for static bodies.
    pub fn kinetic_energy(&self) -> f64 {
        if self.is_static() {
            return 0.0;
        }
        0.5 * self.mass * self.velocity.length_squared()
    }

    /// Layers this body can collide with at all (detection filter).
    pub fn collision_mask(&self) -> u32 {
        self.event_mask | self.resolution_mask
    }

    /// Advance the body by `dt` under the world's top-down drag.
    ///
    /// Semi-implicit Euler: forces become acceleration, velocity decays
    /// by the mass-weighted drag, near-zero velocities snap to rest,
    /// and the position advances last. Static bodies do not move.
    pub(crate) fn integrate(&mut self, dt: f64, damping: f64) {
        if self.is_static() {
            return;
        }
        self.acceleration = self.force * self.inverse_mass;
        self.velocity += self.acceleration * dt;

        let drag = 1.0 - damping * self.material.friction * self.mass * dt;
        self.velocity *= drag.max(0.0);

        if self.velocity.length_squared() < EPSILON_SQ {
            self.velocity = DVec2::ZERO;
        }
        self.position += self.velocity * dt;
    }

    /// Drop per-step inputs; called by the world after each fixed step.
    pub(crate) fn clear_forces(&mut self) {
        self.force = DVec2::ZERO;
        self.movement = DVec2::ZERO;
    }

    /// Register a collision handler on this body.
    pub fn on(
        &mut self,
        kind: CollisionEventKind,
        handler: impl FnMut(&CollisionEvent) + 'static,
    ) -> HandlerId {
        self.events.on(kind, handler)
    }

    /// Remove one handler; returns whether it was registered.
    pub fn off(&mut self, kind: CollisionEventKind, id: HandlerId) -> bool {
        self.events.off(kind, id)
    }

    /// Drop this body's handlers of `kind`, or all of them when `None`.
    pub fn remove_all_listeners(&mut self, kind: Option<CollisionEventKind>) {
        self.events.remove_all(kind);
    }
}

/// Bilateral detection filter used by the broad phase: each body must
/// accept the other's layer through its combined mask.
pub fn can_detect_collision(a: &Body, b: &Body) -> bool {
    (a.collision_mask() & b.layer) != 0 && (b.collision_mask() & a.layer) != 0
}

/// Bilateral resolution filter: only non-sensor pairs that accept each
/// other's layer exchange impulses.
pub fn can_resolve_collision(a: &Body, b: &Body) -> bool {
    !a.is_sensor
        && !b.is_sensor
        && (a.resolution_mask & b.layer) != 0
        && (b.resolution_mask & a.layer) != 0
}

/// Event filter: sensors always emit; otherwise either side's event
/// mask matching the other's layer suffices (unilateral).
pub fn can_emit_event(a: &Body, b: &Body) -> bool {
    if a.is_sensor || b.is_sensor {
        return true;
    }
    (a.event_mask & b.layer) != 0 || (b.event_mask & a.layer) != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(mass: f64) -> Body {
        Body::new(Shape::circle(1.0), DVec2::ZERO, mass).unwrap()
    }

    #[test]
    fn test_invalid_mass_is_rejected() {
        assert!(Body::new(Shape::circle(1.0), DVec2::ZERO, 0.0).is_err());
        assert!(Body::new(Shape::circle(1.0), DVec2::ZERO, -1.0).is_err());
        assert!(Body::new(Shape::circle(1.0), DVec2::ZERO, f64::INFINITY).is_err());
        assert!(Body::new(Shape::circle(1.0), DVec2::ZERO, f64::NAN).is_err());
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let a = circle(1.0);
        let b = circle(1.0);
        assert!(b.id().raw() > a.id().raw());
    }

    #[test]
    fn test_pair_key_is_order_independent() {
        let a = circle(1.0);
        let b = circle(1.0);
        let c = circle(1.0);
        assert_eq!(pair_key(a.id(), b.id()), pair_key(b.id(), a.id()));
        assert_ne!(pair_key(a.id(), b.id()), pair_key(a.id(), c.id()));
    }

    #[test]
    fn test_static_encoding() {
        let mut body = circle(2.0);
        body.set_velocity(DVec2::new(3.0, 0.0));
        body.set_static();

        assert!(body.is_static());
        assert_eq!(body.inverse_mass(), 0.0);
        assert_eq!(body.velocity(), DVec2::ZERO);

        // Finite mass on a static body is a no-op, not an error.
        body.set_mass(5.0).unwrap();
        assert!(body.is_static());

        // No public input moves a static body.
        body.apply_impulse(DVec2::new(100.0, 0.0));
        body.set_velocity(DVec2::new(1.0, 1.0));
        body.apply_force(DVec2::new(50.0, 0.0));
        body.integrate(1.0, 1.0);
        assert_eq!(body.velocity(), DVec2::ZERO);
        assert_eq!(body.position(), DVec2::ZERO);
    }

    #[test]
    fn test_apply_impulse_scales_by_inverse_mass() {
        let mut body = circle(2.0);
        body.apply_impulse(DVec2::new(4.0, 0.0));
        assert_eq!(body.velocity(), DVec2::new(2.0, 0.0));
    }

    #[test]
    fn test_apply_movement_normalizes() {
        let mut body = circle(1.0);
        body.apply_movement(DVec2::new(3.0, 4.0));
        assert!((body.movement().length() - 1.0).abs() < 1e-12);

        body.apply_movement(DVec2::ZERO);
        assert_eq!(body.movement(), DVec2::ZERO);
    }

    #[test]
    fn test_integrate_applies_force_and_drag() {
        let mut body = circle(1.0);
        body.material = Material::new(0.5, 0.5);
        body.apply_force(DVec2::new(10.0, 0.0));
        body.integrate(0.1, 1.0);

        // v = a*dt = 1.0, then damped by 1 - 1*0.5*1*0.1 = 0.95.
        assert!((body.velocity().x - 0.95).abs() < 1e-12);
        assert!((body.position().x - 0.095).abs() < 1e-12);
        assert_eq!(body.acceleration(), DVec2::new(10.0, 0.0));
    }

    #[test]
    fn test_integrate_clamps_tiny_velocity_to_rest() {
        let mut body = circle(1.0);
        body.set_velocity(DVec2::splat(1e-11));
        body.integrate(1.0 / 60.0, 0.0);
        assert_eq!(body.velocity(), DVec2::ZERO);
    }

    #[test]
    fn test_heavy_drag_stops_instead_of_reversing() {
        let mut body = circle(100.0);
        body.material = Material::HEAVY;
        body.set_velocity(DVec2::new(5.0, 0.0));
        // damping * friction * mass * dt > 1: factor clamps at zero.
        body.integrate(1.0 / 60.0, 1.0);
        assert_eq!(body.velocity(), DVec2::ZERO);
    }

    #[test]
    fn test_kinetic_energy() {
        let mut body = circle(2.0);
        body.set_velocity(DVec2::new(3.0, 0.0));
        assert!((body.kinetic_energy() - 9.0).abs() < 1e-12);

        body.set_static();
        assert_eq!(body.kinetic_energy(), 0.0);
    }

    #[test]
    fn test_mask_predicates() {
        let mut a = circle(1.0);
        a.layer = 0b001;
        a.event_mask = 0b010;
        a.resolution_mask = 0b010;
        let mut b = circle(1.0);
        b.layer = 0b010;
        b.event_mask = 0b001;
        b.resolution_mask = 0b001;

        assert!(can_detect_collision(&a, &b));
        assert!(can_resolve_collision(&a, &b));
        assert!(can_emit_event(&a, &b));

        // Dropping one side's resolution consent kills impulses but the
        // pair stays detectable and eventful.
        a.resolution_mask = 0;
        assert!(can_detect_collision(&a, &b));
        assert!(!can_resolve_collision(&a, &b));
        assert!(can_emit_event(&a, &b));
    }

    #[test]
    fn test_sensor_bypasses_event_masks() {
        let mut a = circle(1.0);
        a.is_sensor = true;
        a.event_mask = 0;
        let mut b = circle(1.0);
        b.event_mask = 0;

        assert!(can_emit_event(&a, &b));
        assert!(!can_resolve_collision(&a, &b));
    }

    #[test]
    fn test_body_position_is_shape_center() {
        let mut body = circle(1.0);
        body.set_position(DVec2::new(7.0, -3.0));
        assert_eq!(body.aabb().center(), DVec2::new(7.0, -3.0));

        body.translate(DVec2::new(1.0, 1.0));
        assert_eq!(body.aabb().center(), body.position());
    }
}
