//! The simulation world: body store, fixed-step loop, and the
//! collision lifecycle.

use std::collections::HashMap;

use glam::DVec2;

use crate::aabb::Aabb;
use crate::body::{self, pair_key, Body, BodyId};
use crate::broadphase::SpatialHash;
use crate::contact::Manifold;
use crate::error::PhysicsError;
use crate::events::{CollisionEvent, CollisionEventKind, CollisionEvents, HandlerId};
use crate::narrowphase;
use crate::shape::Shape;
use crate::solver::ContactSolver;
use crate::sweep;

/// Tunables for a [`World`].
#[derive(Debug, Clone)]
pub struct WorldConfig {
    /// Top-down drag coefficient; the legacy name for this knob is
    /// "gravity", but it is not a directional acceleration. Each step a
    /// body's velocity decays by `damping * friction * mass * dt`, so
    /// heavier bodies coast to a stop sooner.
    pub damping: f64,
    /// Fixed sub-step duration in seconds.
    pub time_step: f64,
    /// Upper bound on sub-steps per [`World::step`] call.
    pub max_sub_steps: u32,
    /// Cell size of the broad-phase grid.
    pub spatial_cell_size: f64,
    /// Solver velocity iterations per sub-step.
    pub velocity_iterations: u32,
    /// Solver position iterations per sub-step.
    pub position_iterations: u32,
    /// Swept tests for fast bodies. Leave on unless every body is slow
    /// relative to its own size.
    pub ccd: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            damping: 1.0,
            time_step: 1.0 / 60.0,
            max_sub_steps: 8,
            spatial_cell_size: 100.0,
            velocity_iterations: 6,
            position_iterations: 3,
            ccd: true,
        }
    }
}

impl WorldConfig {
    fn validate(&self) -> Result<(), PhysicsError> {
        if !self.time_step.is_finite() || self.time_step <= 0.0 {
            return Err(PhysicsError::InvalidConfig(
                "time_step must be positive and finite",
            ));
        }
        if self.max_sub_steps == 0 {
            return Err(PhysicsError::InvalidConfig(
                "max_sub_steps must be at least 1",
            ));
        }
        if !self.spatial_cell_size.is_finite() || self.spatial_cell_size <= 0.0 {
            return Err(PhysicsError::InvalidConfig(
                "spatial_cell_size must be positive and finite",
            ));
        }
        if !self.damping.is_finite() || self.damping < 0.0 {
            return Err(PhysicsError::InvalidConfig(
                "damping must be non-negative and finite",
            ));
        }
        if self.velocity_iterations == 0 || self.position_iterations == 0 {
            return Err(PhysicsError::InvalidConfig(
                "solver iteration counts must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Pair bookkeeping for the start/active/end diff.
#[derive(Debug, Clone, Copy)]
struct PairState {
    body_a: BodyId,
    body_b: BodyId,
    is_sensor: bool,
}

/// A deterministic fixed-timestep 2D physics simulation.
///
/// The world owns its bodies exclusively. `step` accumulates real time
/// and runs whole fixed sub-steps; each sub-step pipelines broad phase,
/// CCD, narrow phase, event dispatch, contact resolution, integration,
/// and broad-phase resync. Collision handlers run synchronously between
/// detection and resolution, so they observe pre-impulse state; they
/// receive body ids rather than references and cannot mutate the world
/// mid-step.
///
/// External mutations through [`World::get_body_mut`] (position or
/// velocity changes) are picked up by the broad phase at the next step.
pub struct World {
    config: WorldConfig,
    bodies: HashMap<BodyId, Body>,
    broadphase: SpatialHash,
    solver: ContactSolver,
    events: CollisionEvents,
    /// Resolvable manifolds of the current sub-step; scratch, reused.
    manifolds: Vec<Manifold>,
    pending_events: Vec<(CollisionEventKind, CollisionEvent)>,
    current: HashMap<u128, PairState>,
    previous: HashMap<u128, PairState>,
    /// Seconds already integrated this sub-step by the CCD pass.
    consumed_time: HashMap<BodyId, f64>,
    time: f64,
    accumulator: f64,
}

impl World {
    pub fn new(config: WorldConfig) -> Result<Self, PhysicsError> {
        config.validate()?;
        let solver = ContactSolver {
            velocity_iterations: config.velocity_iterations,
            position_iterations: config.position_iterations,
            ..ContactSolver::default()
        };
        Ok(Self {
            broadphase: SpatialHash::new(config.spatial_cell_size),
            solver,
            bodies: HashMap::new(),
            events: CollisionEvents::new(),
            manifolds: Vec::new(),
            pending_events: Vec::new(),
            current: HashMap::new(),
            previous: HashMap::new(),
            consumed_time: HashMap::new(),
            time: 0.0,
            accumulator: 0.0,
            config,
        })
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Simulated time advanced so far, in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn damping(&self) -> f64 {
        self.config.damping
    }

    pub fn set_damping(&mut self, damping: f64) {
        self.config.damping = damping;
    }

    /// Take ownership of `body` and register it with the broad phase.
    pub fn add_body(&mut self, body: Body) -> BodyId {
        let id = body.id();
        let aabb = Self::registration_aabb(&self.config, &body, self.config.time_step);
        self.broadphase.insert(id, &aabb);
        self.bodies.insert(id, body);
        id
    }

    /// Remove and return a body. Pairs it participated in emit their
    /// end event on the next step.
    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        self.broadphase.remove(id);
        self.consumed_time.remove(&id);
        self.bodies.remove(&id)
    }

    pub fn get_body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    pub fn get_body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(&id)
    }

    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.values()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Drop every body and all pair bookkeeping. No end events fire.
    pub fn clear_bodies(&mut self) {
        self.bodies.clear();
        self.broadphase.clear();
        self.current.clear();
        self.previous.clear();
        self.consumed_time.clear();
        self.manifolds.clear();
    }

    /// Register a world-wide collision handler.
    pub fn on(
        &mut self,
        kind: CollisionEventKind,
        handler: impl FnMut(&CollisionEvent) + 'static,
    ) -> HandlerId {
        self.events.on(kind, handler)
    }

    /// Remove one world-wide handler; returns whether it was registered.
    pub fn off(&mut self, kind: CollisionEventKind, id: HandlerId) -> bool {
        self.events.off(kind, id)
    }

    /// Drop world-wide handlers of `kind`, or all of them when `None`.
    pub fn remove_all_listeners(&mut self, kind: Option<CollisionEventKind>) {
        self.events.remove_all(kind);
    }

    /// Advance the simulation by `delta_time` seconds of real time,
    /// running as many whole fixed sub-steps as fit. The delta is
    /// clamped to `max_sub_steps * time_step` so a slow frame cannot
    /// snowball into an ever-growing backlog.
    pub fn step(&mut self, delta_time: f64) {
        if !delta_time.is_finite() {
            tracing::warn!(delta_time, "ignoring non-finite step delta");
            return;
        }
        if delta_time <= 0.0 {
            return;
        }
        let budget = self.config.time_step * self.config.max_sub_steps as f64;
        let delta_time = if delta_time > budget {
            tracing::warn!(delta_time, budget, "step delta exceeds budget, clamping");
            budget
        } else {
            delta_time
        };

        self.accumulator += delta_time;
        let mut steps = 0;
        while self.accumulator >= self.config.time_step && steps < self.config.max_sub_steps {
            self.fixed_step(self.config.time_step);
            self.accumulator -= self.config.time_step;
            self.time += self.config.time_step;
            steps += 1;
        }
    }

    fn fixed_step(&mut self, dt: f64) {
        self.consumed_time.clear();

        // One candidate snapshot feeds CCD, detection, and events.
        let pairs = self.candidate_pairs();

        if self.config.ccd {
            self.ccd_pass(&pairs, dt);
        }
        self.detect_pass(&pairs);
        self.dispatch_events();
        self.resolve_pass();
        self.integrate_pass(dt);
        self.sync_broadphase(dt);
        self.clear_step_state();
    }

    /// Broad-phase pairs filtered to detectable ones. Static-static
    /// pairs are dropped here, so nothing downstream ever sees one.
    fn candidate_pairs(&self) -> Vec<(BodyId, BodyId)> {
        let bodies = &self.bodies;
        self.broadphase.pairs(|id_a, id_b| {
            let (Some(a), Some(b)) = (bodies.get(&id_a), bodies.get(&id_b)) else {
                return false;
            };
            if a.is_static() && b.is_static() {
                return false;
            }
            body::can_detect_collision(a, b)
        })
    }

    /// Advance fast pairs to their first time of impact. Each body is
    /// advanced for at most one contact per sub-step; the remainder of
    /// its time integrates after resolution.
    fn ccd_pass(&mut self, pairs: &[(BodyId, BodyId)], dt: f64) {
        for &(id_a, id_b) in pairs {
            if self.consumed_time.contains_key(&id_a) || self.consumed_time.contains_key(&id_b) {
                continue;
            }
            let (Some(a), Some(b)) = (self.bodies.get(&id_a), self.bodies.get(&id_b)) else {
                continue;
            };
            if !sweep::needs_swept_test(a, dt) && !sweep::needs_swept_test(b, dt) {
                continue;
            }
            let Some(hit) = sweep::time_of_impact(a, b, dt) else {
                continue;
            };

            let advanced = hit.toi * dt;
            for id in [id_a, id_b] {
                if let Some(body) = self.bodies.get_mut(&id) {
                    body.integrate(advanced, self.config.damping);
                }
                self.consumed_time.insert(id, advanced);
            }
        }
    }

    /// Run the narrow phase over the candidates, bucket resolvable
    /// manifolds, and diff the pair set against the previous sub-step.
    fn detect_pass(&mut self, pairs: &[(BodyId, BodyId)]) {
        self.manifolds.clear();
        self.current.clear();
        self.pending_events.clear();

        for &(id_a, id_b) in pairs {
            let (Some(a), Some(b)) = (self.bodies.get(&id_a), self.bodies.get(&id_b)) else {
                continue;
            };
            let Some(manifold) = narrowphase::detect(a, b) else {
                continue;
            };
            let is_sensor = a.is_sensor || b.is_sensor;

            if body::can_emit_event(a, b) {
                let key = pair_key(id_a, id_b);
                let kind = if self.previous.contains_key(&key) {
                    CollisionEventKind::Active
                } else {
                    CollisionEventKind::Start
                };
                self.current.insert(
                    key,
                    PairState {
                        body_a: id_a,
                        body_b: id_b,
                        is_sensor,
                    },
                );
                self.pending_events.push((
                    kind,
                    CollisionEvent {
                        body_a: id_a,
                        body_b: id_b,
                        is_sensor,
                        manifold: Some(manifold.clone()),
                    },
                ));
            }

            // Sensors never reach the solver.
            if !is_sensor {
                self.manifolds.push(manifold);
            }
        }

        // Pairs that overlapped last sub-step and no longer do. The
        // manifold has dissolved, so end events carry none.
        for (key, state) in &self.previous {
            if !self.current.contains_key(key) {
                self.pending_events.push((
                    CollisionEventKind::End,
                    CollisionEvent {
                        body_a: state.body_a,
                        body_b: state.body_b,
                        is_sensor: state.is_sensor,
                        manifold: None,
                    },
                ));
            }
        }
    }

    /// Deliver pending events: world handlers first, then each involved
    /// body's own handlers. Handlers see pre-impulse state.
    fn dispatch_events(&mut self) {
        if self.pending_events.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending_events);
        for (kind, event) in &pending {
            if self.events.has_listeners(*kind) {
                self.events.emit(*kind, event);
            }
            for id in [event.body_a, event.body_b] {
                if let Some(body) = self.bodies.get_mut(&id) {
                    body.events.emit(*kind, event);
                }
            }
        }
        // Reuse the allocation.
        self.pending_events = pending;
        self.pending_events.clear();
    }

    /// Feed the solver every manifold whose pair consents to impulses.
    fn resolve_pass(&mut self) {
        let bodies = &self.bodies;
        self.manifolds.retain(|manifold| {
            let (Some(a), Some(b)) = (
                bodies.get(&manifold.body_a),
                bodies.get(&manifold.body_b),
            ) else {
                return false;
            };
            body::can_resolve_collision(a, b)
        });
        if self.manifolds.is_empty() {
            return;
        }

        let mut manifolds = std::mem::take(&mut self.manifolds);
        self.solver.solve(&mut manifolds, &mut self.bodies);
        self.manifolds = manifolds;
    }

    /// Integrate every body over whatever part of the sub-step the CCD
    /// pass has not consumed for it.
    fn integrate_pass(&mut self, dt: f64) {
        for body in self.bodies.values_mut() {
            let consumed = self
                .consumed_time
                .get(&body.id())
                .copied()
                .unwrap_or(0.0);
            let remaining = (dt - consumed).max(0.0);
            if remaining > 0.0 {
                body.integrate(remaining, self.config.damping);
            }
        }
    }

    fn sync_broadphase(&mut self, dt: f64) {
        for body in self.bodies.values() {
            let aabb = Self::registration_aabb(&self.config, body, dt);
            self.broadphase.update(body.id(), &aabb);
        }
    }

    /// Fast bodies register under their swept box so the broad phase
    /// hands CCD the candidate pair before they cross a thin obstacle.
    fn registration_aabb(config: &WorldConfig, body: &Body, dt: f64) -> Aabb {
        let aabb = body.aabb();
        if config.ccd && sweep::needs_swept_test(body, dt) {
            aabb.swept(body.velocity() * dt)
        } else {
            aabb
        }
    }

    fn clear_step_state(&mut self) {
        for body in self.bodies.values_mut() {
            body.clear_forces();
        }
        std::mem::swap(&mut self.previous, &mut self.current);
    }

    /// Bodies whose shape contains `point`.
    pub fn query_point(&self, point: DVec2) -> Vec<BodyId> {
        let probe = Aabb::new(point, point);
        self.broadphase
            .query_region(&probe)
            .into_iter()
            .filter(|id| {
                self.bodies
                    .get(id)
                    .is_some_and(|body| body.shape().contains(body.position(), point))
            })
            .collect()
    }

    /// Bodies whose shape overlaps the region.
    pub fn query_region(&self, region: &Aabb) -> Vec<BodyId> {
        let shape = Shape::Rect {
            half_extents: region.size() * 0.5,
        };
        self.query_overlaps_with_shape(&shape, region.center())
    }

    /// Bodies whose shape overlaps `shape` placed at `center`.
    pub fn query_overlaps_with_shape(&self, shape: &Shape, center: DVec2) -> Vec<BodyId> {
        self.broadphase
            .query_region(&shape.aabb(center))
            .into_iter()
            .filter(|id| {
                self.bodies
                    .get(id)
                    .is_some_and(|body| body.shape().overlaps(body.position(), shape, center))
            })
            .collect()
    }

    /// Bodies overlapping `body`'s shape, excluding the body itself.
    pub fn query_overlaps_with_body(&self, id: BodyId) -> Vec<BodyId> {
        let Some(body) = self.bodies.get(&id) else {
            return Vec::new();
        };
        self.query_overlaps_with_shape(&body.shape(), body.position())
            .into_iter()
            .filter(|other| *other != id)
            .collect()
    }
}
