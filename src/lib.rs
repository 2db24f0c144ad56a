//! Planar 2D physics
//!
//! A deterministic fixed-timestep rigid-body engine for top-down games:
//! circles and axis-aligned rectangles, impulse-based contact
//! resolution with Coulomb friction, continuous collision detection for
//! fast movers, and a start/active/end collision lifecycle.
//!
//! # Architecture
//!
//! [`World::step`] accumulates real time and runs whole fixed sub-steps.
//! Each sub-step pipelines:
//!
//! 1. **broadphase** - candidate pairs from the spatial hash grid
//! 2. **sweep** - fast pairs advance to their first time of impact
//! 3. **narrowphase** - contact manifolds for the candidate pairs
//! 4. **events** - start/active/end diff against the previous sub-step
//! 5. **solver** - velocity impulses, then positional correction
//! 6. integration of remaining time, broad-phase resync, input clear
//!
//! Bodies have no angular state; the engine trades rotation for the
//! stability and predictability a top-down game wants. "Gravity" in
//! this world is a top-down drag coefficient, not an acceleration; see
//! [`WorldConfig::damping`].
//!
//! # Example
//!
//! ```
//! use glam::DVec2;
//! use planar::{Body, CollisionEventKind, Shape, World, WorldConfig};
//!
//! let mut world = World::new(WorldConfig::default())?;
//!
//! let mut ball = Body::new(Shape::circle(10.0), DVec2::ZERO, 1.0)?;
//! ball.set_velocity(DVec2::new(120.0, 0.0));
//! let ball = world.add_body(ball);
//!
//! let mut wall = Body::new(Shape::rect(20.0, 200.0), DVec2::new(300.0, 0.0), 1.0)?;
//! wall.set_static();
//! world.add_body(wall);
//!
//! world.on(CollisionEventKind::Start, |event| {
//!     println!("{:?} hit {:?}", event.body_a, event.body_b);
//! });
//!
//! for _ in 0..60 {
//!     world.step(1.0 / 60.0);
//! }
//! assert!(world.get_body(ball).unwrap().position().x < 300.0);
//! # Ok::<(), planar::PhysicsError>(())
//! ```

pub mod aabb;
pub mod body;
pub mod broadphase;
pub mod contact;
pub mod error;
pub mod events;
pub mod material;
pub mod math;
pub mod narrowphase;
pub mod shape;
pub mod solver;
pub mod sweep;
pub mod world;

// Re-export commonly used types
pub use aabb::Aabb;
pub use body::{can_detect_collision, can_emit_event, can_resolve_collision, Body, BodyId};
pub use contact::{Contact, Manifold};
pub use error::PhysicsError;
pub use events::{CollisionEvent, CollisionEventKind, HandlerId};
pub use material::Material;
pub use shape::Shape;
pub use solver::ContactSolver;
pub use sweep::SweptHit;
pub use world::{World, WorldConfig};

// Re-export glam for convenience
pub use glam;
