//! Physics engine benchmarks (criterion - wall-clock time).
//!
//! Run all:    cargo bench --bench physics
//! Filter:     cargo bench --bench physics -- broadphase

use std::collections::HashMap;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::DVec2;
use planar::body::{Body, BodyId};
use planar::broadphase::SpatialHash;
use planar::contact::Manifold;
use planar::narrowphase::detect;
use planar::solver::ContactSolver;
use planar::{Shape, World, WorldConfig};

/// 32-wide lattice with a 30-unit pitch; radius-16 circles on it leave
/// every horizontal neighbor pair slightly overlapping.
fn lattice_position(i: usize) -> DVec2 {
    DVec2::new((i % 32) as f64 * 30.0, (i / 32) as f64 * 30.0)
}

fn lattice_circle(i: usize) -> Body {
    Body::new(Shape::circle(16.0), lattice_position(i), 1.0).unwrap()
}

fn setup_grid(n: usize) -> SpatialHash {
    let mut grid = SpatialHash::new(100.0);
    for i in 0..n {
        let body = lattice_circle(i);
        grid.insert(body.id(), &body.aabb());
    }
    grid
}

fn setup_world(n: usize) -> World {
    let mut world = World::new(WorldConfig::default()).unwrap();
    for i in 0..n {
        world.add_body(lattice_circle(i));
    }
    world
}

/// Bodies plus the manifolds of every overlapping lattice neighbor.
fn setup_contacts(n: usize) -> (HashMap<BodyId, Body>, Vec<Manifold>) {
    let mut bodies = HashMap::new();
    let mut ids = Vec::new();
    for i in 0..n {
        let body = lattice_circle(i);
        ids.push(body.id());
        bodies.insert(body.id(), body);
    }
    let mut manifolds = Vec::new();
    for pair in ids.windows(2) {
        if let Some(manifold) = detect(&bodies[&pair[0]], &bodies[&pair[1]]) {
            manifolds.push(manifold);
        }
    }
    (bodies, manifolds)
}

// ---------------------------------------------------------------------------
// Broadphase
// ---------------------------------------------------------------------------

fn bench_broadphase(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("broadphase/pairs");
        for &n in &[100, 500, 1000, 2000] {
            let grid = setup_grid(n);
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
                b.iter(|| grid.pairs(|_, _| true));
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("broadphase/query_region");
        let grid = setup_grid(1000);
        let probe = planar::Aabb::new(DVec2::ZERO, DVec2::splat(200.0));
        group.bench_function("1000_bodies", |b| {
            b.iter(|| grid.query_region(&probe));
        });
        group.finish();
    }
}

// ---------------------------------------------------------------------------
// Narrowphase
// ---------------------------------------------------------------------------

fn bench_narrowphase(c: &mut Criterion) {
    let mut group = c.benchmark_group("narrowphase/dispatch");

    let circle_a = Body::new(Shape::circle(1.0), DVec2::ZERO, 1.0).unwrap();
    let circle_hit = Body::new(Shape::circle(1.0), DVec2::new(1.5, 0.0), 1.0).unwrap();
    let circle_miss = Body::new(Shape::circle(1.0), DVec2::new(5.0, 0.0), 1.0).unwrap();
    group.bench_function("circle_circle_intersecting", |b| {
        b.iter(|| detect(&circle_a, &circle_hit));
    });
    group.bench_function("circle_circle_separated", |b| {
        b.iter(|| detect(&circle_a, &circle_miss));
    });

    let rect_a = Body::new(Shape::rect(2.0, 2.0), DVec2::ZERO, 1.0).unwrap();
    let rect_hit = Body::new(Shape::rect(2.0, 2.0), DVec2::new(1.5, 0.0), 1.0).unwrap();
    group.bench_function("rect_rect_intersecting", |b| {
        b.iter(|| detect(&rect_a, &rect_hit));
    });
    group.bench_function("circle_rect", |b| {
        b.iter(|| detect(&circle_a, &rect_hit));
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

fn bench_solver(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("solver/contact_count");
        for &n in &[10, 50, 100, 500] {
            let (mut bodies, manifolds) = setup_contacts(n);
            let solver = ContactSolver::default();
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
                b.iter_batched(
                    || manifolds.clone(),
                    |mut m| solver.solve(&mut m, &mut bodies),
                    criterion::BatchSize::SmallInput,
                );
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("solver/velocity_iterations");
        let (mut bodies, manifolds) = setup_contacts(100);
        for &iters in &[1, 4, 8, 16] {
            let solver = ContactSolver {
                velocity_iterations: iters,
                ..ContactSolver::default()
            };
            group.bench_with_input(BenchmarkId::from_parameter(iters), &iters, |b, _| {
                b.iter_batched(
                    || manifolds.clone(),
                    |mut m| solver.solve(&mut m, &mut bodies),
                    criterion::BatchSize::SmallInput,
                );
            });
        }
        group.finish();
    }
}

// ---------------------------------------------------------------------------
// Full pipeline
// ---------------------------------------------------------------------------

fn bench_pipeline(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("pipeline/step");
        group.sample_size(30);
        for &n in &[50, 100, 500, 1000] {
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
                b.iter_batched(
                    || setup_world(n),
                    |mut world| world.step(1.0 / 60.0),
                    criterion::BatchSize::LargeInput,
                );
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("pipeline/sustained_10steps");
        group.sample_size(20);
        for &n in &[100, 500] {
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
                b.iter_batched(
                    || setup_world(n),
                    |mut world| {
                        for _ in 0..10 {
                            world.step(1.0 / 60.0);
                        }
                    },
                    criterion::BatchSize::LargeInput,
                );
            });
        }
        group.finish();
    }
}

criterion_group!(
    benches,
    bench_broadphase,
    bench_narrowphase,
    bench_solver,
    bench_pipeline,
);
criterion_main!(benches);
