//! Collision shapes.
//!
//! Variants store dimensions only; the owning body holds the world-space
//! center. A body's position and its shape's center are therefore one
//! value by construction, and every shape method takes the placement
//! explicitly.

use glam::DVec2;

use crate::aabb::Aabb;
use crate::math::{EPSILON, EPSILON_SQ};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Circle of the given radius.
    Circle { radius: f64 },
    /// Axis-aligned rectangle with the given half extents.
    Rect { half_extents: DVec2 },
}

impl Shape {
    pub fn circle(radius: f64) -> Self {
        Shape::Circle { radius }
    }

    /// Rectangle from full width and height.
    pub fn rect(width: f64, height: f64) -> Self {
        Shape::Rect {
            half_extents: DVec2::new(width, height) * 0.5,
        }
    }

    /// World-space bounding box when centered at `center`.
    pub fn aabb(&self, center: DVec2) -> Aabb {
        match *self {
            Shape::Circle { radius } => {
                Aabb::from_center_size(center, DVec2::splat(radius * 2.0))
            }
            Shape::Rect { half_extents } => {
                Aabb::new(center - half_extents, center + half_extents)
            }
        }
    }

    pub fn area(&self) -> f64 {
        match *self {
            Shape::Circle { radius } => std::f64::consts::PI * radius * radius,
            Shape::Rect { half_extents } => 4.0 * half_extents.x * half_extents.y,
        }
    }

    /// Point containment with a tolerance band on the boundary.
    pub fn contains(&self, center: DVec2, point: DVec2) -> bool {
        match *self {
            Shape::Circle { radius } => {
                point.distance_squared(center) <= radius * radius + EPSILON_SQ
            }
            Shape::Rect { .. } => self.aabb(center).contains(point),
        }
    }

    /// Boolean overlap test used by region queries; produces no manifold.
    pub fn overlaps(&self, center: DVec2, other: &Shape, other_center: DVec2) -> bool {
        match (*self, *other) {
            (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
                let r_sum = ra + rb;
                center.distance_squared(other_center) < r_sum * r_sum
            }
            (Shape::Circle { radius }, Shape::Rect { half_extents }) => {
                circle_rect_overlap(center, radius, other_center, half_extents)
            }
            (Shape::Rect { half_extents }, Shape::Circle { radius }) => {
                circle_rect_overlap(other_center, radius, center, half_extents)
            }
            (Shape::Rect { half_extents: ha }, Shape::Rect { half_extents: hb }) => {
                let gap = ha + hb - (other_center - center).abs();
                gap.x > EPSILON && gap.y > EPSILON
            }
        }
    }
}

/// Clamp the circle center into the rectangle and compare distances.
fn circle_rect_overlap(
    circle_center: DVec2,
    radius: f64,
    rect_center: DVec2,
    half_extents: DVec2,
) -> bool {
    let closest = circle_center.clamp(rect_center - half_extents, rect_center + half_extents);
    circle_center.distance_squared(closest) <= radius * radius + EPSILON_SQ
}
