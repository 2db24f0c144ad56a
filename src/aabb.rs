//! Axis-aligned bounding boxes for the broad phase and spatial queries.

use glam::DVec2;

use crate::math::EPSILON;

/// Axis-aligned box; `min` is component-wise below `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: DVec2,
    pub max: DVec2,
}

impl Aabb {
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    /// Box centered at `center` with full `size` along each axis.
    pub fn from_center_size(center: DVec2, size: DVec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    /// Length of the shorter side.
    pub fn min_dimension(&self) -> f64 {
        let size = self.size();
        size.x.min(size.y)
    }

    /// Strict overlap test; boxes that merely touch do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Inclusive containment with a tolerance band on the boundary.
    #[inline]
    pub fn contains(&self, point: DVec2) -> bool {
        point.x >= self.min.x - EPSILON
            && point.x <= self.max.x + EPSILON
            && point.y >= self.min.y - EPSILON
            && point.y <= self.max.y + EPSILON
    }

    /// Smallest box covering both.
    pub fn merge(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Union of this box and its translate by `offset`.
    pub fn swept(&self, offset: DVec2) -> Aabb {
        self.merge(&Aabb::new(self.min + offset, self.max + offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_center_size() {
        let aabb = Aabb::from_center_size(DVec2::new(1.0, 2.0), DVec2::new(4.0, 6.0));
        assert_eq!(aabb.min, DVec2::new(-1.0, -1.0));
        assert_eq!(aabb.max, DVec2::new(3.0, 5.0));
        assert_eq!(aabb.center(), DVec2::new(1.0, 2.0));
        assert_eq!(aabb.min_dimension(), 4.0);
    }

    #[test]
    fn test_overlap_is_strict() {
        let a = Aabb::new(DVec2::ZERO, DVec2::splat(1.0));
        let b = Aabb::new(DVec2::splat(0.5), DVec2::splat(2.0));
        let touching = Aabb::new(DVec2::new(1.0, 0.0), DVec2::new(2.0, 1.0));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&touching));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let aabb = Aabb::new(DVec2::ZERO, DVec2::splat(1.0));
        assert!(aabb.contains(DVec2::splat(0.5)));
        assert!(aabb.contains(DVec2::ZERO));
        assert!(aabb.contains(DVec2::splat(1.0)));
        assert!(!aabb.contains(DVec2::new(1.1, 0.5)));
    }

    #[test]
    fn test_merge_and_swept() {
        let a = Aabb::new(DVec2::ZERO, DVec2::splat(1.0));
        let b = Aabb::new(DVec2::splat(2.0), DVec2::splat(3.0));
        let merged = a.merge(&b);
        assert_eq!(merged.min, DVec2::ZERO);
        assert_eq!(merged.max, DVec2::splat(3.0));

        let swept = a.swept(DVec2::new(5.0, 0.0));
        assert_eq!(swept.min, DVec2::ZERO);
        assert_eq!(swept.max, DVec2::new(6.0, 1.0));
    }
}
