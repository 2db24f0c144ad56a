//! Broad-phase culling over a uniform spatial hash grid.
//!
//! Bodies are registered in every grid cell their bounding box touches.
//! A reverse index (body to occupied cells) makes removal proportional
//! to the body's own footprint, and empty cells are pruned so the grid
//! never outgrows the live body set.

use std::collections::{HashMap, HashSet};

use glam::DVec2;

use crate::aabb::Aabb;
use crate::body::{pair_key, BodyId};

type CellCoord = (i32, i32);

pub struct SpatialHash {
    cell_size: f64,
    cells: HashMap<CellCoord, Vec<BodyId>>,
    body_cells: HashMap<BodyId, Vec<CellCoord>>,
}

impl SpatialHash {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            body_cells: HashMap::new(),
        }
    }

    fn cell_of(&self, point: DVec2) -> CellCoord {
        (
            (point.x / self.cell_size).floor() as i32,
            (point.y / self.cell_size).floor() as i32,
        )
    }

    fn cell_range(&self, aabb: &Aabb) -> (CellCoord, CellCoord) {
        (self.cell_of(aabb.min), self.cell_of(aabb.max))
    }

    /// Register `id` in every cell `aabb` touches.
    pub fn insert(&mut self, id: BodyId, aabb: &Aabb) {
        let ((x0, y0), (x1, y1)) = self.cell_range(aabb);
        let mut occupied = Vec::new();
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.cells.entry((x, y)).or_default().push(id);
                occupied.push((x, y));
            }
        }
        self.body_cells.insert(id, occupied);
    }

    /// Unregister `id` from every cell it occupies, pruning cells that
    /// become empty.
    pub fn remove(&mut self, id: BodyId) {
        let Some(occupied) = self.body_cells.remove(&id) else {
            return;
        };
        for coord in occupied {
            if let Some(cell) = self.cells.get_mut(&coord) {
                cell.retain(|other| *other != id);
                if cell.is_empty() {
                    self.cells.remove(&coord);
                }
            }
        }
    }

    /// Re-register `id` under a new bounding box.
    pub fn update(&mut self, id: BodyId, aabb: &Aabb) {
        self.remove(id);
        self.insert(id, aabb);
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.body_cells.clear();
    }

    /// Unordered unique pairs of bodies sharing at least one cell,
    /// subject to `filter`. Candidates are a superset of the actual
    /// overlaps; callers run the narrow phase to confirm.
    pub fn pairs(&self, mut filter: impl FnMut(BodyId, BodyId) -> bool) -> Vec<(BodyId, BodyId)> {
        let mut seen = HashSet::new();
        let mut pairs = Vec::new();
        for ids in self.cells.values() {
            for i in 0..ids.len() {
                for j in (i + 1)..ids.len() {
                    let (a, b) = (ids[i], ids[j]);
                    if !seen.insert(pair_key(a, b)) {
                        continue;
                    }
                    if filter(a, b) {
                        pairs.push((a, b));
                    }
                }
            }
        }
        pairs
    }

    /// Every body registered in a cell the region touches; a superset
    /// of the bodies actually overlapping it.
    pub fn query_region(&self, aabb: &Aabb) -> Vec<BodyId> {
        let ((x0, y0), (x1, y1)) = self.cell_range(aabb);
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for y in y0..=y1 {
            for x in x0..=x1 {
                if let Some(ids) = self.cells.get(&(x, y)) {
                    for &id in ids {
                        if seen.insert(id) {
                            out.push(id);
                        }
                    }
                }
            }
        }
        out
    }

    #[cfg(test)]
    fn is_consistent(&self) -> bool {
        // The reverse index and the grid must mirror each other exactly.
        for (id, occupied) in &self.body_cells {
            for coord in occupied {
                match self.cells.get(coord) {
                    Some(cell) if cell.contains(id) => {}
                    _ => return false,
                }
            }
        }
        for (coord, ids) in &self.cells {
            if ids.is_empty() {
                return false;
            }
            for id in ids {
                match self.body_cells.get(id) {
                    Some(occupied) if occupied.contains(coord) => {}
                    _ => return false,
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aabb(min: (f64, f64), max: (f64, f64)) -> Aabb {
        Aabb::new(DVec2::new(min.0, min.1), DVec2::new(max.0, max.1))
    }

    #[test]
    fn test_insert_covers_straddled_cells() {
        let mut grid = SpatialHash::new(1.0);
        let id = BodyId::next();
        // A box straddling the origin touches four cells.
        grid.insert(id, &aabb((-0.5, -0.5), (0.5, 0.5)));
        assert_eq!(grid.cells.len(), 4);
        for coord in [(-1, -1), (-1, 0), (0, -1), (0, 0)] {
            assert!(grid.cells.contains_key(&coord));
        }
        assert!(grid.is_consistent());
    }

    #[test]
    fn test_remove_prunes_empty_cells() {
        let mut grid = SpatialHash::new(1.0);
        let a = BodyId::next();
        let b = BodyId::next();
        grid.insert(a, &aabb((0.1, 0.1), (0.9, 0.9)));
        grid.insert(b, &aabb((0.1, 0.1), (1.9, 0.9)));
        assert!(grid.is_consistent());

        grid.remove(b);
        assert!(grid.is_consistent());
        assert_eq!(grid.cells.len(), 1);

        grid.remove(a);
        assert!(grid.cells.is_empty());
        assert!(grid.body_cells.is_empty());

        // Removing an unknown id is harmless.
        grid.remove(b);
    }

    #[test]
    fn test_update_moves_registration() {
        let mut grid = SpatialHash::new(1.0);
        let id = BodyId::next();
        grid.insert(id, &aabb((0.1, 0.1), (0.9, 0.9)));
        grid.update(id, &aabb((5.1, 0.1), (5.9, 0.9)));

        assert!(grid.is_consistent());
        assert!(grid.query_region(&aabb((0.0, 0.0), (1.0, 1.0))).is_empty());
        assert_eq!(grid.query_region(&aabb((5.0, 0.0), (6.0, 1.0))), vec![id]);
    }

    #[test]
    fn test_pairs_are_unique_across_shared_cells() {
        let mut grid = SpatialHash::new(1.0);
        let a = BodyId::next();
        let b = BodyId::next();
        // Both bodies span the same four cells; the pair must still be
        // reported once.
        grid.insert(a, &aabb((-0.5, -0.5), (0.5, 0.5)));
        grid.insert(b, &aabb((-0.4, -0.4), (0.6, 0.6)));

        let pairs = grid.pairs(|_, _| true);
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn test_pairs_respect_filter() {
        let mut grid = SpatialHash::new(1.0);
        let a = BodyId::next();
        let b = BodyId::next();
        grid.insert(a, &aabb((0.1, 0.1), (0.9, 0.9)));
        grid.insert(b, &aabb((0.2, 0.2), (0.8, 0.8)));

        assert_eq!(grid.pairs(|_, _| false).len(), 0);
        assert_eq!(grid.pairs(|_, _| true).len(), 1);
    }

    #[test]
    fn test_query_region_is_superset_by_cell() {
        let mut grid = SpatialHash::new(10.0);
        let near = BodyId::next();
        let far = BodyId::next();
        grid.insert(near, &aabb((1.0, 1.0), (2.0, 2.0)));
        grid.insert(far, &aabb((8.0, 8.0), (9.0, 9.0)));

        // Both share the cell even though only one overlaps the probe.
        let found = grid.query_region(&aabb((0.0, 0.0), (3.0, 3.0)));
        assert!(found.contains(&near));
        assert!(found.contains(&far));
    }
}
