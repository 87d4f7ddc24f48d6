//! Neighbor search over a frozen frame snapshot.
//!
//! Every implementation returns the same set: all boids other than `exclude` whose
//! distance from the center is strictly below the radius. Order is unspecified.

use std::collections::HashMap;

use glam::Vec2;

use crate::error::QueryError;
use crate::sim::Boid;

/// Neighbor lookup against the current frame.
///
/// `rebuild` runs once per frame before the parallel region. Queries take `&self`
/// and may run concurrently from every worker.
pub trait NeighborQuery: Send + Sync {
    /// Re-index the snapshot. `radius_hint` is the largest radius queried this frame.
    fn rebuild(&mut self, snapshot: &[Boid], radius_hint: f32) -> Result<(), QueryError>;

    /// Clear `out` and fill it with the neighbors of `center`.
    ///
    /// An `exclude` index outside the snapshot excludes nothing.
    fn neighbors_into(
        &self,
        snapshot: &[Boid],
        center: &Boid,
        radius: f32,
        exclude: usize,
        out: &mut Vec<Boid>,
    ) -> Result<(), QueryError>;

    fn neighbors(
        &self,
        snapshot: &[Boid],
        center: &Boid,
        radius: f32,
        exclude: usize,
    ) -> Result<Vec<Boid>, QueryError> {
        let mut out = Vec::new();
        self.neighbors_into(snapshot, center, radius, exclude, &mut out)?;
        Ok(out)
    }

    fn name(&self) -> &'static str;
}

#[inline]
pub(crate) fn within(center: Vec2, other: &Boid, radius_sq: f32) -> bool {
    (other.position() - center).length_squared() < radius_sq
}

/// Linear scan over the whole snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForce;

impl NeighborQuery for BruteForce {
    fn rebuild(&mut self, _snapshot: &[Boid], _radius_hint: f32) -> Result<(), QueryError> {
        Ok(())
    }

    fn neighbors_into(
        &self,
        snapshot: &[Boid],
        center: &Boid,
        radius: f32,
        exclude: usize,
        out: &mut Vec<Boid>,
    ) -> Result<(), QueryError> {
        out.clear();
        let c = center.position();
        let radius_sq = radius * radius;
        out.extend(
            snapshot
                .iter()
                .enumerate()
                .filter(|&(i, other)| i != exclude && within(c, other, radius_sq))
                .map(|(_, other)| *other),
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "brute_force"
    }
}

// Cell coordinates stay well inside i32 so neighbor offsets never overflow.
const MAX_CELL_COORD: f32 = (1u32 << 30) as f32;
const FALLBACK_CELL_SIZE: f32 = 1.0;

type CellKey = (i32, i32);

/// Uniform hash grid over the unbounded plane.
///
/// Boid indices are sorted by cell and stored contiguously; `cells` maps each
/// occupied cell to its range in `order`.
/// The cell edge is widened when the snapshot spans more cells than the
/// coordinate range allows.
#[derive(Debug, Clone, Default)]
pub struct SpatialGrid {
    configured_cell_size: Option<f32>,
    cell_size: f32,
    order: Vec<u32>,
    cells: HashMap<CellKey, (u32, u32)>,
    built_for: usize,
}

impl SpatialGrid {
    /// Grid whose cell edge follows the largest query radius each frame
    pub fn new() -> Self {
        Self::default()
    }

    /// Grid with a fixed cell edge
    pub fn with_cell_size(cell_size: f32) -> Self {
        Self {
            configured_cell_size: Some(cell_size),
            ..Self::default()
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    fn cell_coord(&self, p: Vec2) -> Option<CellKey> {
        let c = (p / self.cell_size).floor();
        if c.x.abs() > MAX_CELL_COORD || c.y.abs() > MAX_CELL_COORD {
            None
        } else {
            Some((c.x as i32, c.y as i32))
        }
    }

    fn resolve_cell_size(&self, radius_hint: f32) -> f32 {
        match self.configured_cell_size {
            Some(size) if size.is_finite() && size > 0.0 => size,
            _ if radius_hint.is_finite() && radius_hint > 0.0 => radius_hint,
            _ => FALLBACK_CELL_SIZE,
        }
    }
}

impl NeighborQuery for SpatialGrid {
    fn rebuild(&mut self, snapshot: &[Boid], radius_hint: f32) -> Result<(), QueryError> {
        self.order.clear();
        self.cells.clear();
        self.built_for = 0;

        let mut extent = 0.0f32;
        for (index, boid) in snapshot.iter().enumerate() {
            let p = boid.position();
            if !p.is_finite() {
                return Err(QueryError::NonFinitePosition { index });
            }
            extent = extent.max(p.abs().max_element());
        }

        // Cells must be wide enough that every coordinate of the snapshot fits,
        // with a factor of two of headroom for rounding.
        let min_cell_size = extent / MAX_CELL_COORD * 2.0;
        let cell_size = self.resolve_cell_size(radius_hint);
        self.cell_size = if cell_size < min_cell_size {
            log::debug!(
                "grid cell size {} too small for extent {}, using {}",
                cell_size,
                extent,
                min_cell_size
            );
            min_cell_size
        } else {
            cell_size
        };

        let mut keyed: Vec<(CellKey, u32)> = Vec::new();
        keyed.try_reserve_exact(snapshot.len())?;

        for (index, boid) in snapshot.iter().enumerate() {
            let p = boid.position();
            let key = self.cell_coord(p).ok_or(QueryError::OutOfRange {
                index,
                position: boid.pos,
            })?;
            keyed.push((key, index as u32));
        }

        keyed.sort_unstable();

        self.order.try_reserve_exact(keyed.len())?;
        self.order.extend(keyed.iter().map(|&(_, index)| index));

        let mut start = 0usize;
        while start < keyed.len() {
            let key = keyed[start].0;
            let mut end = start + 1;
            while end < keyed.len() && keyed[end].0 == key {
                end += 1;
            }
            self.cells.try_reserve(1)?;
            self.cells.insert(key, (start as u32, end as u32));
            start = end;
        }

        self.built_for = snapshot.len();
        log::trace!(
            "spatial grid rebuilt: {} boids in {} cells of {}",
            self.built_for,
            self.cells.len(),
            self.cell_size
        );
        Ok(())
    }

    fn neighbors_into(
        &self,
        snapshot: &[Boid],
        center: &Boid,
        radius: f32,
        exclude: usize,
        out: &mut Vec<Boid>,
    ) -> Result<(), QueryError> {
        out.clear();
        if snapshot.len() != self.built_for {
            return Err(QueryError::Stale {
                built: self.built_for,
                actual: snapshot.len(),
            });
        }

        let c = center.position();
        if !c.is_finite() {
            return Err(QueryError::NonFinitePosition { index: exclude });
        }
        if radius.is_nan() || radius <= 0.0 {
            return Ok(());
        }
        let radius_sq = radius * radius;

        let lo = ((c - radius) / self.cell_size).floor();
        let hi = ((c + radius) / self.cell_size).floor();
        let span = (hi.x - lo.x + 1.0) as f64 * (hi.y - lo.y + 1.0) as f64;

        // A disc covering more cells than are occupied is cheaper to scan directly.
        if !span.is_finite() || span > self.cells.len() as f64 {
            out.extend(
                self.order
                    .iter()
                    .map(|&i| i as usize)
                    .filter(|&i| i != exclude && within(c, &snapshot[i], radius_sq))
                    .map(|i| snapshot[i]),
            );
            return Ok(());
        }

        for cy in lo.y as i32..=hi.y as i32 {
            for cx in lo.x as i32..=hi.x as i32 {
                let Some(&(start, end)) = self.cells.get(&(cx, cy)) else {
                    continue;
                };
                for &i in &self.order[start as usize..end as usize] {
                    let i = i as usize;
                    if i != exclude && within(c, &snapshot[i], radius_sq) {
                        out.push(snapshot[i]);
                    }
                }
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "grid"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boid_at(x: f32, y: f32) -> Boid {
        Boid::new(Vec2::new(x, y), Vec2::ZERO)
    }

    #[test]
    fn grid_groups_boids_by_cell() {
        let snapshot = vec![boid_at(0.5, 0.5), boid_at(0.7, 0.2), boid_at(5.5, 5.5)];
        let mut grid = SpatialGrid::with_cell_size(1.0);
        grid.rebuild(&snapshot, 3.0).unwrap();
        assert_eq!(grid.cell_size(), 1.0);
        assert_eq!(grid.occupied_cells(), 2);
    }

    #[test]
    fn grid_derives_cell_size_from_hint() {
        let mut grid = SpatialGrid::new();
        grid.rebuild(&[boid_at(0.0, 0.0)], 12.5).unwrap();
        assert_eq!(grid.cell_size(), 12.5);

        grid.rebuild(&[boid_at(0.0, 0.0)], 0.0).unwrap();
        assert_eq!(grid.cell_size(), FALLBACK_CELL_SIZE);
    }

    #[test]
    fn grid_widens_cells_to_cover_the_snapshot() {
        let snapshot = vec![boid_at(10.0, 10.0), boid_at(700.0, 500.0)];
        let mut grid = SpatialGrid::new();
        grid.rebuild(&snapshot, 1.0e-8).unwrap();
        assert!(grid.cell_size() >= 700.0 / MAX_CELL_COORD);
        assert_eq!(grid.occupied_cells(), 2);
        assert!(grid.neighbors(&snapshot, &snapshot[0], 1.0e-8, 0).unwrap().is_empty());
    }

    #[test]
    fn grid_handles_negative_coordinates() {
        let snapshot = vec![boid_at(-0.1, -0.1), boid_at(0.1, 0.1), boid_at(-3.0, 4.0)];
        let mut grid = SpatialGrid::with_cell_size(1.0);
        grid.rebuild(&snapshot, 1.0).unwrap();
        let found = grid.neighbors(&snapshot, &snapshot[1], 0.5, 1).unwrap();
        assert_eq!(found, vec![snapshot[0]]);
    }
}
