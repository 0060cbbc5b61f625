//! Spatial grid partitioning for efficient neighbor queries.
//!
//! This module provides O(1) cell lookup and O(K) neighbor queries where K is the
//! number of entities in the cells overlapping the query square, replacing O(N²)
//! brute-force iteration between fish, feed and floating objects.
//!
//! The grid is rebuilt from scratch at the start of every frame from the
//! previous frame's final positions; there is no incremental update or
//! removal-by-identity.
//!
//! ## Handles
//!
//! The grid stores registry slot indices (positions in
//! [`Pond::entities`]).  They are valid until the registry next inserts or
//! removes an entity, which never happens between the rebuild and the
//! physics/steering phases that query it.
//!
//! ## Cell Size Choice
//!
//! Cell size (`world.grid_cell_size`, default 150) must be chosen relative to
//! the query distance.  The fish sensing query (450) covers a 7×7 cell area;
//! floating-object queries (pad radius + buffer ≤ 142) cover at most 3×3.

use crate::config::PondConfig;
use crate::entity::EntityType;
use crate::pond::Pond;
use bevy::math::Vec2;
use bevy::prelude::*;
use std::collections::HashMap;

/// Resource holding the spatial grid for this frame.
#[derive(Resource, Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    /// Map from cell coordinates to registry slot indices.
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(crate::constants::GRID_CELL_SIZE)
    }
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Changing the cell size discards the current contents.
    pub fn set_cell_size(&mut self, cell_size: f32) {
        if cell_size != self.cell_size {
            self.cell_size = cell_size;
            self.cells.clear();
        }
    }

    /// Compute grid cell coordinates for a world position.
    fn world_to_cell(&self, pos: Vec2) -> (i32, i32) {
        let x = (pos.x / self.cell_size).floor() as i32;
        let y = (pos.y / self.cell_size).floor() as i32;
        (x, y)
    }

    /// Insert a handle at a position. Call after clear() for bulk rebuild.
    pub fn insert(&mut self, handle: usize, pos: Vec2) {
        if !pos.is_finite() {
            return;
        }
        let cell = self.world_to_cell(pos);
        self.cells.entry(cell).or_default().push(handle);
    }

    /// Clear all grid data (call before each frame rebuild)
    pub fn clear(&mut self) {
        // Retain allocations but clear contents to avoid re-allocating Vec capacity
        for v in self.cells.values_mut() {
            v.clear();
        }
        // Remove cells that are now empty to avoid iterating them next frame
        self.cells.retain(|_, v| !v.is_empty());
    }

    /// Number of handles currently stored.
    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.values().all(Vec::is_empty)
    }

    /// Get every handle in cells that intersect the axis-aligned square of
    /// half-width `radius` centred on `origin`.
    ///
    /// Note: results include handles outside the disk; callers must do the
    /// exact distance check themselves (the grid is a conservative
    /// over-approximation, never under-inclusive).
    pub fn query(&self, origin: Vec2, radius: f32) -> Vec<usize> {
        let mut found = Vec::new();
        if !origin.is_finite() || radius.is_nan() || radius < 0.0 {
            return found;
        }
        let (min_col, min_row) = self.world_to_cell(origin - Vec2::splat(radius));
        let (max_col, max_row) = self.world_to_cell(origin + Vec2::splat(radius));

        let span = (max_col as i64 - min_col as i64 + 1) * (max_row as i64 - min_row as i64 + 1);
        if span > self.cells.len() as i64 {
            // Square covers more cells than are occupied: walk the occupied ones.
            for (&(col, row), handles) in &self.cells {
                if (min_col..=max_col).contains(&col) && (min_row..=max_row).contains(&row) {
                    found.extend_from_slice(handles);
                }
            }
            // Map iteration order varies between runs; seeded ponds must not.
            found.sort_unstable();
            return found;
        }

        for col in min_col..=max_col {
            for row in min_row..=max_row {
                if let Some(handles) = self.cells.get(&(col, row)) {
                    found.extend_from_slice(handles);
                }
            }
        }
        found
    }

    /// [`SpatialGrid::query`] without `handle` itself.
    pub fn query_excluding(&self, handle: usize, origin: Vec2, radius: f32) -> Vec<usize> {
        let mut found = self.query(origin, radius);
        found.retain(|&h| h != handle);
        found
    }

    /// Rebuild from the registry.  Fish and feed are bucketed by position,
    /// floating objects by their anchor (`base`), which is what collisions
    /// are resolved on.  Ripples and sparkles are not tracked.
    pub fn rebuild(&mut self, pond: &Pond) {
        self.clear();
        for (index, entity) in pond.entities().iter().enumerate() {
            if !entity.is_well_formed() {
                continue;
            }
            if let Some(body) = entity.floating() {
                if body.base.is_finite() {
                    self.insert(index, body.base);
                }
            } else if matches!(entity.entity_type(), EntityType::Fish | EntityType::Feed) {
                self.insert(index, entity.pos);
            }
        }
    }
}

/// System to rebuild the spatial grid each frame.
/// Must run BEFORE systems that use the grid (floating physics, fish steering).
pub fn rebuild_spatial_grid_system(
    mut grid: ResMut<SpatialGrid>,
    pond: Res<Pond>,
    config: Res<PondConfig>,
) {
    grid.set_cell_size(config.world.grid_cell_size);
    grid.rebuild(&pond);
}
