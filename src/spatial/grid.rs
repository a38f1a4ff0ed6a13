//! Fixed-extent spatial hash grid for neighbor queries
//!
//! The grid is a cache rebuilt from agent positions once per tick; agent
//! positions are the only truth. Cell coordinates are centered on the world
//! origin and clamped to the extent, so agents outside it pile into the
//! border cells rather than being lost.

use ahash::AHashMap;
use glam::Vec3;
use rayon::prelude::*;

use crate::core::types::{planar_distance_squared, AgentId, Tick};
use crate::entity::agent::{AgentArchetype, SpatialCell};

/// Sparse buckets over a `grid_size x grid_size` cell partition
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    grid_size: u32,
    cells: AHashMap<u32, Vec<AgentId>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32, grid_size: u32) -> Self {
        Self {
            cell_size,
            grid_size: grid_size.max(1),
            cells: AHashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    /// Unclamped cell coordinate along one axis
    ///
    /// Kept in f64 so positions far outside the extent (or infinite) never
    /// overflow an integer before clamping.
    #[inline]
    fn raw_coord(&self, value: f32) -> f64 {
        (value as f64 / self.cell_size as f64).floor() + (self.grid_size / 2) as f64
    }

    #[inline]
    fn clamp_coord(&self, coord: f64) -> u32 {
        if coord.is_nan() {
            return 0;
        }
        coord.clamp(0.0, (self.grid_size - 1) as f64) as u32
    }

    /// Clamped `(cell_x, cell_z)` for a world position
    #[inline]
    pub fn cell_coords(&self, pos: Vec3) -> (u32, u32) {
        (
            self.clamp_coord(self.raw_coord(pos.x)),
            self.clamp_coord(self.raw_coord(pos.z)),
        )
    }

    #[inline]
    pub fn cell_index(&self, pos: Vec3) -> u32 {
        let (x, z) = self.cell_coords(pos);
        z * self.grid_size + x
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn insert(&mut self, agent: AgentId, pos: Vec3) -> u32 {
        let cell = self.cell_index(pos);
        self.cells.entry(cell).or_default().push(agent);
        cell
    }

    /// Clear and reinsert every live, spatially indexed agent
    ///
    /// Cell indices are computed in parallel and written back to each agent's
    /// cache; buckets are then filled in storage order, so bucket contents
    /// are identical across runs.
    pub fn rebuild(&mut self, agents: &mut AgentArchetype, tick: Tick, min_chunk: usize) {
        self.clear();

        let grid = &*self;
        (
            &mut agents.spatial_cells[..],
            &agents.positions[..],
            &agents.alive[..],
            &agents.flags[..],
        )
            .into_par_iter()
            .with_min_len(min_chunk.max(1))
            .for_each(|(cache, pos, &alive, flags)| {
                *cache = if alive && flags.spatially_indexed {
                    SpatialCell {
                        cell: Some(grid.cell_index(*pos)),
                        last_update_tick: tick,
                    }
                } else {
                    SpatialCell {
                        cell: None,
                        last_update_tick: tick,
                    }
                };
            });

        for (id, cache) in agents.ids.iter().zip(&agents.spatial_cells) {
            if let Some(cell) = cache.cell {
                self.cells.entry(cell).or_default().push(*id);
            }
        }
    }

    /// Agents bucketed in `cell`
    pub fn bucket(&self, cell: u32) -> &[AgentId] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of non-empty buckets
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Inclusive clamped cell range covering `[center - reach, center + reach]`
    fn cell_range(&self, center: Vec3, radius: f32) -> ((u32, u32), (u32, u32)) {
        let reach = (radius.max(0.0) as f64 / self.cell_size as f64).ceil();
        let cx = self.raw_coord(center.x);
        let cz = self.raw_coord(center.z);
        (
            (self.clamp_coord(cx - reach), self.clamp_coord(cx + reach)),
            (self.clamp_coord(cz - reach), self.clamp_coord(cz + reach)),
        )
    }

    /// Every cell that could hold a point within `radius` of `center`
    ///
    /// A square of side `2 * ceil(radius / cell_size) + 1` around the query
    /// cell, clipped to the grid.
    pub fn cells_in_radius(&self, center: Vec3, radius: f32) -> Vec<u32> {
        let ((x0, x1), (z0, z1)) = self.cell_range(center, radius);
        let mut cells = Vec::with_capacity(((x1 - x0 + 1) * (z1 - z0 + 1)) as usize);
        for z in z0..=z1 {
            for x in x0..=x1 {
                cells.push(z * self.grid_size + x);
            }
        }
        cells
    }

    /// Live agents whose planar distance to `center` is `<= radius`
    ///
    /// Candidates come from `cells_in_radius`; dead or unknown ids are
    /// dropped. Results are sorted by id.
    pub fn query(&self, center: Vec3, radius: f32, agents: &AgentArchetype) -> Vec<AgentId> {
        let radius_sq = radius * radius;
        let mut found: Vec<AgentId> = self
            .cells_in_radius(center, radius)
            .into_iter()
            .flat_map(|cell| self.bucket(cell).iter().copied())
            .filter(|&id| {
                agents.index_of(id).is_some_and(|idx| {
                    planar_distance_squared(center, agents.positions[idx]) <= radius_sq
                })
            })
            .collect();
        found.sort_unstable();
        found
    }

    /// Agents in the 3x3 block of cells around `cell`
    pub fn neighborhood(&self, cell: u32) -> impl Iterator<Item = AgentId> + '_ {
        let gs = self.grid_size as i64;
        let cx = (cell % self.grid_size) as i64;
        let cz = (cell / self.grid_size) as i64;

        (-1..=1i64).flat_map(move |dz| {
            (-1..=1i64).flat_map(move |dx| {
                let (x, z) = (cx + dx, cz + dz);
                let bucket = if (0..gs).contains(&x) && (0..gs).contains(&z) {
                    self.bucket((z * gs + x) as u32)
                } else {
                    &[]
                };
                bucket.iter().copied()
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::agent::AgentSpawn;

    fn archetype(points: &[(f32, f32)]) -> AgentArchetype {
        let mut agents = AgentArchetype::new();
        for &(x, z) in points {
            agents.spawn(&AgentSpawn::at(Vec3::new(x, 0.0, z)), 0.0);
        }
        agents
    }

    #[test]
    fn test_cell_index_centered_on_origin() {
        let grid = SpatialGrid::new(10.0, 256);
        assert_eq!(grid.cell_coords(Vec3::ZERO), (128, 128));
        assert_eq!(grid.cell_coords(Vec3::new(-0.1, 0.0, 9.9)), (127, 128));
        assert_eq!(grid.cell_index(Vec3::new(10.0, 0.0, 0.0)), 128 * 256 + 129);
    }

    #[test]
    fn test_out_of_extent_clamps_to_border() {
        let grid = SpatialGrid::new(10.0, 256);
        assert_eq!(grid.cell_coords(Vec3::new(1e9, 0.0, -1e9)), (255, 0));
    }

    #[test]
    fn test_far_off_extent_positions_clamp_to_border() {
        let grid = SpatialGrid::new(10.0, 256);
        assert_eq!(grid.cell_coords(Vec3::new(1e20, 0.0, -1e20)), (255, 0));
        assert_eq!(grid.cell_coords(Vec3::new(f32::MAX, 0.0, f32::MIN)), (255, 0));
        assert_eq!(
            grid.cell_coords(Vec3::new(f32::INFINITY, 0.0, f32::NEG_INFINITY)),
            (255, 0)
        );
    }

    #[test]
    fn test_unbounded_radius_finds_everyone() {
        let mut agents = archetype(&[(0.0, 0.0), (40.0, -30.0), (1e20, 0.0)]);
        let mut grid = SpatialGrid::new(10.0, 256);
        grid.rebuild(&mut agents, 1, 1);

        let everyone = vec![AgentId(0), AgentId(1), AgentId(2)];
        assert_eq!(grid.query(Vec3::ZERO, f32::INFINITY, &agents), everyone);
        assert_eq!(grid.query(Vec3::ZERO, f32::MAX, &agents), everyone);
        assert_eq!(grid.cells_in_radius(Vec3::ZERO, f32::MAX).len(), 256 * 256);
    }

    #[test]
    fn test_off_extent_center_with_huge_radius() {
        let mut agents = archetype(&[(0.0, 0.0), (-500.0, 700.0)]);
        let mut grid = SpatialGrid::new(10.0, 256);
        grid.rebuild(&mut agents, 1, 1);

        let hits = grid.query(Vec3::new(1e20, 0.0, 0.0), f32::MAX, &agents);
        assert_eq!(hits, vec![AgentId(0), AgentId(1)]);
    }

    #[test]
    fn test_rebuild_records_cell_and_tick() {
        let mut agents = archetype(&[(0.0, 0.0), (15.0, 0.0)]);
        let mut grid = SpatialGrid::new(10.0, 256);

        grid.rebuild(&mut agents, 7, 1);

        assert_eq!(agents.spatial_cells[0].cell, Some(grid.cell_index(Vec3::ZERO)));
        assert_eq!(agents.spatial_cells[1].last_update_tick, 7);
        assert_eq!(grid.occupied_cells(), 2);
    }

    #[test]
    fn test_rebuild_skips_dead_and_unindexed() {
        let mut agents = AgentArchetype::new();
        agents.spawn(&AgentSpawn::at(Vec3::ZERO), 0.0);
        agents.spawn(&AgentSpawn::at(Vec3::ZERO).without_spatial_index(), 0.0);
        agents.spawn(&AgentSpawn::at(Vec3::ZERO), 0.0);
        agents.alive[2] = false;

        let mut grid = SpatialGrid::new(10.0, 256);
        grid.rebuild(&mut agents, 1, 1);

        assert_eq!(grid.bucket(grid.cell_index(Vec3::ZERO)), &[AgentId(0)]);
        assert_eq!(agents.spatial_cells[1].cell, None);
        assert_eq!(agents.spatial_cells[2].cell, None);
    }

    #[test]
    fn test_cells_in_radius_square() {
        let grid = SpatialGrid::new(10.0, 256);
        // reach = ceil(15 / 10) = 2 -> 5x5
        assert_eq!(grid.cells_in_radius(Vec3::new(5.0, 0.0, 5.0), 15.0).len(), 25);
        // reach 0 -> the query cell only
        assert_eq!(grid.cells_in_radius(Vec3::ZERO, 0.0), vec![grid.cell_index(Vec3::ZERO)]);
    }

    #[test]
    fn test_cells_in_radius_clipped_at_corner() {
        let grid = SpatialGrid::new(10.0, 4);
        // Corner cell (0, 0): only a 2x2 block of the 3x3 survives
        let cells = grid.cells_in_radius(Vec3::new(-15.0, 0.0, -15.0), 5.0);
        assert_eq!(cells.len(), 4);
    }

    #[test]
    fn test_query_filters_exact_distance() {
        let mut agents = archetype(&[(0.0, 0.0), (3.0, 4.0), (3.0, 4.1), (-9.0, 0.0)]);
        let mut grid = SpatialGrid::new(10.0, 256);
        grid.rebuild(&mut agents, 1, 1);

        let hits = grid.query(Vec3::ZERO, 5.0, &agents);
        assert_eq!(hits, vec![AgentId(0), AgentId(1)]);
    }

    #[test]
    fn test_query_treats_killed_agent_as_absent() {
        let mut agents = archetype(&[(0.0, 0.0), (1.0, 0.0)]);
        let mut grid = SpatialGrid::new(10.0, 256);
        grid.rebuild(&mut agents, 1, 1);

        // Killed after the rebuild, still in its bucket
        agents.alive[1] = false;
        assert_eq!(grid.query(Vec3::ZERO, 5.0, &agents), vec![AgentId(0)]);
    }

    #[test]
    fn test_neighborhood_covers_adjacent_cells() {
        let mut agents = archetype(&[(0.0, 0.0), (12.0, 12.0), (25.0, 0.0)]);
        let mut grid = SpatialGrid::new(10.0, 256);
        grid.rebuild(&mut agents, 1, 1);

        let mut near: Vec<_> = grid.neighborhood(grid.cell_index(Vec3::ZERO)).collect();
        near.sort();
        assert_eq!(near, vec![AgentId(0), AgentId(1)]);
    }

    #[test]
    fn test_neighborhood_at_grid_edge() {
        let mut agents = archetype(&[(-1e6, -1e6)]);
        let mut grid = SpatialGrid::new(10.0, 8);
        grid.rebuild(&mut agents, 1, 1);
        let near: Vec<_> = grid.neighborhood(0).collect();
        assert_eq!(near, vec![AgentId(0)]);
    }
}
