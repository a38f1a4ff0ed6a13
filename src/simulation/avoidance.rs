//! Local avoidance
//!
//! Pairwise separation nudges applied after movement. Positions and radii are
//! copied into a read-only snapshot before the parallel pass, so every worker
//! reads neighbors from the snapshot and writes only its own correction. No
//! agent ever observes a neighbor's in-progress nudge.

use glam::Vec3;
use rayon::prelude::*;

use crate::core::config::AVOIDANCE_RADIUS_MULTIPLIER;
use crate::core::types::{flatten, pin_to_ground, AgentId, DIRECTION_EPSILON};
use crate::entity::agent::{AgentArchetype, AvoidanceParams};
use crate::spatial::grid::SpatialGrid;

/// Pairs closer than this (squared) have no usable direction and are skipped
const OVERLAP_EPSILON: f32 = 1e-6;

/// Read-only per-agent state for one avoidance pass
#[derive(Debug, Clone, Copy)]
pub struct AvoidanceSample {
    pub position: Vec3,
    pub collision_radius: f32,
    pub alive: bool,
}

/// Copy positions and radii before the parallel pass
pub fn snapshot(agents: &AgentArchetype) -> Vec<AvoidanceSample> {
    agents
        .positions
        .iter()
        .zip(&agents.avoidance)
        .zip(&agents.alive)
        .map(|((&position, params), &alive)| AvoidanceSample {
            position,
            collision_radius: params.collision_radius,
            alive,
        })
        .collect()
}

/// Separation direction (unnormalized sum) and neighbor count for one agent
fn accumulate_separation(
    me: AgentId,
    sample: &AvoidanceSample,
    neighbors: impl Iterator<Item = AgentId>,
    samples: &[AvoidanceSample],
) -> (Vec3, u32) {
    let mut sum = Vec3::ZERO;
    let mut count = 0;

    for other_id in neighbors {
        if other_id == me {
            continue;
        }
        let Some(other) = samples.get(other_id.index()).filter(|s| s.alive) else {
            continue;
        };

        let to_other = flatten(other.position - sample.position);
        let distance_sq = to_other.length_squared();
        let avoidance_radius =
            (sample.collision_radius + other.collision_radius) * AVOIDANCE_RADIUS_MULTIPLIER;

        if distance_sq < OVERLAP_EPSILON || distance_sq >= avoidance_radius * avoidance_radius {
            continue;
        }

        let distance = distance_sq.sqrt();
        let away = -to_other / distance;
        let falloff = 1.0 - distance / avoidance_radius;
        sum += away * (falloff * falloff);
        count += 1;
    }

    (sum, count)
}

/// Positional correction for one agent this tick (already scaled by `dt`)
pub fn avoidance_correction(
    me: AgentId,
    params: &AvoidanceParams,
    neighbors: impl Iterator<Item = AgentId>,
    samples: &[AvoidanceSample],
    dt: f32,
) -> Vec3 {
    let Some(sample) = samples.get(me.index()) else {
        return Vec3::ZERO;
    };
    let (sum, count) = accumulate_separation(me, sample, neighbors, samples);
    if count == 0 {
        return Vec3::ZERO;
    }

    let average = sum / count as f32;
    if average.length_squared() < DIRECTION_EPSILON {
        // Neighbors pulling evenly from all sides cancel out
        return Vec3::ZERO;
    }

    let correction = (average.normalize() * params.strength).clamp_length_max(params.max_force.max(0.0));
    correction * dt
}

/// Avoidance phase over all live, avoidance-enabled agents
///
/// Returns how many agents were nudged.
pub fn avoidance_system(
    agents: &mut AgentArchetype,
    grid: &SpatialGrid,
    dt: f32,
    ground_height: f32,
    min_chunk: usize,
) -> usize {
    let samples = snapshot(agents);

    let corrections: Vec<Vec3> = (
        &agents.ids[..],
        &agents.avoidance[..],
        &agents.spatial_cells[..],
        &agents.flags[..],
        &samples[..],
    )
        .into_par_iter()
        .with_min_len(min_chunk.max(1))
        .map(|(&id, params, cache, flags, sample)| {
            if !sample.alive || !flags.avoidance_enabled {
                return Vec3::ZERO;
            }
            let cell = cache.cell.unwrap_or_else(|| grid.cell_index(sample.position));
            avoidance_correction(id, params, grid.neighborhood(cell), &samples, dt)
        })
        .collect();

    agents
        .positions
        .par_iter_mut()
        .zip(corrections.par_iter())
        .with_min_len(min_chunk.max(1))
        .map(|(position, correction)| {
            if *correction == Vec3::ZERO {
                return 0usize;
            }
            *position = pin_to_ground(*position + *correction, ground_height);
            1
        })
        .sum()
}
