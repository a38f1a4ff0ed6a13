//! Render interpolation
//!
//! Each agent carries two truth snapshots (`previous_*` and the authoritative
//! transform) plus a display-only render transform. Per frame:
//!
//! 1. [`restore_render_transforms`] before the accumulator runs
//! 2. [`rotate_snapshots`] once per tick that fires, before any phase moves agents
//! 3. movement and avoidance mutate truth
//! 4. [`sync_render_transforms`] after all due ticks, for every agent
//! 5. [`blend_render_transforms`] every frame unless paused
//!
//! Nothing here writes authoritative state.

use rayon::prelude::*;

use crate::entity::agent::AgentArchetype;

/// Reset interpolated agents' render transform to last known truth
pub fn restore_render_transforms(agents: &mut AgentArchetype, min_chunk: usize) {
    (
        &mut agents.render_positions[..],
        &mut agents.render_orientations[..],
        &agents.positions[..],
        &agents.orientations[..],
        &agents.flags[..],
    )
        .into_par_iter()
        .with_min_len(min_chunk.max(1))
        .for_each(|(render_pos, render_rot, pos, rot, flags)| {
            if flags.interpolated {
                *render_pos = *pos;
                *render_rot = *rot;
            }
        });
}

/// Capture truth before this tick's motion as the left end of the blend
pub fn rotate_snapshots(agents: &mut AgentArchetype, min_chunk: usize) {
    (
        &mut agents.previous_positions[..],
        &mut agents.previous_orientations[..],
        &agents.positions[..],
        &agents.orientations[..],
    )
        .into_par_iter()
        .with_min_len(min_chunk.max(1))
        .for_each(|(prev_pos, prev_rot, pos, rot)| {
            *prev_pos = *pos;
            *prev_rot = *rot;
        });
}

/// Copy truth into every agent's render transform
pub fn sync_render_transforms(agents: &mut AgentArchetype, min_chunk: usize) {
    (
        &mut agents.render_positions[..],
        &mut agents.render_orientations[..],
        &agents.positions[..],
        &agents.orientations[..],
    )
        .into_par_iter()
        .with_min_len(min_chunk.max(1))
        .for_each(|(render_pos, render_rot, pos, rot)| {
            *render_pos = *pos;
            *render_rot = *rot;
        });
}

/// Blend interpolated agents between the previous and current snapshots
pub fn blend_render_transforms(agents: &mut AgentArchetype, alpha: f32, min_chunk: usize) {
    let alpha = alpha.clamp(0.0, 1.0);
    (
        &mut agents.render_positions[..],
        &mut agents.render_orientations[..],
        &agents.previous_positions[..],
        &agents.previous_orientations[..],
        &agents.positions[..],
        &agents.orientations[..],
        &agents.flags[..],
    )
        .into_par_iter()
        .with_min_len(min_chunk.max(1))
        .for_each(|(render_pos, render_rot, prev_pos, prev_rot, pos, rot, flags)| {
            if flags.interpolated {
                *render_pos = prev_pos.lerp(*pos, alpha);
                *render_rot = prev_rot.slerp(*rot, alpha);
            }
        });
}
