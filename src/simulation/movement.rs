//! Goal-seeking movement
//!
//! Agents with an active destination turn toward their effective target at
//! a capped rate, accelerate toward a speed that tapers near arrival, and
//! stop (clearing the destination) once within stopping distance.

use glam::{Quat, Vec3};
use rayon::prelude::*;

use crate::core::types::{facing, flatten, pin_to_ground, DIRECTION_EPSILON};
use crate::entity::agent::{AgentArchetype, Destination, FormationSlot, Locomotion};

/// Speed tapers linearly once closer than this many stopping distances
pub const SLOWDOWN_FACTOR: f32 = 3.0;

/// Rotations smaller than this (radians) snap straight to the target
const ANGLE_EPSILON: f32 = 1e-4;

/// Arrival tolerance when the stopping distance is zero
const ARRIVAL_EPSILON: f32 = 1e-4;

/// Result of steering one agent for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteerOutcome {
    /// No active destination
    Idle,
    Moving,
    /// Reached stopping distance this tick; destination cleared
    Arrived,
}

/// Formation slot target if it overrides the destination
#[inline]
pub fn effective_target(destination: &Destination, slot: Option<&FormationSlot>) -> Vec3 {
    match slot {
        Some(slot) if slot.world_target.length_squared() > DIRECTION_EPSILON => slot.world_target,
        _ => destination.target,
    }
}

/// Rotate `current` toward `target` by at most `max_angle` radians
pub fn rotate_towards(current: Quat, target: Quat, max_angle: f32) -> Quat {
    let angle = current.angle_between(target);
    if angle < ANGLE_EPSILON {
        return target;
    }
    let t = (max_angle / angle).min(1.0);
    current.slerp(target, t).normalize()
}

/// Move `current` toward `target` by at most `max_delta`
#[inline]
pub fn approach(current: f32, target: f32, max_delta: f32) -> f32 {
    if current < target {
        (current + max_delta).min(target)
    } else {
        (current - max_delta).max(target)
    }
}

/// Desired speed at `distance` from the target
#[inline]
pub fn target_speed(max_speed: f32, distance: f32, stopping_distance: f32) -> f32 {
    let slowdown_radius = SLOWDOWN_FACTOR * stopping_distance;
    if slowdown_radius > 0.0 && distance < slowdown_radius {
        max_speed * (distance / slowdown_radius)
    } else {
        max_speed
    }
}

/// Mutable per-agent state touched by steering
pub struct SteerState<'a> {
    pub position: &'a mut Vec3,
    pub orientation: &'a mut Quat,
    pub velocity: &'a mut Vec3,
    pub destination: &'a mut Option<Destination>,
}

/// Steer one agent for one tick of `dt` seconds
///
/// A step never carries the agent past its target; it lands on it and
/// arrives on the following tick.
pub fn steer(
    state: SteerState<'_>,
    locomotion: &Locomotion,
    slot: Option<&FormationSlot>,
    dt: f32,
    ground_height: f32,
) -> SteerOutcome {
    let Some(destination) = state.destination.as_mut().filter(|d| d.active) else {
        return SteerOutcome::Idle;
    };

    let target = effective_target(destination, slot);
    let to_target = flatten(target - *state.position);
    let distance = to_target.length();

    if distance <= destination.stopping_distance.max(ARRIVAL_EPSILON) {
        *state.velocity = Vec3::ZERO;
        destination.active = false;
        return SteerOutcome::Arrived;
    }

    let direction = to_target / distance;

    *state.orientation = rotate_towards(
        *state.orientation,
        facing(direction),
        locomotion.turn_rate * dt,
    );

    let desired = target_speed(locomotion.max_speed, distance, destination.stopping_distance);
    let speed = approach(state.velocity.length(), desired, locomotion.acceleration * dt);
    *state.velocity = direction * speed;

    let step = (speed * dt).min(distance);
    *state.position = pin_to_ground(*state.position + direction * step, ground_height);
    SteerOutcome::Moving
}

/// Movement phase over all live agents; returns the number that arrived
pub fn movement_system(
    agents: &mut AgentArchetype,
    dt: f32,
    ground_height: f32,
    min_chunk: usize,
) -> usize {
    (
        &mut agents.positions[..],
        &mut agents.orientations[..],
        &mut agents.velocities[..],
        &mut agents.destinations[..],
        &agents.locomotion[..],
        &agents.formation_slots[..],
        &agents.alive[..],
    )
        .into_par_iter()
        .with_min_len(min_chunk.max(1))
        .map(|(position, orientation, velocity, destination, locomotion, slot, &alive)| {
            if !alive {
                return 0;
            }
            let state = SteerState {
                position,
                orientation,
                velocity,
                destination,
            };
            match steer(state, locomotion, slot.as_ref(), dt, ground_height) {
                SteerOutcome::Arrived => 1,
                SteerOutcome::Idle | SteerOutcome::Moving => 0,
            }
        })
        .sum()
}
