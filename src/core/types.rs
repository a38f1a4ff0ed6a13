//! Core type definitions used throughout the codebase

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Stable agent identifier
///
/// Identities are dense indices into the agent archetype. Agents are never
/// removed from storage (death is a soft delete), so an id stays valid for
/// the lifetime of the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl AgentId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

/// Game tick counter (simulation time unit)
pub type Tick = u64;

/// Squared-length threshold below which a direction is treated as degenerate
pub const DIRECTION_EPSILON: f32 = 1e-6;

/// Zero the vertical component of a vector
#[inline]
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Pin a position to the ground plane
#[inline]
pub fn pin_to_ground(v: Vec3, ground_height: f32) -> Vec3 {
    Vec3::new(v.x, ground_height, v.z)
}

/// Squared planar (x/z) distance between two points
#[inline]
pub fn planar_distance_squared(a: Vec3, b: Vec3) -> f32 {
    flatten(b - a).length_squared()
}

/// Normalize `v`, or return `fallback` when `v` is too short to have a direction
#[inline]
pub fn normalize_or(v: Vec3, fallback: Vec3) -> Vec3 {
    if v.length_squared() > DIRECTION_EPSILON {
        v.normalize()
    } else {
        fallback
    }
}

/// Orientation that faces along a planar direction, rotating about +Y
///
/// The identity orientation faces +Z.
#[inline]
pub fn facing(direction: Vec3) -> Quat {
    Quat::from_rotation_y(direction.x.atan2(direction.z))
}
