//! Agent archetype with SoA layout
//!
//! Every per-agent field lives in its own `Vec`, indexed by `AgentId::index()`.
//! Tick phases borrow only the columns they touch, which lets rayon hand out
//! disjoint mutable slices to workers without locking.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::core::types::{pin_to_ground, AgentId, Tick};

/// Goal-seeking limits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Locomotion {
    /// World units per second
    pub max_speed: f32,
    /// Change in speed per second, applied to both speeding up and slowing down
    pub acceleration: f32,
    /// Radians per second
    pub turn_rate: f32,
}

/// Local avoidance parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AvoidanceParams {
    pub collision_radius: f32,
    pub strength: f32,
    /// Upper bound on the correction magnitude per second
    pub max_force: f32,
}

/// A move order
///
/// `active` is a one-shot trigger: set by a move command, cleared by
/// movement on arrival, never re-armed automatically.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub target: Vec3,
    pub stopping_distance: f32,
    pub active: bool,
}

impl Destination {
    pub fn new(target: Vec3, stopping_distance: f32) -> Self {
        Self {
            target,
            stopping_distance: stopping_distance.max(0.0),
            active: true,
        }
    }
}

/// Place assigned to an agent within a moving group
///
/// Written only by formation assignment. A `world_target` at (near) zero
/// means "no override" to movement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FormationSlot {
    pub local_offset: Vec3,
    pub world_target: Vec3,
    pub slot_index: usize,
}

impl FormationSlot {
    /// Drop any target override so movement falls back to the destination
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Group selection state, written only by the command layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub selected: bool,
    /// Monotonic counter value at the time of selection
    pub order: u64,
}

/// Cached grid bucket, written only by the grid rebuild
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpatialCell {
    pub cell: Option<u32>,
    pub last_update_tick: Tick,
}

/// Per-agent opt-ins fixed at spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentFlags {
    /// Render transform blends between snapshots instead of snapping to truth
    pub interpolated: bool,
    pub avoidance_enabled: bool,
    pub spatially_indexed: bool,
}

/// Construction parameters supplied by scene setup
#[derive(Debug, Clone)]
pub struct AgentSpawn {
    pub position: Vec3,
    /// Heading in radians about +Y; zero faces +Z
    pub yaw: f32,
    pub faction: u16,
    pub locomotion: Locomotion,
    pub avoidance: AvoidanceParams,
    pub flags: AgentFlags,
    pub formation_capable: bool,
}

impl AgentSpawn {
    /// Default infantry-like agent at `position`
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.yaw = yaw;
        self
    }

    pub fn with_faction(mut self, faction: u16) -> Self {
        self.faction = faction;
        self
    }

    pub fn with_locomotion(mut self, max_speed: f32, acceleration: f32, turn_rate: f32) -> Self {
        self.locomotion = Locomotion {
            max_speed,
            acceleration,
            turn_rate,
        };
        self
    }

    pub fn with_avoidance(mut self, collision_radius: f32, strength: f32, max_force: f32) -> Self {
        self.avoidance = AvoidanceParams {
            collision_radius,
            strength,
            max_force,
        };
        self
    }

    pub fn without_avoidance(mut self) -> Self {
        self.flags.avoidance_enabled = false;
        self
    }

    pub fn without_interpolation(mut self) -> Self {
        self.flags.interpolated = false;
        self
    }

    pub fn without_spatial_index(mut self) -> Self {
        self.flags.spatially_indexed = false;
        self
    }

    pub fn without_formation(mut self) -> Self {
        self.formation_capable = false;
        self
    }
}

impl Default for AgentSpawn {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            faction: 0,
            locomotion: Locomotion {
                max_speed: 5.0,
                acceleration: 10.0,
                turn_rate: std::f32::consts::TAU,
            },
            avoidance: AvoidanceParams {
                collision_radius: 0.5,
                strength: 3.0,
                max_force: 5.0,
            },
            flags: AgentFlags {
                interpolated: true,
                avoidance_enabled: true,
                spatially_indexed: true,
            },
            formation_capable: true,
        }
    }
}

/// Structure of Arrays for agents
#[derive(Debug, Clone, Default)]
pub struct AgentArchetype {
    pub ids: Vec<AgentId>,
    pub factions: Vec<u16>,
    /// Simulation truth, mutated only by tick-scoped phases
    pub positions: Vec<Vec3>,
    pub orientations: Vec<Quat>,
    /// Truth as of the start of the latest tick, for interpolation only
    pub previous_positions: Vec<Vec3>,
    pub previous_orientations: Vec<Quat>,
    /// Display-only transform, recomputed every frame
    pub render_positions: Vec<Vec3>,
    pub render_orientations: Vec<Quat>,
    pub velocities: Vec<Vec3>,
    pub locomotion: Vec<Locomotion>,
    pub avoidance: Vec<AvoidanceParams>,
    pub destinations: Vec<Option<Destination>>,
    /// `None` for agents that never take part in formations
    pub formation_slots: Vec<Option<FormationSlot>>,
    pub selections: Vec<Selection>,
    pub spatial_cells: Vec<SpatialCell>,
    pub flags: Vec<AgentFlags>,
    pub alive: Vec<bool>,
}

impl AgentArchetype {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.ids.len()
    }

    pub fn spawn(&mut self, spawn: &AgentSpawn, ground_height: f32) -> AgentId {
        let id = AgentId(self.ids.len() as u32);
        let position = pin_to_ground(spawn.position, ground_height);
        let orientation = Quat::from_rotation_y(spawn.yaw);

        self.ids.push(id);
        self.factions.push(spawn.faction);
        self.positions.push(position);
        self.orientations.push(orientation);
        self.previous_positions.push(position);
        self.previous_orientations.push(orientation);
        self.render_positions.push(position);
        self.render_orientations.push(orientation);
        self.velocities.push(Vec3::ZERO);
        self.locomotion.push(spawn.locomotion);
        self.avoidance.push(spawn.avoidance);
        self.destinations.push(None);
        self.formation_slots
            .push(spawn.formation_capable.then(FormationSlot::default));
        self.selections.push(Selection::default());
        self.spatial_cells.push(SpatialCell::default());
        self.flags.push(spawn.flags);
        self.alive.push(true);
        id
    }

    /// Storage index of a live agent
    pub fn index_of(&self, id: AgentId) -> Option<usize> {
        let idx = id.index();
        (idx < self.ids.len() && self.alive[idx]).then_some(idx)
    }

    pub fn is_alive(&self, id: AgentId) -> bool {
        self.index_of(id).is_some()
    }

    /// Agent's destination if it is currently moving
    pub fn active_destination(&self, id: AgentId) -> Option<&Destination> {
        let idx = self.index_of(id)?;
        self.destinations[idx].as_ref().filter(|d| d.active)
    }
}
