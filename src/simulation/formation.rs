//! Formation slot assignment
//!
//! Each tick, agents that are selected as a group, formation-capable and
//! moving get a slot in a box of `columns_per_row` columns centered on the
//! mean destination, facing from the group's mean position toward it.
//!
//! Members are ordered by selection order, ties broken by agent id, so slot
//! assignment is a pure function of agent state.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::types::{flatten, normalize_or, pin_to_ground};
use crate::entity::agent::{AgentArchetype, FormationSlot};

/// Forward axis used when the group already sits on its destination
pub const DEFAULT_FORWARD: Vec3 = Vec3::Z;
/// Right axis used when `up x forward` degenerates
pub const DEFAULT_RIGHT: Vec3 = Vec3::X;

/// Formation layout
///
/// Only `Box` has a layout of its own; `Line` and `Wedge` are reserved and
/// lay out as `Box`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormationShape {
    #[default]
    Box,
    Line,
    Wedge,
}

/// Singleton formation settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormationConfig {
    pub spacing: f32,
    pub columns_per_row: u32,
    pub shape: FormationShape,
}

impl FormationConfig {
    pub fn from_config(config: &SimulationConfig) -> Self {
        if config.formation_shape != FormationShape::Box {
            tracing::warn!(
                shape = ?config.formation_shape,
                "Formation shape not implemented, using box layout"
            );
        }
        Self {
            spacing: config.formation_spacing,
            columns_per_row: config.formation_columns.max(1),
            shape: config.formation_shape,
        }
    }

    /// Offset of `slot_index` within a formation of `total` members
    ///
    /// `x` runs along the right axis (each row centered), `z` along forward
    /// (rows stack behind the lead row).
    pub fn slot_offset(&self, slot_index: usize, total: usize) -> Vec3 {
        match self.shape {
            FormationShape::Box | FormationShape::Line | FormationShape::Wedge => {
                self.box_offset(slot_index, total)
            }
        }
    }

    fn box_offset(&self, slot_index: usize, total: usize) -> Vec3 {
        let columns = self.columns_per_row.max(1) as usize;
        let row = slot_index / columns;
        let col = slot_index % columns;
        let columns_in_row = columns.min(total.saturating_sub(row * columns)).max(1);

        let offset_x = (col as f32 - (columns_in_row - 1) as f32 / 2.0) * self.spacing;
        let offset_z = -(row as f32) * self.spacing;
        Vec3::new(offset_x, 0.0, offset_z)
    }
}

impl Default for FormationConfig {
    fn default() -> Self {
        Self::from_config(&SimulationConfig::default())
    }
}

/// Group-level frame computed in the aggregate pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormationFrame {
    pub destination_centroid: Vec3,
    pub position_centroid: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
}

/// Storage indices of current formation members, in slot order
pub fn formation_members(agents: &AgentArchetype) -> Vec<usize> {
    let mut members: Vec<usize> = (0..agents.count())
        .filter(|&i| {
            agents.alive[i]
                && agents.formation_slots[i].is_some()
                && agents.selections[i].selected
                && agents.destinations[i].is_some_and(|d| d.active)
        })
        .collect();
    members.sort_by_key(|&i| (agents.selections[i].order, agents.ids[i]));
    members
}

/// Aggregate pass: centroids and facing axes for a non-empty member set
pub fn formation_frame(agents: &AgentArchetype, members: &[usize]) -> Option<FormationFrame> {
    if members.is_empty() {
        return None;
    }
    let n = members.len() as f32;
    let mut destination_sum = Vec3::ZERO;
    let mut position_sum = Vec3::ZERO;
    for &i in members {
        if let Some(dest) = &agents.destinations[i] {
            destination_sum += dest.target;
        }
        position_sum += agents.positions[i];
    }
    let destination_centroid = destination_sum / n;
    let position_centroid = position_sum / n;

    let forward = normalize_or(flatten(destination_centroid - position_centroid), DEFAULT_FORWARD);
    let right = normalize_or(Vec3::Y.cross(forward), DEFAULT_RIGHT);

    Some(FormationFrame {
        destination_centroid,
        position_centroid,
        forward,
        right,
    })
}

/// Assign formation slots for this tick; returns the member count
///
/// With no members this is a no-op and existing slots keep their values.
pub fn assign_formation_slots(
    agents: &mut AgentArchetype,
    config: &FormationConfig,
    ground_height: f32,
) -> usize {
    let members = formation_members(agents);
    let Some(frame) = formation_frame(agents, &members) else {
        return 0;
    };

    let total = members.len();
    for (slot_index, &i) in members.iter().enumerate() {
        let local_offset = config.slot_offset(slot_index, total);
        let world_target = frame.destination_centroid
            + frame.right * local_offset.x
            + frame.forward * local_offset.z;

        if let Some(slot) = agents.formation_slots[i].as_mut() {
            *slot = FormationSlot {
                local_offset,
                world_target: pin_to_ground(world_target, ground_height),
                slot_index,
            };
        }
    }
    total
}
