//! ECS World - owns all agents and their selection bookkeeping

use crate::core::error::{Result, SimError};
use crate::core::types::AgentId;
use crate::entity::agent::{AgentArchetype, AgentSpawn, Selection};

/// The game world containing all agents
pub struct World {
    pub agents: AgentArchetype,
    ground_height: f32,
    next_selection_order: u64,
}

impl World {
    pub fn new(ground_height: f32) -> Self {
        Self {
            agents: AgentArchetype::new(),
            ground_height,
            next_selection_order: 0,
        }
    }

    pub fn ground_height(&self) -> f32 {
        self.ground_height
    }

    pub fn spawn(&mut self, spawn: AgentSpawn) -> AgentId {
        self.agents.spawn(&spawn, self.ground_height)
    }

    /// Soft delete: the agent keeps its storage slot and id but drops out
    /// of every query, selection and tick phase.
    pub fn kill(&mut self, id: AgentId) -> Result<()> {
        let idx = self.agents.index_of(id).ok_or(SimError::AgentNotFound(id))?;
        self.agents.alive[idx] = false;
        self.agents.selections[idx] = Selection::default();
        if let Some(dest) = self.agents.destinations[idx].as_mut() {
            dest.active = false;
        }
        self.agents.velocities[idx] = glam::Vec3::ZERO;
        self.agents.spatial_cells[idx].cell = None;
        tracing::debug!(agent = %id, "Agent killed");
        Ok(())
    }

    pub fn index_of(&self, id: AgentId) -> Option<usize> {
        self.agents.index_of(id)
    }

    pub fn agent_count(&self) -> usize {
        self.agents.count()
    }

    pub fn alive_count(&self) -> usize {
        self.agents.alive.iter().filter(|&&a| a).count()
    }

    /// Mark an agent selected; an already-selected agent keeps its order
    pub fn select(&mut self, id: AgentId) -> Result<()> {
        let idx = self.agents.index_of(id).ok_or(SimError::AgentNotFound(id))?;
        let selection = &mut self.agents.selections[idx];
        if !selection.selected {
            selection.selected = true;
            selection.order = self.next_selection_order;
            self.next_selection_order += 1;
        }
        Ok(())
    }

    pub fn deselect(&mut self, id: AgentId) -> Result<()> {
        let idx = self.agents.index_of(id).ok_or(SimError::AgentNotFound(id))?;
        self.agents.selections[idx] = Selection::default();
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        for selection in &mut self.agents.selections {
            *selection = Selection::default();
        }
    }

    /// Live selected agents, ordered by selection order then id
    pub fn selected_in_order(&self) -> Vec<AgentId> {
        let agents = &self.agents;
        let mut selected: Vec<usize> = (0..agents.count())
            .filter(|&i| agents.alive[i] && agents.selections[i].selected)
            .collect();
        selected.sort_by_key(|&i| (agents.selections[i].order, agents.ids[i]));
        selected.into_iter().map(|i| agents.ids[i]).collect()
    }

    /// Iterate live agent ids in storage order
    pub fn alive_agents(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.agents
            .ids
            .iter()
            .zip(&self.agents.alive)
            .filter(|(_, &alive)| alive)
            .map(|(&id, _)| id)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(0.0)
    }
}
