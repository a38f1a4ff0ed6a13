//! Command execution - applies external commands to the simulation

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::core::types::{pin_to_ground, AgentId};
use crate::entity::agent::Destination;
use crate::simulation::tick::Simulation;

/// An external request against the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "args", rename_all = "snake_case")]
pub enum Command {
    /// Select `agents` in the given order; non-additive replaces the selection
    Select { agents: Vec<AgentId>, additive: bool },
    ClearSelection,
    /// Send every selected agent toward `target` as a formation
    MoveSelected { target: Vec3, stopping_distance: f32 },
    MoveAgent {
        agent: AgentId,
        target: Vec3,
        stopping_distance: f32,
    },
    /// Drop the agent's destination and halt it
    Stop { agent: AgentId },
    Kill { agent: AgentId },
    SetPaused(bool),
    SetTimeScale(f32),
}

/// Result of executing a command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionResult {
    /// Agents whose state the command changed, in application order
    pub affected: Vec<AgentId>,
}

impl ExecutionResult {
    fn of(affected: Vec<AgentId>) -> Self {
        Self { affected }
    }
}

/// Applies commands to a simulation between frames
pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute one command
    ///
    /// Validation happens before any state changes, so a rejected command
    /// leaves the simulation untouched.
    pub fn execute(sim: &mut Simulation, command: Command) -> Result<ExecutionResult> {
        let result = apply(sim, &command);
        if let Err(err) = &result {
            tracing::debug!(?command, error = %err, "Command rejected");
        }
        result
    }
}

fn apply(sim: &mut Simulation, command: &Command) -> Result<ExecutionResult> {
    match command {
        Command::Select { agents, additive } => {
            for &id in agents {
                require_alive(sim, id)?;
            }
            if !additive {
                sim.world.clear_selection();
            }
            for &id in agents {
                sim.world.select(id)?;
            }
            Ok(ExecutionResult::of(agents.clone()))
        }
        Command::ClearSelection => {
            let affected = sim.world.selected_in_order();
            sim.world.clear_selection();
            Ok(ExecutionResult::of(affected))
        }
        Command::MoveSelected {
            target,
            stopping_distance,
        } => {
            validate_move(*target, *stopping_distance)?;
            let selected = sim.world.selected_in_order();
            for &id in &selected {
                assign_destination(sim, id, *target, *stopping_distance)?;
            }
            tracing::debug!(count = selected.len(), ?target, "Move order issued");
            Ok(ExecutionResult::of(selected))
        }
        Command::MoveAgent {
            agent,
            target,
            stopping_distance,
        } => {
            validate_move(*target, *stopping_distance)?;
            require_alive(sim, *agent)?;
            assign_destination(sim, *agent, *target, *stopping_distance)?;
            Ok(ExecutionResult::of(vec![*agent]))
        }
        Command::Stop { agent } => {
            let idx = require_alive(sim, *agent)?;
            let agents = &mut sim.world.agents;
            if let Some(dest) = agents.destinations[idx].as_mut() {
                dest.active = false;
            }
            agents.velocities[idx] = Vec3::ZERO;
            Ok(ExecutionResult::of(vec![*agent]))
        }
        Command::Kill { agent } => {
            sim.world.kill(*agent)?;
            Ok(ExecutionResult::of(vec![*agent]))
        }
        Command::SetPaused(paused) => {
            sim.set_paused(*paused);
            Ok(ExecutionResult::default())
        }
        Command::SetTimeScale(scale) => {
            sim.set_time_scale(*scale)?;
            Ok(ExecutionResult::default())
        }
    }
}

fn require_alive(sim: &Simulation, id: AgentId) -> Result<usize> {
    sim.world.index_of(id).ok_or(SimError::AgentNotFound(id))
}

fn validate_move(target: Vec3, stopping_distance: f32) -> Result<()> {
    if !target.is_finite() {
        return Err(SimError::InvalidCommand(format!(
            "move target must be finite, got {target}"
        )));
    }
    if !(stopping_distance.is_finite() && stopping_distance >= 0.0) {
        return Err(SimError::InvalidCommand(format!(
            "stopping distance must be finite and >= 0, got {stopping_distance}"
        )));
    }
    Ok(())
}

/// Replace the agent's destination and drop any stale formation target
fn assign_destination(
    sim: &mut Simulation,
    id: AgentId,
    target: Vec3,
    stopping_distance: f32,
) -> Result<()> {
    let idx = require_alive(sim, id)?;
    let ground = sim.world.ground_height();
    let agents = &mut sim.world.agents;
    agents.destinations[idx] = Some(Destination::new(
        pin_to_ground(target, ground),
        stopping_distance,
    ));
    if let Some(slot) = agents.formation_slots[idx].as_mut() {
        slot.clear();
    }
    Ok(())
}
