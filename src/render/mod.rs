//! Render export
//!
//! Read-only snapshot of the simulation for the renderer and debug overlays.
//! Positions and orientations are the render-facing (interpolated) transforms,
//! never the authoritative ones. This module never modifies simulation state.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::{AgentId, Tick};
use crate::simulation::tick::Simulation;

/// One live agent as the renderer should draw it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderAgent {
    pub id: AgentId,
    pub faction: u16,
    pub position: Vec3,
    pub orientation: Quat,
    pub selected: bool,
    /// Formation slot target, for debug overlays
    pub formation_target: Option<Vec3>,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub tick: Tick,
    pub interpolation_alpha: f32,
    pub paused: bool,
    pub agents: Vec<RenderAgent>,
}

impl RenderFrame {
    /// Collect live agents in storage order
    pub fn capture(sim: &Simulation) -> Self {
        let agents = &sim.world.agents;
        let render_agents = (0..agents.count())
            .filter(|&i| agents.alive[i])
            .map(|i| RenderAgent {
                id: agents.ids[i],
                faction: agents.factions[i],
                position: agents.render_positions[i],
                orientation: agents.render_orientations[i],
                selected: agents.selections[i].selected,
                formation_target: agents.formation_slots[i]
                    .filter(|_| agents.active_destination(agents.ids[i]).is_some())
                    .map(|slot| slot.world_target),
            })
            .collect();

        Self {
            tick: sim.clock().current_tick(),
            interpolation_alpha: sim.clock().interpolation_alpha(),
            paused: sim.clock().is_paused(),
            agents: render_agents,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::entity::agent::{AgentSpawn, Destination};

    #[test]
    fn test_capture_skips_dead_agents() {
        let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
        let a = sim.world.spawn(AgentSpawn::at(Vec3::ZERO).with_faction(2));
        let b = sim.world.spawn(AgentSpawn::at(Vec3::new(4.0, 0.0, 0.0)));
        sim.world.kill(b).unwrap();
        sim.world.select(a).unwrap();

        let frame = RenderFrame::capture(&sim);
        assert_eq!(frame.agents.len(), 1);
        assert_eq!(frame.agents[0].id, a);
        assert_eq!(frame.agents[0].faction, 2);
        assert!(frame.agents[0].selected);
        assert_eq!(frame.agents[0].formation_target, None);
    }

    #[test]
    fn test_capture_uses_render_transform() {
        let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
        let a = sim.world.spawn(AgentSpawn::at(Vec3::ZERO));
        sim.world.agents.destinations[a.index()] =
            Some(Destination::new(Vec3::new(0.0, 0.0, 30.0), 0.5));
        for _ in 0..5 {
            sim.update(0.05);
        }
        sim.update(0.02);

        let frame = RenderFrame::capture(&sim);
        assert_eq!(frame.tick, 5);
        assert_eq!(frame.agents[0].position, sim.world.agents.render_positions[0]);
        assert_ne!(frame.agents[0].position, sim.world.agents.positions[0]);
    }

    #[test]
    fn test_json_export() {
        let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
        sim.world.spawn(AgentSpawn::at(Vec3::new(1.0, 0.0, 2.0)));
        let json = RenderFrame::capture(&sim).to_json().unwrap();
        let parsed: RenderFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.agents.len(), 1);
        assert!(json.contains("\"paused\": false"));
    }
}
