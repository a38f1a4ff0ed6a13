//! Agent data: per-agent components and their struct-of-arrays storage

pub mod agent;

pub use agent::{
    AgentArchetype, AgentFlags, AgentSpawn, AvoidanceParams, Destination, FormationSlot,
    Locomotion, Selection, SpatialCell,
};
