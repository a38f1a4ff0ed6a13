//! Skirmish Core - fixed-timestep crowd simulation core
//!
//! Fixed-rate ticks decoupled from the render frame rate, a uniform spatial
//! grid for neighbor queries, local avoidance, goal-seeking movement,
//! formation slot assignment and render-side interpolation.

pub mod command;
pub mod core;
pub mod ecs;
pub mod entity;
pub mod render;
pub mod simulation;
pub mod spatial;
