pub mod avoidance;
pub mod clock;
pub mod formation;
pub mod interpolation;
pub mod movement;
pub mod tick;

pub use avoidance::avoidance_system;
pub use clock::SimulationClock;
pub use formation::{assign_formation_slots, FormationConfig, FormationShape};
pub use interpolation::{
    blend_render_transforms, restore_render_transforms, rotate_snapshots, sync_render_transforms,
};
pub use movement::movement_system;
pub use tick::{FrameReport, Simulation, TickDiagnostics};
