pub mod calendar;
pub mod config;
pub mod error;
pub mod types;

pub use calendar::{Calendar, TimePeriod};
pub use config::{SimulationConfig, AVOIDANCE_RADIUS_MULTIPLIER};
pub use error::{Result, SimError};
pub use types::{AgentId, Tick};
