//! Simulation configuration with documented constants
//!
//! All tunable numbers are collected here with explanations of their purpose
//! and how they interact with each other. The config is owned by the
//! [`Simulation`](crate::simulation::tick::Simulation) and handed to each
//! phase explicitly; there is no global instance.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::simulation::formation::FormationShape;

/// Avoidance radius for a pair is `(r_a + r_b) * AVOIDANCE_RADIUS_MULTIPLIER`
///
/// Combined with the largest expected collision radius this must stay below
/// one grid cell, since avoidance only scans the 3x3 cell neighborhood.
pub const AVOIDANCE_RADIUS_MULTIPLIER: f32 = 2.5;

/// Configuration for the simulation core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === CLOCK ===
    /// Logical ticks per second of scaled wall time
    ///
    /// Tick duration is derived as `1 / ticks_per_second`. Every tick-scoped
    /// rate (speed, acceleration, turn rate) is multiplied by it.
    pub ticks_per_second: u32,

    /// Hard cap on ticks executed in one frame
    ///
    /// Owed time beyond this is dropped rather than queued, so a slow frame
    /// cannot trigger unbounded catch-up.
    pub max_ticks_per_frame: u32,

    /// Initial multiplier on wall time fed to the accumulator (> 0)
    pub time_scale: f32,

    // === CALENDAR ===
    /// Ticks in one game hour
    ///
    /// At 20 ticks/sec the default 1200 makes one game hour a real minute.
    pub ticks_per_hour: u64,

    /// Game hours per game day
    pub hours_per_day: u64,

    // === SPATIAL ===
    /// Width of one spatial grid cell (world units)
    ///
    /// Must be at least the largest pairwise avoidance radius, because
    /// avoidance only looks at the 3x3 neighborhood.
    /// Smaller = more cells, fewer agents per bucket
    /// Larger = fewer cells, more candidates to filter per query
    pub grid_cell_size: f32,

    /// Cells per grid side; the grid is centered on the world origin
    ///
    /// Positions beyond the extent clamp into the border cells.
    pub grid_size: u32,

    /// Vertical coordinate every agent is pinned to
    pub ground_height: f32,

    // === FORMATION ===
    /// Distance between neighboring formation slots
    pub formation_spacing: f32,

    /// Slots per formation row
    pub formation_columns: u32,

    /// Formation shape (only `Box` has its own layout)
    pub formation_shape: FormationShape,

    // === PARALLELIZATION ===
    /// Minimum number of agents handed to one rayon task
    ///
    /// Below this, per-agent phases run on a single worker since thread
    /// overhead exceeds the benefit.
    pub parallel_threshold: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: 20,
            max_ticks_per_frame: 4,
            time_scale: 1.0,

            ticks_per_hour: 1200,
            hours_per_day: 24,

            grid_cell_size: 10.0,
            grid_size: 256,
            ground_height: 0.0,

            formation_spacing: 2.5,
            formation_columns: 5,
            formation_shape: FormationShape::Box,

            parallel_threshold: 1000,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document; missing keys take defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(
            path = %path.display(),
            ticks_per_second = config.ticks_per_second,
            grid_size = config.grid_size,
            "Loaded simulation config"
        );
        Ok(config)
    }

    /// Seconds per tick
    pub fn tick_duration(&self) -> f64 {
        1.0 / self.ticks_per_second as f64
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.ticks_per_second == 0 {
            return Err(invalid("ticks_per_second must be positive"));
        }
        if self.max_ticks_per_frame == 0 {
            return Err(invalid("max_ticks_per_frame must be positive"));
        }
        if !(self.time_scale.is_finite() && self.time_scale > 0.0) {
            return Err(invalid(format!(
                "time_scale ({}) must be finite and > 0",
                self.time_scale
            )));
        }
        if self.ticks_per_hour == 0 || self.hours_per_day == 0 {
            return Err(invalid("calendar constants must be positive"));
        }
        if !(self.grid_cell_size.is_finite() && self.grid_cell_size > 0.0) {
            return Err(invalid(format!(
                "grid_cell_size ({}) must be finite and > 0",
                self.grid_cell_size
            )));
        }
        if self.grid_size == 0 {
            return Err(invalid("grid_size must be positive"));
        }
        if !self.ground_height.is_finite() {
            return Err(invalid("ground_height must be finite"));
        }
        if !(self.formation_spacing.is_finite() && self.formation_spacing > 0.0) {
            return Err(invalid(format!(
                "formation_spacing ({}) must be finite and > 0",
                self.formation_spacing
            )));
        }
        if self.formation_columns == 0 {
            return Err(invalid("formation_columns must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> SimError {
    SimError::InvalidConfig(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ticks_per_second, 20);
        assert_eq!(config.max_ticks_per_frame, 4);
        assert_eq!(config.grid_size, 256);
        assert!((config.tick_duration() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SimulationConfig::from_toml_str(
            r#"
            ticks_per_second = 30
            formation_shape = "box"
            "#,
        )
        .unwrap();
        assert_eq!(config.ticks_per_second, 30);
        assert_eq!(config.formation_columns, 5);
        assert_eq!(config.grid_cell_size, 10.0);
    }

    #[test]
    fn test_rejects_zero_tick_rate() {
        let err = SimulationConfig::from_toml_str("ticks_per_second = 0").unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_non_positive_time_scale() {
        let config = SimulationConfig {
            time_scale: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_columns() {
        let config = SimulationConfig {
            formation_columns: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = SimulationConfig::from_toml_str("ticks_per_second = \"fast\"").unwrap_err();
        assert!(matches!(err, SimError::ConfigParse(_)));
    }
}
