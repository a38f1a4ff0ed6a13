//! Tick system - orchestrates simulation updates
//!
//! [`Simulation`] owns every piece of singleton state (config, clock, grid,
//! formation settings, world) and hands each phase exactly what it needs.
//! Construction order is config -> clock -> grid -> formation -> world.
//!
//! Per frame ([`Simulation::update`]):
//! restore render transforms -> clock advance -> each due tick -> post-tick
//! sync -> blend (unless paused).
//!
//! Per tick ([`Simulation::run_tick`]):
//! snapshot rotation -> grid rebuild -> formation -> movement -> avoidance.
//! Phases are strictly ordered; inside a phase, per-agent work runs on rayon
//! and the phase returns only when every worker is done.

use std::time::{Duration, Instant};

use crate::core::config::SimulationConfig;
use crate::core::error::Result;
use crate::core::types::Tick;
use crate::ecs::world::World;
use crate::simulation::avoidance::avoidance_system;
use crate::simulation::clock::SimulationClock;
use crate::simulation::formation::{assign_formation_slots, FormationConfig};
use crate::simulation::interpolation::{
    blend_render_transforms, restore_render_transforms, rotate_snapshots, sync_render_transforms,
};
use crate::simulation::movement::movement_system;
use crate::spatial::grid::SpatialGrid;

/// Timings and counters for the most recent tick
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    pub tick: Tick,
    pub snapshot: Duration,
    pub grid_rebuild: Duration,
    pub formation: Duration,
    pub movement: Duration,
    pub avoidance: Duration,
    pub total: Duration,
    pub formation_members: usize,
    pub arrivals: usize,
    pub avoidance_nudges: usize,
    /// Ticks run since construction
    pub ticks_run: u64,
}

/// What happened during one `update`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub ticks_run: u32,
    pub tick_fired: bool,
    pub interpolation_alpha: f32,
    pub current_tick: Tick,
}

/// The simulation core and its injected singletons
pub struct Simulation {
    config: SimulationConfig,
    clock: SimulationClock,
    grid: SpatialGrid,
    pub formation: FormationConfig,
    pub world: World,
    diagnostics: TickDiagnostics,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let clock = SimulationClock::new(&config);
        let grid = SpatialGrid::new(config.grid_cell_size, config.grid_size);
        let formation = FormationConfig::from_config(&config);
        let world = World::new(config.ground_height);

        tracing::info!(
            ticks_per_second = config.ticks_per_second,
            max_ticks_per_frame = config.max_ticks_per_frame,
            grid_size = config.grid_size,
            cell_size = config.grid_cell_size,
            "Simulation core initialized"
        );

        Ok(Self {
            config,
            clock,
            grid,
            formation,
            world,
            diagnostics: TickDiagnostics::default(),
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> &TickDiagnostics {
        &self.diagnostics
    }

    /// Read-only clock view; ticks only advance through `update` and `step_tick`
    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// Grid as of the last tick's rebuild
    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    pub fn resume(&mut self) {
        self.clock.resume();
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.clock.set_paused(paused);
    }

    pub fn set_time_scale(&mut self, scale: f32) -> Result<()> {
        self.clock.set_time_scale(scale)
    }

    /// Advance one render frame of `frame_delta_seconds` wall time
    pub fn update(&mut self, frame_delta_seconds: f64) -> FrameReport {
        let min_chunk = self.config.parallel_threshold;

        restore_render_transforms(&mut self.world.agents, min_chunk);

        let due = self.clock.advance(frame_delta_seconds);
        let mut ticks_run = 0;
        while let Some(tick) = self.clock.consume_tick() {
            self.run_tick(tick);
            ticks_run += 1;
        }
        debug_assert_eq!(due, ticks_run);

        sync_render_transforms(&mut self.world.agents, min_chunk);

        let alpha = self.clock.interpolation_alpha();
        if !self.clock.is_paused() {
            blend_render_transforms(&mut self.world.agents, alpha, min_chunk);
        }

        if ticks_run > 0 {
            tracing::debug!(
                ticks_run,
                alpha,
                tick = self.clock.current_tick(),
                "Frame advanced"
            );
        }

        FrameReport {
            ticks_run,
            tick_fired: self.clock.tick_fired(),
            interpolation_alpha: alpha,
            current_tick: self.clock.current_tick(),
        }
    }

    /// Run exactly one tick regardless of pause state, then sync render
    /// transforms to truth
    pub fn step_tick(&mut self) -> Tick {
        let tick = self.clock.force_tick();
        self.run_tick(tick);
        sync_render_transforms(&mut self.world.agents, self.config.parallel_threshold);
        tick
    }

    /// All phases of one logical tick
    fn run_tick(&mut self, tick: Tick) {
        let min_chunk = self.config.parallel_threshold;
        let ground = self.world.ground_height();
        let dt = self.clock.seconds_per_tick();
        let agents = &mut self.world.agents;

        let tick_start = Instant::now();

        let start = Instant::now();
        rotate_snapshots(agents, min_chunk);
        let snapshot = start.elapsed();

        let start = Instant::now();
        self.grid.rebuild(agents, tick, min_chunk);
        let grid_rebuild = start.elapsed();

        let start = Instant::now();
        let formation_members = assign_formation_slots(agents, &self.formation, ground);
        let formation = start.elapsed();

        let start = Instant::now();
        let arrivals = movement_system(agents, dt, ground, min_chunk);
        let movement = start.elapsed();

        let start = Instant::now();
        let avoidance_nudges = avoidance_system(agents, &self.grid, dt, ground, min_chunk);
        let avoidance = start.elapsed();

        let ticks_run = self.diagnostics.ticks_run + 1;
        self.diagnostics = TickDiagnostics {
            tick,
            snapshot,
            grid_rebuild,
            formation,
            movement,
            avoidance,
            total: tick_start.elapsed(),
            formation_members,
            arrivals,
            avoidance_nudges,
            ticks_run,
        };

        tracing::trace!(
            tick,
            total = ?self.diagnostics.total,
            grid = ?grid_rebuild,
            movement = ?movement,
            avoidance = ?avoidance,
            formation_members,
            arrivals,
            "Tick complete"
        );
    }
}
