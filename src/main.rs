//! Skirmish Core - headless demo
//!
//! Spawns a block of agents, selects them all, orders them to march to a
//! point as a formation and drives the frame loop with jittered frame times.
//! Prints a summary and optionally dumps the final render frame as JSON.

use std::path::PathBuf;

use clap::Parser;
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

use skirmish_core::command::{Command, CommandExecutor};
use skirmish_core::core::config::SimulationConfig;
use skirmish_core::core::error::Result;
use skirmish_core::entity::agent::AgentSpawn;
use skirmish_core::render::RenderFrame;
use skirmish_core::simulation::tick::Simulation;

/// Headless formation march
#[derive(Parser, Debug)]
#[command(name = "skirmish")]
#[command(about = "Run a headless formation march and report where everyone ended up")]
struct Args {
    /// Number of agents to spawn
    #[arg(long, default_value_t = 25)]
    agents: usize,

    /// Simulated wall-clock seconds to run
    #[arg(long, default_value_t = 20.0)]
    seconds: f64,

    /// Nominal render frame rate
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Frame time jitter as a fraction of the nominal frame time
    #[arg(long, default_value_t = 0.25)]
    jitter: f64,

    /// Seed for frame time jitter
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Optional TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the final render frame here as JSON
    #[arg(long)]
    dump: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("skirmish_core=info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    let mut sim = Simulation::new(config)?;

    // Square-ish block, 3 units apart, centered on the origin
    let columns = (args.agents as f32).sqrt().ceil().max(1.0) as usize;
    let half = (columns as f32 - 1.0) * 1.5;
    let ids: Vec<_> = (0..args.agents)
        .map(|i| {
            let x = (i % columns) as f32 * 3.0 - half;
            let z = (i / columns) as f32 * 3.0 - half;
            sim.world.spawn(AgentSpawn::at(Vec3::new(x, 0.0, z)))
        })
        .collect();

    CommandExecutor::execute(
        &mut sim,
        Command::Select {
            agents: ids,
            additive: false,
        },
    )?;
    CommandExecutor::execute(
        &mut sim,
        Command::MoveSelected {
            target: Vec3::new(0.0, 0.0, 60.0),
            stopping_distance: 0.5,
        },
    )?;

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let nominal = 1.0 / args.fps.max(1.0);
    let jitter = args.jitter.clamp(0.0, 0.9);
    let mut elapsed = 0.0;
    let mut frames = 0u64;
    let mut ticks = 0u64;

    while elapsed < args.seconds {
        let dt = nominal * (1.0 + rng.gen_range(-jitter..=jitter));
        let report = sim.update(dt);
        elapsed += dt;
        frames += 1;
        ticks += report.ticks_run as u64;

        if report.tick_fired && report.current_tick % 100 == 0 {
            let moving = sim
                .world
                .alive_agents()
                .filter(|&id| sim.world.agents.active_destination(id).is_some())
                .count();
            tracing::debug!(tick = report.current_tick, moving, "Progress");
        }
    }

    let moving = sim
        .world
        .alive_agents()
        .filter(|&id| sim.world.agents.active_destination(id).is_some())
        .count();

    println!("\n=== SKIRMISH SUMMARY ===");
    println!("Frames:        {}", frames);
    println!("Ticks:         {}", ticks);
    println!("Dropped ticks: {}", sim.clock().dropped_ticks());
    println!("Agents:        {} alive", sim.world.alive_count());
    println!("Still moving:  {}", moving);
    println!(
        "Game time:     day {} hour {} ({:?})",
        sim.clock().game_day(),
        sim.clock().game_hour(),
        sim.clock().time_period()
    );
    println!("Last tick:     {:?}", sim.diagnostics().total);

    if let Some(path) = &args.dump {
        let frame = RenderFrame::capture(&sim);
        std::fs::write(path, frame.to_json()?)?;
        tracing::info!(path = %path.display(), agents = frame.agents.len(), "Render frame written");
    }

    Ok(())
}
