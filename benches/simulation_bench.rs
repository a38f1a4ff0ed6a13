use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use glam::Vec3;

use skirmish_core::core::config::SimulationConfig;
use skirmish_core::core::types::AgentId;
use skirmish_core::entity::agent::{AgentSpawn, Destination};
use skirmish_core::simulation::tick::Simulation;

fn setup(n: usize) -> Simulation {
    let mut sim = Simulation::new(SimulationConfig::default()).expect("default config is valid");
    for i in 0..n {
        let x = (i % 100) as f32 * 2.0 - 100.0;
        let z = (i / 100) as f32 * 2.0 - 100.0;
        let id = sim.world.spawn(AgentSpawn::at(Vec3::new(x, 0.0, z)));
        sim.world.agents.destinations[id.index()] =
            Some(Destination::new(Vec3::new(-x, 0.0, -z), 0.5));
    }
    // Half the agents march as one formation
    for id in (0..n as u32).step_by(2) {
        sim.world.select(AgentId(id)).expect("spawned agent");
    }
    sim
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    for &n in &[1_000usize, 5_000, 20_000] {
        group.bench_with_input(BenchmarkId::new("agents", n), &n, |b, &n| {
            b.iter_batched(
                || setup(n),
                |mut sim| {
                    sim.step_tick();
                    sim
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_frame(c: &mut Criterion) {
    let mut sim = setup(5_000);
    c.bench_function("frame_60hz_5000_agents", |b| {
        b.iter(|| black_box(sim.update(black_box(1.0 / 60.0))))
    });
}

fn bench_grid_query(c: &mut Criterion) {
    let mut sim = setup(20_000);
    sim.step_tick();
    c.bench_function("grid_query_r15", |b| {
        b.iter(|| {
            black_box(sim.grid().query(
                black_box(Vec3::new(10.0, 0.0, 10.0)),
                15.0,
                &sim.world.agents,
            ))
        })
    });
}

criterion_group!(benches, bench_tick, bench_frame, bench_grid_query);
criterion_main!(benches);
