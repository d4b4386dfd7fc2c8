//! Criterion benchmarks for the Chainlight world.
//!
//! Three benchmark groups:
//! - `idle_swarm`: 500 agents drifting with their neighbor links, no chains
//! - `chain_click`: greedy chain construction over a densely linked swarm
//! - `lighting_swarm`: 500 agents with a long chain revealing and feeding back

use criterion::{Criterion, criterion_group, criterion_main};
use chainlight_core::test_utils::*;
use chainlight_core::world::{ClickOutcome, World};

// ===========================================================================
// Swarm builders
// ===========================================================================

/// 500 agents over a 60 x 60 region, linked within a radius of 5.
fn build_swarm() -> World {
    let mut world = scattered_world(500, 60.0, 5.0, 11);

    // Warm up.
    for _ in 0..3 {
        world.step();
    }
    world
}

/// Click the agent with the most neighbors so the chain is as long as the
/// swarm allows.
fn click_busiest(world: &mut World) -> usize {
    let busiest = world
        .agent_ids()
        .iter()
        .copied()
        .max_by_key(|&id| world.neighbors(id).count());
    match busiest {
        Some(id) => match world.on_clicked(id) {
            Ok(ClickOutcome::Started { hops }) => hops,
            _ => 0,
        },
        None => 0,
    }
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_idle_swarm(c: &mut Criterion) {
    let mut group = c.benchmark_group("idle_swarm");
    group.sample_size(50);

    let mut world = build_swarm();

    group.bench_function("500_agents_step", |b| {
        b.iter(|| {
            world.step();
        });
    });

    group.finish();
}

fn bench_chain_click(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain_click");
    group.sample_size(50);

    group.bench_function("500_agents_greedy_chain", |b| {
        b.iter_batched(
            build_swarm,
            |mut world| click_busiest(&mut world),
            criterion::BatchSize::LargeInput,
        );
    });

    group.finish();
}

fn bench_lighting_swarm(c: &mut Criterion) {
    let mut group = c.benchmark_group("lighting_swarm");
    group.sample_size(50);

    let mut world = build_swarm();
    click_busiest(&mut world);

    group.bench_function("500_agents_step_with_chain", |b| {
        b.iter(|| {
            world.step();
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_idle_swarm,
    bench_chain_click,
    bench_lighting_swarm
);
criterion_main!(benches);
