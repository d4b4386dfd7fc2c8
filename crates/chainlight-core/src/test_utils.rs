//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::config::{Region, SwarmConfig};
use crate::effect::EffectLog;
use crate::fixed::Fixed64;
use crate::id::AgentId;
use crate::math::Vec2;
use crate::world::World;
use std::cell::RefCell;
use std::rc::Rc;

/// Effect log shared between a world (as its sink) and the test.
pub type SharedLog = Rc<RefCell<EffectLog>>;

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Configuration
// ===========================================================================

/// An 11 x 10 region spanning x in [-0.5, 10.5] and y in [-5, 5].
pub fn region() -> Region {
    Region::from_center_size(Vec2::new(5.0, 0.0), Vec2::new(11.0, 10.0))
}

/// Default tunables over [`region`] with neighbor repulsion switched off,
/// so agents placed with zero velocity stay where they were put.
pub fn still_config() -> SwarmConfig {
    SwarmConfig {
        repulsion_constant: 0.0,
        ..SwarmConfig::with_region(region())
    }
}

/// Default tunables over a square region of side `size` centered on the origin.
pub fn swarm_config(size: f64, seed: u64) -> SwarmConfig {
    SwarmConfig {
        seed,
        ..SwarmConfig::with_region(Region::from_center_size(
            Vec2::ZERO,
            Vec2::new(size, size),
        ))
    }
}

pub fn shared_log() -> SharedLog {
    Rc::new(RefCell::new(EffectLog::new()))
}

// ===========================================================================
// World builders
// ===========================================================================

/// Agents at `(x, 0)` for each `x`, at rest, with no links.
pub fn line_world(xs: &[f64]) -> (World, Vec<AgentId>, SharedLog) {
    let log = shared_log();
    let mut builder = World::builder(still_config()).effect_sink(Rc::clone(&log));
    for &x in xs {
        builder = builder.agent_with_velocity(Vec2::new(x, 0.0), Vec2::ZERO);
    }
    let world = builder.build().unwrap();
    let ids = world.agent_ids().to_vec();
    (world, ids, log)
}

/// Like [`line_world`] but every pair is in range of every other.
pub fn connected_line_world(xs: &[f64]) -> (World, Vec<AgentId>, SharedLog) {
    let (mut world, ids, log) = line_world(xs);
    link_all(&mut world, &ids);
    (world, ids, log)
}

/// Put every pair in `ids` in range.
pub fn link_all(world: &mut World, ids: &[AgentId]) {
    for (i, &a) in ids.iter().enumerate() {
        for &b in &ids[i + 1..] {
            world.on_enter_range(a, b).unwrap();
        }
    }
}

/// `count` agents scattered across a square region of side `size`, linked
/// by [`sync_proximity`] with the given `radius`.
pub fn scattered_world(count: usize, size: f64, radius: f64, seed: u64) -> World {
    let mut world = World::builder(swarm_config(size, seed))
        .effect_sink(EffectLog::new())
        .scatter(count)
        .build()
        .unwrap();
    sync_proximity(&mut world, radius);
    world
}

// ===========================================================================
// Host-side proximity
// ===========================================================================

/// All-pairs proximity check standing in for a host broad phase: links
/// pairs closer than `radius` and unlinks pairs that drifted apart.
pub fn sync_proximity(world: &mut World, radius: f64) {
    let radius_sq = radius * radius;
    let positions: Vec<(AgentId, Vec2)> =
        world.agents().map(|(id, a)| (id, a.position)).collect();
    for (i, &(a, pa)) in positions.iter().enumerate() {
        for &(b, pb) in &positions[i + 1..] {
            let near = (pa - pb).length_squared() < radius_sq;
            let linked = world.neighbor_set().contains(a, b);
            if near && !linked {
                world.on_enter_range(a, b).unwrap();
            } else if !near && linked {
                world.on_exit_range(a, b).unwrap();
            }
        }
    }
}

// ===========================================================================
// Running
// ===========================================================================

pub fn run_steps(world: &mut World, steps: u64) {
    for _ in 0..steps {
        world.step();
    }
}

/// Step until `done` holds, panicking after `max_steps`. Returns the number
/// of steps taken.
pub fn run_until(world: &mut World, max_steps: u64, mut done: impl FnMut(&World) -> bool) -> u64 {
    let mut steps = 0;
    while !done(world) {
        assert!(steps < max_steps, "condition not reached in {max_steps} steps");
        world.step();
        steps += 1;
    }
    steps
}
