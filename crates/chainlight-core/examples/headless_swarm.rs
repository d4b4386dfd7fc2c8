//! Headless swarm example: a host loop without rendering.
//!
//! Builds a seeded swarm, stands in for the host's broad phase with an
//! all-pairs radius test, clicks the agent with the most neighbors, and runs
//! until the chain's feedback has travelled back to the origin. Set
//! `RUST_LOG=debug` to see the world's own log output.
//!
//! Run with: `cargo run -p chainlight-core --example headless_swarm`

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use chainlight_core::config::{Region, SwarmConfig};
use chainlight_core::effect::{EffectKind, EffectSink};
use chainlight_core::event::{Event, EventKind};
use chainlight_core::fixed::Fixed64;
use chainlight_core::id::AgentId;
use chainlight_core::math::Vec2;
use chainlight_core::world::World;

const RADIUS: f64 = 3.0;

#[derive(Debug, Default)]
struct Counts {
    lightning: u64,
    feedback: u64,
}

/// Counts particles per effect kind instead of drawing them.
#[derive(Debug, Clone, Default)]
struct ParticleCounter(Rc<RefCell<Counts>>);

impl EffectSink for ParticleCounter {
    fn emit(&mut self, kind: EffectKind, _position: Vec2, count: u32) {
        let mut counts = self.0.borrow_mut();
        match kind {
            EffectKind::Lightning => counts.lightning += count as u64,
            EffectKind::Feedback => counts.feedback += count as u64,
        }
    }
}

/// All-pairs proximity pass: report pairs entering or leaving `RADIUS`.
fn update_proximity(world: &mut World) {
    let positions: Vec<(AgentId, Vec2)> =
        world.agents().map(|(id, a)| (id, a.position)).collect();
    for (i, &(a, pa)) in positions.iter().enumerate() {
        for &(b, pb) in &positions[i + 1..] {
            let near = pa.distance(pb) < RADIUS;
            let linked = world.neighbor_set().contains(a, b);
            let result = if near && !linked {
                world.on_enter_range(a, b)
            } else if !near && linked {
                world.on_exit_range(a, b)
            } else {
                Ok(false)
            };
            if let Err(e) = result {
                log::warn!("proximity update rejected: {e}");
            }
        }
    }
}

fn main() {
    env_logger::init();

    let config = SwarmConfig {
        seed: 2024,
        ..SwarmConfig::with_region(Region::from_center_size(Vec2::ZERO, Vec2::new(24.0, 16.0)))
    };
    let particles = ParticleCounter::default();
    let mut world = match World::builder(config)
        .effect_sink(particles.clone())
        .scatter(80)
        .build()
    {
        Ok(world) => world,
        Err(e) => {
            eprintln!("bad configuration: {e}");
            return;
        }
    };
    update_proximity(&mut world);

    // --- Count every event kind as it is delivered ---

    let counts: Rc<RefCell<BTreeMap<String, usize>>> = Rc::new(RefCell::new(BTreeMap::new()));
    for kind in EventKind::ALL {
        let counts = Rc::clone(&counts);
        world.on_event(
            kind,
            Box::new(move |e: &Event| {
                *counts.borrow_mut().entry(format!("{:?}", e.kind())).or_default() += 1;
            }),
        );
    }

    // --- Click the best-connected agent ---

    let Some(origin) = world
        .agent_ids()
        .iter()
        .copied()
        .max_by_key(|&id| world.neighbors(id).count())
    else {
        return;
    };
    match world.on_clicked(origin) {
        Ok(outcome) => println!("clicked {origin:?}: {outcome:?}"),
        Err(e) => {
            eprintln!("click failed: {e}");
            return;
        }
    }
    if let Some(path) = world.in_flight_path() {
        println!("chain: {:?}", path.nodes().collect::<Vec<_>>());
    }

    // --- Run at 60 frames per second until everything settles ---

    let frame = Fixed64::from_num(1) / Fixed64::from_num(60);
    let mut frames = 0u32;
    while world.is_busy() && frames < 60 * 120 {
        world.advance(frame);
        update_proximity(&mut world);
        frames += 1;
    }

    println!("\n=== After {frames} frames ({} steps) ===", world.tick());
    for (kind, n) in counts.borrow().iter() {
        println!("  {kind:<18} {n}");
    }
    let particles = particles.0.borrow();
    println!("  lightning particles {}", particles.lightning);
    println!("  feedback particles  {}", particles.feedback);
    let lit = world.snapshot_all().iter().filter(|s| s.is_highlighted()).count();
    println!("  highlighted agents  {lit} / {}", world.agent_count());
    println!("  state hash          {:#018x}", world.state_hash());
}
