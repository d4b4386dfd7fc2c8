//! Property-based tests for the Chainlight core.
//!
//! Uses proptest to generate random swarms and input sequences, then verify
//! structural invariants hold.

use chainlight_core::agent::LightState;
use chainlight_core::id::AgentId;
use chainlight_core::world::{ClickOutcome, World};
use chainlight_core::test_utils::*;
use proptest::prelude::*;
use std::collections::HashSet;

// ===========================================================================
// Generators
// ===========================================================================

/// Host input between steps.
#[derive(Debug, Clone)]
enum HostOp {
    Enter(usize, usize),
    Exit(usize, usize),
    Click(usize),
    Step(u8),
}

fn arb_host_ops(max_ops: usize) -> impl Strategy<Value = Vec<HostOp>> {
    proptest::collection::vec(
        prop_oneof![
            (0..64usize, 0..64usize).prop_map(|(a, b)| HostOp::Enter(a, b)),
            (0..64usize, 0..64usize).prop_map(|(a, b)| HostOp::Exit(a, b)),
            (0..64usize).prop_map(HostOp::Click),
            (1..20u8).prop_map(HostOp::Step),
        ],
        1..=max_ops,
    )
}

fn apply(world: &mut World, ids: &[AgentId], op: &HostOp) {
    let pick = |i: usize| ids[i % ids.len()];
    match *op {
        HostOp::Enter(a, b) => {
            world.on_enter_range(pick(a), pick(b)).unwrap();
        }
        HostOp::Exit(a, b) => {
            world.on_exit_range(pick(a), pick(b)).unwrap();
        }
        HostOp::Click(a) => {
            world.on_clicked(pick(a)).unwrap();
        }
        HostOp::Step(n) => run_steps(world, n as u64),
    }
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Neighbor relation stays symmetric and irreflexive under any sequence
    /// of proximity events.
    #[test]
    fn neighbors_symmetric(count in 2..16usize, ops in arb_host_ops(80)) {
        let mut world = scattered_world(count, 20.0, 0.0, 7);
        let ids = world.agent_ids().to_vec();
        for op in &ops {
            apply(&mut world, &ids, op);
        }
        for &a in &ids {
            for b in world.neighbors(a) {
                prop_assert_ne!(a, b);
                prop_assert!(world.neighbors(b).any(|x| x == a),
                    "{:?} lists {:?} but not the reverse", a, b);
            }
        }
    }

    /// Lighting state only ever moves forward: Idle, BeingLit, Lit.
    #[test]
    fn light_state_monotonic(count in 2..24usize, seed in 0..1000u64, ops in arb_host_ops(60)) {
        let mut world = scattered_world(count, 20.0, 6.0, seed);
        let ids = world.agent_ids().to_vec();
        let mut last: Vec<LightState> = ids.iter().map(|&id| world.agent(id).unwrap().state()).collect();
        for op in &ops {
            apply(&mut world, &ids, op);
            for (i, &id) in ids.iter().enumerate() {
                let now = world.agent(id).unwrap().state();
                prop_assert!(now >= last[i], "{:?} went from {:?} to {:?}", id, last[i], now);
                last[i] = now;
            }
        }
    }

    /// Every BeingLit agent belongs to the single in-flight chain.
    #[test]
    fn at_most_one_chain_in_flight(count in 2..24usize, seed in 0..1000u64, ops in arb_host_ops(60)) {
        let mut world = scattered_world(count, 20.0, 6.0, seed);
        let ids = world.agent_ids().to_vec();
        for op in &ops {
            apply(&mut world, &ids, op);
            let being_lit: Vec<AgentId> = ids
                .iter()
                .copied()
                .filter(|&id| world.agent(id).unwrap().is_being_lit())
                .collect();
            match world.in_flight_path() {
                Some(path) => {
                    for id in &being_lit {
                        prop_assert!(path.contains(*id));
                    }
                }
                None => prop_assert!(being_lit.is_empty()),
            }
        }
    }

    /// A fresh chain visits distinct agents, each hop crossing a neighbor
    /// link, and never jumps past a closer idle neighbor.
    #[test]
    fn chain_is_greedy_over_neighbors(count in 2..32usize, seed in 0..1000u64, origin in 0..32usize) {
        let mut world = scattered_world(count, 20.0, 6.0, seed);
        let ids = world.agent_ids().to_vec();
        let origin = ids[origin % ids.len()];

        let outcome = world.on_clicked(origin).unwrap();
        let hops = match outcome {
            ClickOutcome::Started { hops } => hops,
            ClickOutcome::Ignored(reason) => {
                return Err(TestCaseError::fail(format!("fresh world ignored click: {reason:?}")));
            }
        };
        if hops == 0 {
            prop_assert!(world.neighbors(origin).next().is_none());
            return Ok(());
        }

        let path = world.in_flight_path().unwrap().clone();
        prop_assert_eq!(path.len(), hops);
        let nodes: Vec<AgentId> = path.nodes().collect();
        let unique: HashSet<AgentId> = nodes.iter().copied().collect();
        prop_assert_eq!(unique.len(), nodes.len());

        for (i, hop) in path.hops().iter().enumerate() {
            prop_assert!(world.neighbors(hop.from).any(|n| n == hop.to));
            let from_pos = world.agent(hop.from).unwrap().position;
            let chosen = from_pos.distance(world.agent(hop.to).unwrap().position);
            let visited = &nodes[..=i];
            for n in world.neighbors(hop.from) {
                if visited.contains(&n) {
                    continue;
                }
                let d = from_pos.distance(world.agent(n).unwrap().position);
                prop_assert!(d >= chosen, "skipped closer neighbor {:?}", n);
            }
        }
    }

    /// Two worlds built from the same seed and driven by the same inputs
    /// hash identically.
    #[test]
    fn deterministic_simulation(seed in 0..100u64, ops in arb_host_ops(40)) {
        let mut world_a = scattered_world(16, 20.0, 6.0, seed);
        let mut world_b = scattered_world(16, 20.0, 6.0, seed);
        let ids_a = world_a.agent_ids().to_vec();
        let ids_b = world_b.agent_ids().to_vec();
        for op in &ops {
            apply(&mut world_a, &ids_a, op);
            apply(&mut world_b, &ids_b, op);
            prop_assert_eq!(world_a.state_hash(), world_b.state_hash());
        }
    }
}
