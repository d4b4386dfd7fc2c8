#![no_main]
use arbitrary::Arbitrary;
use chainlight_core::test_utils::*;
use libfuzzer_sys::fuzz_target;

/// A structured host operation for fuzzing.
#[derive(Arbitrary, Debug)]
enum FuzzOp {
    Enter { a: u8, b: u8 },
    Exit { a: u8, b: u8 },
    Click { agent: u8 },
    Step,
    Pause,
    Resume,
}

/// Top-level fuzz input: a swarm size, a seed, and a sequence of operations.
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    agents: u8,
    seed: u64,
    ops: Vec<FuzzOp>,
}

fuzz_target!(|input: FuzzInput| {
    let count = (input.agents as usize % 32) + 1;
    let mut world = scattered_world(count, 20.0, 0.0, input.seed);
    let ids = world.agent_ids().to_vec();
    let pick = |i: u8| ids[i as usize % ids.len()];

    // Limit operations to prevent timeouts.
    let max_ops = input.ops.len().min(500);

    for op in &input.ops[..max_ops] {
        match *op {
            FuzzOp::Enter { a, b } => {
                world.on_enter_range(pick(a), pick(b)).unwrap();
            }
            FuzzOp::Exit { a, b } => {
                world.on_exit_range(pick(a), pick(b)).unwrap();
            }
            FuzzOp::Click { agent } => {
                world.on_clicked(pick(agent)).unwrap();
            }
            FuzzOp::Step => {
                world.step();
            }
            FuzzOp::Pause => world.pause(),
            FuzzOp::Resume => world.resume(),
        }
    }
});
