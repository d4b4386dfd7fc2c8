#![no_main]
use chainlight_core::config::SwarmConfig;
use chainlight_core::effect::EffectLog;
use chainlight_core::world::World;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes as a JSON config. Must not panic -- returning Err is
    // fine at every stage.
    let Ok(config) = serde_json::from_slice::<SwarmConfig>(data) else {
        return;
    };
    let Ok(mut world) = World::builder(config)
        .effect_sink(EffectLog::new())
        .scatter(4)
        .build()
    else {
        return;
    };
    let ids = world.agent_ids().to_vec();
    let _ = world.on_enter_range(ids[0], ids[1]);
    let _ = world.on_clicked(ids[0]);
    for _ in 0..8 {
        world.step();
    }
});
