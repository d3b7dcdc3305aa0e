//! Simulation benchmarks for rtt_core.
//!
//! Run with: `cargo bench -p rtt_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rtt_core::prelude::*;
use rtt_core::scenario::{PlayerSetup, UnitPlacement};

/// Two tank armies ordered to attack each other's first unit.
fn battle() -> Simulation {
    let army = |name: &str, x: i32| PlayerSetup {
        name: name.to_string(),
        unit_cap: None,
        commander: Some((x, 0)),
        units: vec![
            UnitPlacement::new(UnitKind::ShotgunTank, x, 40, 20),
            UnitPlacement::new(UnitKind::ArtilleryTank, x, 80, 10),
            UnitPlacement::new(UnitKind::Turret, x, -40, 5),
        ],
    };
    let scenario = Scenario {
        name: "bench".to_string(),
        description: String::new(),
        players: vec![army("red", -200), army("blue", 200)],
        power_sources: Vec::new(),
        max_ticks: None,
    };
    let Ok(mut sim) = Simulation::from_scenario(&scenario) else {
        panic!("bench scenario is valid");
    };
    for player in [PlayerId(0), PlayerId(1)] {
        let Some(&target) = sim.enemies_of(player).first() else {
            continue;
        };
        let vehicles = sim.player(player).map(|p| p.units.vehicles().to_vec()).unwrap_or_default();
        for id in vehicles {
            let _ = sim.assign_order(player, id, Order::Attack { target });
        }
    }
    sim
}

pub fn simulation_benchmark(c: &mut Criterion) {
    c.bench_function("tick_battle_70_units", |b| {
        b.iter_batched(
            battle,
            |mut sim| {
                for _ in 0..10 {
                    let _ = black_box(sim.tick());
                }
                sim
            },
            BatchSize::SmallInput,
        )
    });

    let sim = battle();
    c.bench_function("state_hash", |b| b.iter(|| black_box(sim.state_hash())));
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
