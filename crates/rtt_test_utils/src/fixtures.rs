//! Test fixtures and helpers.
//!
//! Pre-built battlefields and scenario snippets for consistent testing.

use fixed::types::I32F32;
use rtt_core::abilities::Order;
use rtt_core::components::{EntityId, PlayerId};
use rtt_core::math::Vec2Fixed;
use rtt_core::scenario::{PlayerSetup, Scenario, UnitPlacement};
use rtt_core::simulation::{Simulation, TickEvents};
use rtt_core::unit_kind::UnitKind;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a vector from whole-number coordinates.
#[must_use]
pub fn vec2(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_ints(x, y)
}

/// A two-player simulation with no units. Red is player 0, blue player 1.
#[must_use]
pub fn empty_duel(unit_cap: Option<usize>) -> (Simulation, PlayerId, PlayerId) {
    let mut sim = Simulation::new();
    let red = sim.add_player("red", unit_cap).expect("add player");
    let blue = sim.add_player("blue", unit_cap).expect("add player");
    (sim, red, blue)
}

/// A two-player simulation where each side has a commander, 400 apart.
///
/// # Panics
///
/// Panics if the commanders cannot be spawned.
#[must_use]
pub fn commander_duel() -> (Simulation, EntityId, EntityId) {
    let (mut sim, red, blue) = empty_duel(Some(50));
    let red_commander = sim
        .spawn_unit(red, UnitKind::Commander, vec2(-200, 0))
        .expect("spawn red commander");
    let blue_commander = sim
        .spawn_unit(blue, UnitKind::Commander, vec2(200, 0))
        .expect("spawn blue commander");
    (sim, red_commander, blue_commander)
}

/// A scenario with one commander and a few power sources close to it.
#[must_use]
pub fn economy_scenario() -> Scenario {
    Scenario {
        name: "economy".to_string(),
        description: "One builder, nearby power".to_string(),
        players: vec![
            PlayerSetup::commander_at("red", 0, 0, Some(20)),
            PlayerSetup::commander_at("blue", 600, 0, Some(20)),
        ],
        power_sources: vec![(30, 0), (0, 30), (570, 0)],
        max_ticks: Some(2_000),
    }
}

/// Two tank lines facing each other.
#[must_use]
pub fn tank_battle_scenario() -> Scenario {
    let army = |name: &str, x: i32| PlayerSetup {
        name: name.to_string(),
        unit_cap: None,
        commander: None,
        units: vec![
            UnitPlacement::new(UnitKind::ShotgunTank, x, 0, 4),
            UnitPlacement::new(UnitKind::Bot, x, 30, 6),
            UnitPlacement::new(UnitKind::Turret, x, -30, 1),
        ],
    };
    Scenario {
        name: "tank battle".to_string(),
        description: String::new(),
        players: vec![army("red", -120), army("blue", 60)],
        power_sources: Vec::new(),
        max_ticks: Some(3_000),
    }
}

/// Order every vehicle of every player to attack the first enemy target.
pub fn charge(sim: &mut Simulation) {
    let players: Vec<PlayerId> = sim.players().iter().map(|player| player.id).collect();
    for player in players {
        let Some(&target) = sim.enemies_of(player).first() else {
            continue;
        };
        let vehicles = sim
            .player(player)
            .map(|p| p.units.vehicles().to_vec())
            .unwrap_or_default();
        for id in vehicles {
            // Dead or foreign ids are simply skipped.
            let _ = sim.assign_order(player, id, Order::Attack { target });
        }
    }
}

/// Advance `ticks` ticks, collecting the events.
///
/// # Panics
///
/// Panics if a tick fails.
pub fn run_ticks(sim: &mut Simulation, ticks: u64) -> Vec<TickEvents> {
    (0..ticks)
        .map(|_| sim.tick().expect("tick failed"))
        .collect()
}
