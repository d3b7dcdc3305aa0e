//! Reference AI controllers.
//!
//! Controllers only see the battlefield through a [`PlayerFacade`] and only
//! act by replacing the active order of their own units. Both controllers
//! here are deterministic: any randomness comes from a seeded [`AiRng`].

use serde::{Deserialize, Serialize};
use tracing::trace;

use rtt_core::abilities::{ConstructOrder, Order};
use rtt_core::components::EntityId;
use rtt_core::error::Result;
use rtt_core::math::{Fixed, Vec2Fixed};
use rtt_core::player_facade::PlayerFacade;
use rtt_core::unit_kind::{Abilities, UnitKind};

/// Stored energy above which [`AttackNearestAi`] keeps adding factories.
pub const SURPLUS_ENERGY: i32 = 500;

/// How far from a factory a power source may be to get a generator.
pub const POWER_SOURCE_REACH: i32 = 160;

/// How close the commander walks before placing a turret.
pub const TURRET_APPROACH: i32 = 50;

/// Deterministic linear congruential generator.
#[derive(Debug, Clone)]
pub struct AiRng {
    state: u64,
}

impl AiRng {
    /// Create new RNG from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
        }
    }

    /// Get next random value.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(0x5_DEEC_E66D).wrapping_add(11);
        self.state
    }

    /// Roll a percentage in `0..100`.
    pub fn percent(&mut self) -> u64 {
        // The low bits of this LCG cycle quickly.
        (self.next() >> 16) % 100
    }
}

/// Something that plays on behalf of one player.
pub trait Controller: Send {
    /// Short name used in logs and results.
    fn name(&self) -> &'static str;

    /// Look at the battlefield and issue orders for this tick.
    fn act(&mut self, facade: &mut dyn PlayerFacade) -> Result<()>;
}

/// Which controller to run for a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ControllerKind {
    /// [`ExistingAi`].
    #[default]
    Existing,
    /// [`AttackNearestAi`].
    AttackNearest,
}

impl ControllerKind {
    /// Build a controller of this kind.
    pub fn build(self, seed: u64) -> Box<dyn Controller> {
        match self {
            Self::Existing => Box::new(ExistingAi::new(seed)),
            Self::AttackNearest => Box::new(AttackNearestAi::new()),
        }
    }
}

fn is_idle(facade: &dyn PlayerFacade, id: EntityId) -> bool {
    facade.unit(id).is_some_and(|unit| unit.is_idle())
}

fn position_of(facade: &dyn PlayerFacade, id: EntityId) -> Option<Vec2Fixed> {
    facade.unit(id).map(|unit| unit.position())
}

fn is_armed(facade: &dyn PlayerFacade, id: EntityId) -> bool {
    facade
        .unit(id)
        .is_some_and(|unit| unit.kind().has(Abilities::ARMED))
}

/// Builds one factory, then streams a random mix of tanks at the first
/// opponent, spreading attacks over its units in turn.
#[derive(Debug, Clone)]
pub struct ExistingAi {
    rng: AiRng,
    next_target: usize,
}

impl ExistingAi {
    /// Create the controller with a production seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: AiRng::new(seed),
            next_target: 0,
        }
    }

    fn pick_kind(&mut self) -> UnitKind {
        match self.rng.percent() {
            0..=59 => UnitKind::Bot,
            60..=87 => UnitKind::ShotgunTank,
            _ => UnitKind::ArtilleryTank,
        }
    }
}

impl Controller for ExistingAi {
    fn name(&self) -> &'static str {
        "existing"
    }

    fn act(&mut self, facade: &mut dyn PlayerFacade) -> Result<()> {
        let opponents = facade.opponents();
        let Some(&enemy) = opponents.first() else {
            return Ok(());
        };

        if let Some(commander) = facade.units().commander() {
            if facade.units().factories().is_empty() && is_idle(facade, commander) {
                if let Some(position) = position_of(facade, commander) {
                    let order = ConstructOrder::new(UnitKind::Factory, position);
                    facade.assign_order(commander, Order::Construct(order))?;
                }
            }
        }

        if !facade.is_at_unit_cap() {
            let factories = facade.units().factories().to_vec();
            for factory in factories {
                if !is_idle(facade, factory) {
                    continue;
                }
                let Some(position) = position_of(facade, factory) else {
                    continue;
                };
                let kind = self.pick_kind();
                trace!(factory, ?kind, "queueing production");
                facade.assign_order(factory, Order::Construct(ConstructOrder::new(kind, position)))?;
            }
        }

        let targets = facade.opponent_targets(enemy);
        if targets.is_empty() {
            return Ok(());
        }
        let vehicles = facade.units().vehicles().to_vec();
        for vehicle in vehicles {
            if !is_armed(facade, vehicle) || !is_idle(facade, vehicle) {
                continue;
            }
            let target = targets[self.next_target % targets.len()];
            self.next_target = self.next_target.wrapping_add(1);
            facade.assign_order(vehicle, Order::Attack { target })?;
        }
        Ok(())
    }
}

/// Expands its economy around its factories and sends every combat
/// vehicle at the closest enemy.
#[derive(Debug, Clone, Default)]
pub struct AttackNearestAi;

impl AttackNearestAi {
    /// Create the controller.
    pub fn new() -> Self {
        Self
    }

    fn factory_order(facade: &dyn PlayerFacade) -> UnitKind {
        let has_bot = facade
            .units()
            .vehicles()
            .iter()
            .filter_map(|&id| facade.unit(id))
            .any(|unit| unit.kind() == UnitKind::Bot);
        if has_bot {
            UnitKind::ShotgunTank
        } else {
            UnitKind::Bot
        }
    }

    fn commander_order(facade: &dyn PlayerFacade, commander: EntityId) -> Option<Order> {
        let position = position_of(facade, commander)?;
        let factories: Vec<Vec2Fixed> = facade
            .units()
            .factories()
            .iter()
            .filter_map(|&id| position_of(facade, id))
            .collect();

        if factories.is_empty() || facade.stored_energy() > Fixed::from_num(SURPLUS_ENERGY) {
            let order = ConstructOrder::new(UnitKind::Factory, position);
            return Some(Order::Construct(order));
        }

        let reach = Fixed::from_num(POWER_SOURCE_REACH);
        let free_source = facade
            .power_sources()
            .into_iter()
            .filter(|source| source.structure.is_none())
            .filter(|source| factories.iter().any(|f| source.position.within(*f, reach)))
            .min_by_key(|source| (source.position.distance_squared(position), source.id));
        if let Some(source) = free_source {
            let order = ConstructOrder::power_generator(source.id, source.position);
            return Some(Order::Construct(order));
        }

        let nearest_factory = factories
            .iter()
            .copied()
            .min_by_key(|factory| factory.distance_squared(position))?;
        let offset = UnitKind::Factory.metadata().collision_radius
            + UnitKind::Turret.metadata().collision_radius;
        let spot = Vec2Fixed::new(nearest_factory.x + offset, nearest_factory.y);
        if position.within(spot, Fixed::from_num(TURRET_APPROACH)) {
            Some(Order::Construct(ConstructOrder::new(UnitKind::Turret, spot)))
        } else {
            Some(Order::Manoeuvre { destination: spot })
        }
    }
}

impl Controller for AttackNearestAi {
    fn name(&self) -> &'static str {
        "attack_nearest"
    }

    fn act(&mut self, facade: &mut dyn PlayerFacade) -> Result<()> {
        let opponents = facade.opponents();
        if opponents.is_empty() {
            return Ok(());
        }

        let factories = facade.units().factories().to_vec();
        for factory in factories {
            if !is_idle(facade, factory) {
                continue;
            }
            let Some(position) = position_of(facade, factory) else {
                continue;
            };
            let kind = Self::factory_order(facade);
            facade.assign_order(factory, Order::Construct(ConstructOrder::new(kind, position)))?;
        }

        if let Some(commander) = facade.units().commander() {
            if is_idle(facade, commander) {
                if let Some(order) = Self::commander_order(facade, commander) {
                    facade.assign_order(commander, order)?;
                }
            }
        }

        let targets: Vec<(EntityId, Vec2Fixed)> = opponents
            .iter()
            .flat_map(|&opponent| facade.opponent_targets(opponent))
            .filter_map(|id| position_of(facade, id).map(|position| (id, position)))
            .collect();
        if targets.is_empty() {
            return Ok(());
        }

        let vehicles = facade.units().vehicles().to_vec();
        for vehicle in vehicles {
            let Some(unit) = facade.unit(vehicle) else {
                continue;
            };
            if unit.is_constructing() || !unit.kind().has(Abilities::ARMED) {
                continue;
            }
            let position = unit.position();
            let current = unit.current_order().cloned();
            let Some(&(target, _)) = targets
                .iter()
                .min_by_key(|(id, at)| (at.distance_squared(position), *id))
            else {
                continue;
            };
            let order = Order::Attack { target };
            if current.as_ref() != Some(&order) {
                facade.assign_order(vehicle, order)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtt_core::components::PlayerId;
    use rtt_core::simulation::Simulation;

    fn duel() -> (Simulation, PlayerId, PlayerId) {
        let mut sim = Simulation::new();
        let red = sim.add_player("red", None).unwrap();
        let blue = sim.add_player("blue", None).unwrap();
        (sim, red, blue)
    }

    #[test]
    fn test_rng_is_deterministic() {
        let mut a = AiRng::new(7);
        let mut b = AiRng::new(7);
        for _ in 0..100 {
            assert_eq!(a.next(), b.next());
        }
        assert_ne!(AiRng::new(7).next(), AiRng::new(8).next());
    }

    #[test]
    fn test_percent_in_range() {
        let mut rng = AiRng::new(42);
        assert!((0..1000).all(|_| rng.percent() < 100));
    }

    #[test]
    fn test_existing_orders_commander_to_build_factory() {
        let (mut sim, red, blue) = duel();
        let commander = sim
            .spawn_unit(red, UnitKind::Commander, Vec2Fixed::from_ints(-50, 0))
            .unwrap();
        sim.spawn_unit(blue, UnitKind::Commander, Vec2Fixed::from_ints(50, 0))
            .unwrap();

        let mut ai = ExistingAi::new(1);
        ai.act(&mut sim.facade(red)).unwrap();

        let order = sim.unit(commander).unwrap().current_order().cloned();
        assert_eq!(
            order,
            Some(Order::Construct(ConstructOrder::new(
                UnitKind::Factory,
                Vec2Fixed::from_ints(-50, 0)
            )))
        );
    }

    #[test]
    fn test_existing_factories_build_tanks() {
        let (mut sim, red, blue) = duel();
        let factory = sim
            .spawn_unit(red, UnitKind::Factory, Vec2Fixed::from_ints(-50, 0))
            .unwrap();
        sim.spawn_unit(blue, UnitKind::Commander, Vec2Fixed::from_ints(50, 0))
            .unwrap();

        ExistingAi::new(3).act(&mut sim.facade(red)).unwrap();

        match sim.unit(factory).unwrap().current_order() {
            Some(Order::Construct(order)) => assert!(matches!(
                order.kind,
                UnitKind::Bot | UnitKind::ShotgunTank | UnitKind::ArtilleryTank
            )),
            other => panic!("unexpected order {other:?}"),
        }
    }

    #[test]
    fn test_existing_spreads_attacks_round_robin() {
        let (mut sim, red, blue) = duel();
        let bots: Vec<_> = (0..2)
            .map(|i| {
                sim.spawn_unit(red, UnitKind::Bot, Vec2Fixed::from_ints(-50, i * 10))
                    .unwrap()
            })
            .collect();
        let targets: Vec<_> = (0..2)
            .map(|i| {
                sim.spawn_unit(blue, UnitKind::Bot, Vec2Fixed::from_ints(50, i * 10))
                    .unwrap()
            })
            .collect();

        ExistingAi::new(0).act(&mut sim.facade(red)).unwrap();

        let mut attacked: Vec<_> = bots
            .iter()
            .map(|&bot| match sim.unit(bot).unwrap().current_order() {
                Some(Order::Attack { target }) => *target,
                other => panic!("unexpected order {other:?}"),
            })
            .collect();
        attacked.sort_unstable();
        assert_eq!(attacked, targets);
    }

    #[test]
    fn test_attack_nearest_picks_closest_enemy() {
        let (mut sim, red, blue) = duel();
        let tank = sim
            .spawn_unit(red, UnitKind::ShotgunTank, Vec2Fixed::from_ints(0, 0))
            .unwrap();
        sim.spawn_unit(blue, UnitKind::Bot, Vec2Fixed::from_ints(200, 0))
            .unwrap();
        let near = sim
            .spawn_unit(blue, UnitKind::Bot, Vec2Fixed::from_ints(0, 40))
            .unwrap();

        AttackNearestAi::new().act(&mut sim.facade(red)).unwrap();

        assert_eq!(
            sim.unit(tank).unwrap().current_order(),
            Some(&Order::Attack { target: near })
        );
    }

    #[test]
    fn test_attack_nearest_factory_builds_bot_first() {
        let (mut sim, red, blue) = duel();
        let factory = sim
            .spawn_unit(red, UnitKind::Factory, Vec2Fixed::from_ints(-50, 0))
            .unwrap();
        sim.spawn_unit(blue, UnitKind::Bot, Vec2Fixed::from_ints(50, 0))
            .unwrap();

        AttackNearestAi::new().act(&mut sim.facade(red)).unwrap();
        let kind = match sim.unit(factory).unwrap().current_order() {
            Some(Order::Construct(order)) => order.kind,
            other => panic!("unexpected order {other:?}"),
        };
        assert_eq!(kind, UnitKind::Bot);
    }

    #[test]
    fn test_attack_nearest_factory_builds_shotgun_tanks_once_a_bot_exists() {
        let (mut sim, red, blue) = duel();
        let factory = sim
            .spawn_unit(red, UnitKind::Factory, Vec2Fixed::from_ints(-50, 0))
            .unwrap();
        sim.spawn_unit(red, UnitKind::Bot, Vec2Fixed::from_ints(-60, 0))
            .unwrap();
        sim.spawn_unit(blue, UnitKind::Bot, Vec2Fixed::from_ints(50, 0))
            .unwrap();

        AttackNearestAi::new().act(&mut sim.facade(red)).unwrap();
        let kind = match sim.unit(factory).unwrap().current_order() {
            Some(Order::Construct(order)) => order.kind,
            other => panic!("unexpected order {other:?}"),
        };
        assert_eq!(kind, UnitKind::ShotgunTank);
    }

    #[test]
    fn test_attack_nearest_commander_claims_nearby_power_source() {
        let (mut sim, red, blue) = duel();
        let source = sim.spawn_power_source(Vec2Fixed::from_ints(-100, 0));
        sim.spawn_power_source(Vec2Fixed::from_ints(400, 0));
        let commander = sim
            .spawn_unit(red, UnitKind::Commander, Vec2Fixed::from_ints(-200, 0))
            .unwrap();
        sim.spawn_unit(red, UnitKind::Factory, Vec2Fixed::from_ints(-150, 0))
            .unwrap();
        sim.spawn_unit(blue, UnitKind::Commander, Vec2Fixed::from_ints(300, 0))
            .unwrap();

        AttackNearestAi::new().act(&mut sim.facade(red)).unwrap();

        assert_eq!(
            sim.unit(commander).unwrap().current_order(),
            Some(&Order::Construct(ConstructOrder::power_generator(
                source,
                Vec2Fixed::from_ints(-100, 0)
            )))
        );
    }

    #[test]
    fn test_controllers_idle_after_victory() {
        let (mut sim, red, _blue) = duel();
        let commander = sim
            .spawn_unit(red, UnitKind::Commander, Vec2Fixed::ZERO)
            .unwrap();

        ExistingAi::new(0).act(&mut sim.facade(red)).unwrap();
        AttackNearestAi::new().act(&mut sim.facade(red)).unwrap();

        assert!(sim.unit(commander).unwrap().is_idle());
    }
}
