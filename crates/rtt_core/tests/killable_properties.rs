//! Property tests for health, construction and death.

use proptest::prelude::*;
use rtt_core::abilities::constructable::{build, fabricate};
use rtt_core::prelude::*;
use rtt_test_utils::determinism::strategies::{arb_amount, arb_killable_kind, arb_vec2};

#[derive(Debug, Clone)]
enum Mutation {
    Damage(Fixed),
    Repair(Fixed),
    Build(Fixed),
    Kill,
}

fn arb_mutation() -> impl Strategy<Value = Mutation> {
    prop_oneof![
        4 => arb_amount().prop_map(Mutation::Damage),
        2 => arb_amount().prop_map(Mutation::Repair),
        4 => arb_amount().prop_map(Mutation::Build),
        1 => Just(Mutation::Kill),
    ]
}

fn apply(unit: &mut Unit, mutation: &Mutation) {
    match mutation {
        Mutation::Damage(amount) => {
            unit.damage(*amount);
        }
        Mutation::Repair(amount) => unit.repair(*amount),
        Mutation::Build(amount) => build(unit, *amount),
        Mutation::Kill => unit.kill(),
    }
}

fn orderable(kind: UnitKind, position: Vec2Fixed, built: bool) -> Unit {
    let mut unit = Unit::new(1, kind, position, Some(PlayerId(0)), built);
    if let Some(orders) = unit.orders.as_mut() {
        orders.push(Order::Manoeuvre { destination: Vec2Fixed::ZERO });
    }
    unit
}

proptest! {
    #[test]
    fn dead_units_have_no_health_and_no_orders(
        kind in arb_killable_kind(),
        position in arb_vec2(),
        built in any::<bool>(),
        mutations in prop::collection::vec(arb_mutation(), 0..40),
    ) {
        let mut unit = orderable(kind, position, built);
        for mutation in &mutations {
            apply(&mut unit, mutation);
            let full = unit.metadata().full_health.unwrap_or_default();
            prop_assert!(unit.health() >= Fixed::ZERO);
            prop_assert!(unit.health() <= full);
            if unit.is_dead() {
                prop_assert_eq!(unit.health(), Fixed::ZERO);
                prop_assert!(unit.is_idle());
                prop_assert!(!unit.is_built());
            }
            if unit.is_built() {
                prop_assert!(unit.is_alive());
            }
        }
    }

    #[test]
    fn death_is_permanent(
        kind in arb_killable_kind(),
        mutations in prop::collection::vec(arb_mutation(), 0..40),
    ) {
        let mut unit = orderable(kind, Vec2Fixed::ZERO, true);
        unit.kill();
        for mutation in &mutations {
            apply(&mut unit, mutation);
            prop_assert!(unit.is_dead());
            prop_assert_eq!(unit.health(), Fixed::ZERO);
        }
    }

    #[test]
    fn building_is_monotone_and_saturates(
        kind in arb_killable_kind(),
        amounts in prop::collection::vec(arb_amount(), 1..60),
    ) {
        let mut unit = Unit::new(1, kind, Vec2Fixed::ZERO, Some(PlayerId(0)), false);
        let full = unit.metadata().full_health.unwrap_or_default();
        let mobile = kind.metadata().constructable_by_mobile_units;
        let mut was_built = unit.is_built();
        let mut previous = unit.health();

        for amount in amounts {
            build(&mut unit, amount);
            let health = unit.health();
            if mobile {
                prop_assert!(health >= previous);
                prop_assert!(health <= full);
                // Built flips exactly when full health is first reached.
                prop_assert_eq!(unit.is_built(), was_built || health == full);
            } else {
                prop_assert_eq!(health, Fixed::ZERO);
                prop_assert!(!unit.is_built());
            }
            was_built = unit.is_built();
            previous = health;
        }
    }

    #[test]
    fn fabricate_reaches_full_health_for_every_constructable_kind(
        kind in arb_killable_kind(),
        amount in 1i32..500,
    ) {
        let mut unit = Unit::new(1, kind, Vec2Fixed::ZERO, Some(PlayerId(0)), false);
        let full = unit.metadata().full_health.unwrap_or_default();
        let mut steps = 0;
        while !unit.is_built() {
            fabricate(&mut unit, Fixed::from_num(amount));
            steps += 1;
            prop_assert!(steps <= 10_000);
        }
        prop_assert_eq!(unit.health(), full);
    }
}
