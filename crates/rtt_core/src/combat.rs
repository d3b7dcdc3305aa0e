//! Hitscan combat.
//!
//! Weapons hit instantly: there are no projectiles. A weapon with zero
//! range is a contact weapon and only fires while its carrier overlaps the
//! target. Cooldowns count down once per tick and a shot resets them to
//! the kind's firing rate.

use serde::{Deserialize, Serialize};

use crate::abilities::{is_colliding, OrderStatus};
use crate::components::EntityId;
use crate::error::{GameError, Result};
use crate::math::Fixed;
use crate::simulation::UnitStorage;
use crate::unit::Unit;

/// Weapon state carried by armed units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Armament {
    cooldown: u32,
}

impl Armament {
    /// Ticks until the weapon can fire again.
    #[must_use]
    pub const fn cooldown(&self) -> u32 {
        self.cooldown
    }

    /// Whether the weapon can fire this tick.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.cooldown == 0
    }

    /// Count down one tick.
    pub fn cool_down(&mut self) {
        self.cooldown = self.cooldown.saturating_sub(1);
    }

    fn reload(&mut self, firing_rate: u32) {
        self.cooldown = firing_rate;
    }
}

/// Result of one shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shot {
    /// Who fired.
    pub attacker: EntityId,
    /// Who was hit.
    pub target: EntityId,
    /// Health removed.
    pub damage: Fixed,
    /// Whether the shot killed the target.
    pub killed: bool,
}

/// Whether `target` is within reach of `attacker`'s weapon.
#[must_use]
pub fn in_weapon_range(attacker: &Unit, target: &Unit) -> bool {
    let Some(weapon) = attacker.metadata().weapon else {
        return false;
    };
    if weapon.range == Fixed::ZERO {
        return is_colliding(attacker, target);
    }
    attacker.position().within(target.position(), weapon.range)
}

/// Closest living enemy within weapon range. Ties go to the enemy listed
/// first.
#[must_use]
pub fn nearest_enemy_in_range(
    storage: &UnitStorage,
    attacker: &Unit,
    enemies: &[EntityId],
) -> Option<EntityId> {
    let mut best: Option<(EntityId, Fixed)> = None;
    for &id in enemies {
        let Some(enemy) = storage.get(id) else {
            continue;
        };
        if enemy.is_dead() || !in_weapon_range(attacker, enemy) {
            continue;
        }
        let distance = attacker.position().distance_squared(enemy.position());
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((id, distance)),
        }
    }
    best.map(|(id, _)| id)
}

/// Count down the unit's weapon cooldown.
pub fn cool_down(storage: &mut UnitStorage, id: EntityId) {
    if let Some(armament) = storage.get_mut(id).and_then(|unit| unit.armament.as_mut()) {
        armament.cool_down();
    }
}

/// Fire at `target` if the weapon is ready and the target is in range.
///
/// Returns `None` when no shot was fired.
pub fn fire(storage: &mut UnitStorage, attacker_id: EntityId, target_id: EntityId) -> Result<Option<Shot>> {
    let attacker = storage
        .get(attacker_id)
        .ok_or(GameError::EntityNotFound(attacker_id))?;
    let metadata = attacker.metadata();
    let (Some(weapon), Some(firing_rate), Some(armament)) =
        (metadata.weapon, metadata.firing_rate, attacker.armament)
    else {
        return Err(GameError::UnexpectedKind {
            entity: attacker_id,
            kind: attacker.kind(),
            context: "fire",
        });
    };
    if attacker.is_dead() || !armament.is_ready() {
        return Ok(None);
    }
    let Some(target) = storage.get(target_id) else {
        return Ok(None);
    };
    if target.is_dead() || !in_weapon_range(attacker, target) {
        return Ok(None);
    }

    if let Some(armament) = storage
        .get_mut(attacker_id)
        .and_then(|unit| unit.armament.as_mut())
    {
        armament.reload(firing_rate);
    }
    let killed = storage
        .get_mut(target_id)
        .is_some_and(|target| target.damage(weapon.damage));
    if killed {
        tracing::debug!(attacker = attacker_id, target = target_id, "Target destroyed");
    }
    Ok(Some(Shot {
        attacker: attacker_id,
        target: target_id,
        damage: weapon.damage,
        killed,
    }))
}

/// Execute an attack order for one tick.
///
/// Complete once the target is gone or dead. In range the attacker stops
/// and fires when ready; otherwise it closes on the target.
pub fn attack(storage: &mut UnitStorage, attacker_id: EntityId, target_id: EntityId) -> Result<OrderStatus> {
    let Some(target) = storage.get(target_id).filter(|target| target.is_alive()) else {
        return Ok(OrderStatus::Complete);
    };
    let destination = target.position();
    let attacker = storage
        .get(attacker_id)
        .ok_or(GameError::EntityNotFound(attacker_id))?;

    if in_weapon_range(attacker, target) {
        if let Some(unit) = storage.get_mut(attacker_id) {
            unit.brake();
        }
        fire(storage, attacker_id, target_id)?;
    } else if let Some(unit) = storage.get_mut(attacker_id) {
        unit.manoeuvre(destination);
    }
    Ok(OrderStatus::Active)
}

/// Fire at the nearest enemy in range if the weapon is still ready.
pub fn fire_at_will(storage: &mut UnitStorage, id: EntityId, enemies: &[EntityId]) -> Result<Option<Shot>> {
    let Some(unit) = storage.get(id) else {
        return Ok(None);
    };
    if !unit.armament.is_some_and(|armament| armament.is_ready()) {
        return Ok(None);
    }
    match nearest_enemy_in_range(storage, unit, enemies) {
        Some(target) => fire(storage, id, target),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::PlayerId;
    use crate::math::Vec2Fixed;
    use crate::unit_kind::UnitKind;

    fn arena() -> UnitStorage {
        UnitStorage::new()
    }

    fn spawn(storage: &mut UnitStorage, kind: UnitKind, x: i32, player: u8) -> EntityId {
        storage.spawn(kind, Vec2Fixed::from_ints(x, 0), Some(PlayerId(player)), true)
    }

    #[test]
    fn test_fire_respects_cooldown() {
        let mut storage = arena();
        let turret = spawn(&mut storage, UnitKind::Turret, 0, 0);
        let titan = spawn(&mut storage, UnitKind::Titan, 100, 1);

        let shot = fire(&mut storage, turret, titan).unwrap().unwrap();
        assert_eq!(shot.damage, Fixed::from_num(7));
        assert!(!shot.killed);
        assert_eq!(storage.get(titan).unwrap().health(), Fixed::from_num(693));
        assert!(fire(&mut storage, turret, titan).unwrap().is_none());

        for _ in 0..5 {
            cool_down(&mut storage, turret);
        }
        assert!(fire(&mut storage, turret, titan).unwrap().is_some());
    }

    #[test]
    fn test_out_of_range_does_not_fire() {
        let mut storage = arena();
        let turret = spawn(&mut storage, UnitKind::Turret, 0, 0);
        let bot = spawn(&mut storage, UnitKind::Bot, 121, 1);
        assert!(fire(&mut storage, turret, bot).unwrap().is_none());
    }

    #[test]
    fn test_contact_weapon_needs_overlap() {
        let mut storage = arena();
        let bot = spawn(&mut storage, UnitKind::Bot, 0, 0);
        let far = spawn(&mut storage, UnitKind::Engineer, 12, 1);
        let near = spawn(&mut storage, UnitKind::Engineer, 11, 1);

        assert!(fire(&mut storage, bot, far).unwrap().is_none());
        assert!(fire(&mut storage, bot, near).unwrap().is_some());
    }

    #[test]
    fn test_unarmed_units_cannot_fire() {
        let mut storage = arena();
        let engineer = spawn(&mut storage, UnitKind::Engineer, 0, 0);
        let bot = spawn(&mut storage, UnitKind::Bot, 1, 1);
        assert!(matches!(
            fire(&mut storage, engineer, bot),
            Err(GameError::UnexpectedKind { .. })
        ));
    }

    #[test]
    fn test_attack_completes_when_target_dies() {
        let mut storage = arena();
        let shotgun = spawn(&mut storage, UnitKind::ShotgunTank, 0, 0);
        let bot = spawn(&mut storage, UnitKind::Bot, 30, 1);

        assert_eq!(attack(&mut storage, shotgun, bot).unwrap(), OrderStatus::Active);
        assert!(storage.get(bot).unwrap().is_dead());
        assert_eq!(attack(&mut storage, shotgun, bot).unwrap(), OrderStatus::Complete);
        assert_eq!(attack(&mut storage, shotgun, 999).unwrap(), OrderStatus::Complete);
    }

    #[test]
    fn test_attack_closes_distance() {
        let mut storage = arena();
        let shotgun = spawn(&mut storage, UnitKind::ShotgunTank, 0, 0);
        let bot = spawn(&mut storage, UnitKind::Bot, 200, 1);

        assert_eq!(attack(&mut storage, shotgun, bot).unwrap(), OrderStatus::Active);
        assert!(storage.get(shotgun).unwrap().velocity() > Fixed::ZERO);
        assert_eq!(storage.get(bot).unwrap().health(), Fixed::from_num(10));
    }

    #[test]
    fn test_nearest_enemy_in_range() {
        let mut storage = arena();
        let turret = spawn(&mut storage, UnitKind::Turret, 0, 0);
        let far = spawn(&mut storage, UnitKind::Bot, 100, 1);
        let near = spawn(&mut storage, UnitKind::Bot, 50, 1);
        let outside = spawn(&mut storage, UnitKind::Bot, 130, 1);

        let unit = storage.get(turret).unwrap();
        assert_eq!(nearest_enemy_in_range(&storage, unit, &[far, near, outside]), Some(near));
        assert_eq!(nearest_enemy_in_range(&storage, unit, &[outside]), None);
    }

    #[test]
    fn test_fire_at_will() {
        let mut storage = arena();
        let turret = spawn(&mut storage, UnitKind::Turret, 0, 0);
        let bot = spawn(&mut storage, UnitKind::Bot, 60, 1);
        let shot = fire_at_will(&mut storage, turret, &[bot]).unwrap().unwrap();
        assert_eq!(shot.target, bot);
        assert!(fire_at_will(&mut storage, turret, &[bot]).unwrap().is_none());
    }
}
