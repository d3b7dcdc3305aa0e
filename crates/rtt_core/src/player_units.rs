//! Per-player unit roster.
//!
//! The roster partitions a player's units by role and drives their
//! per-tick update. Every entry is an [`EntityId`] into the
//! [`UnitStorage`]; an id that is no longer in storage is treated as dead.
//!
//! # Update order
//!
//! 1. Reap the dead
//! 2. Update the commander, vehicles and turrets
//! 3. Update factories and collect in-progress constructions
//! 4. Promote finished constructions into their role lists
//! 5. Reap again

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::error::{GameError, Result};
use crate::math::Fixed;
use crate::simulation::UnitStorage;
use crate::systems::{update_builder, update_combat_vehicle, update_turret, update_vehicle};
use crate::unit::Unit;
use crate::unit_kind::{RosterRole, UnitKind};

/// What changed in a roster during one update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterReport {
    /// Constructions moved into a role list.
    pub promoted: Vec<EntityId>,
    /// Units dropped because they died.
    pub reaped: Vec<EntityId>,
}

/// A player's units, partitioned by role.
///
/// An id is in at most one of `constructions` and its role list.
/// Engineers are listed both in `vehicles` and in `engineers`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerUnits {
    unit_cap: Option<usize>,
    commander: Option<EntityId>,
    vehicles: Vec<EntityId>,
    engineers: Vec<EntityId>,
    factories: Vec<EntityId>,
    power_generators: Vec<EntityId>,
    turrets: Vec<EntityId>,
    constructions: BTreeSet<EntityId>,
}

fn is_alive(storage: &UnitStorage, id: EntityId) -> bool {
    storage.get(id).is_some_and(Unit::is_alive)
}

impl PlayerUnits {
    /// Create an empty roster. `None` means no unit cap.
    #[must_use]
    pub fn new(unit_cap: Option<usize>) -> Self {
        Self {
            unit_cap,
            ..Self::default()
        }
    }

    /// The unit cap, if any.
    #[must_use]
    pub const fn unit_cap(&self) -> Option<usize> {
        self.unit_cap
    }

    /// The commander, while alive.
    #[must_use]
    pub const fn commander(&self) -> Option<EntityId> {
        self.commander
    }

    /// Mobile units, engineers included.
    #[must_use]
    pub fn vehicles(&self) -> &[EntityId] {
        &self.vehicles
    }

    /// Engineers.
    #[must_use]
    pub fn engineers(&self) -> &[EntityId] {
        &self.engineers
    }

    /// Factories.
    #[must_use]
    pub fn factories(&self) -> &[EntityId] {
        &self.factories
    }

    /// Power generators.
    #[must_use]
    pub fn power_generators(&self) -> &[EntityId] {
        &self.power_generators
    }

    /// Turrets.
    #[must_use]
    pub fn turrets(&self) -> &[EntityId] {
        &self.turrets
    }

    /// Units under construction, or built but parked by the unit cap.
    #[must_use]
    pub const fn constructions(&self) -> &BTreeSet<EntityId> {
        &self.constructions
    }

    /// Vehicles of one kind.
    pub fn vehicles_of_kind<'a>(
        &'a self,
        storage: &'a UnitStorage,
        kind: UnitKind,
    ) -> impl Iterator<Item = EntityId> + 'a {
        self.vehicles
            .iter()
            .copied()
            .filter(move |&id| storage.get(id).is_some_and(|unit| unit.kind() == kind))
    }

    /// Total units, constructions included.
    #[must_use]
    pub fn unit_count(&self) -> usize {
        usize::from(self.commander.is_some())
            + self.vehicles.len()
            + self.factories.len()
            + self.power_generators.len()
            + self.turrets.len()
            + self.constructions.len()
    }

    /// Whether the roster has reached its unit cap.
    #[must_use]
    pub fn is_at_unit_cap(&self) -> bool {
        self.unit_cap.is_some_and(|cap| self.unit_count() >= cap)
    }

    /// Whether `id` is anywhere in the roster.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.commander == Some(id)
            || self.vehicles.contains(&id)
            || self.factories.contains(&id)
            || self.power_generators.contains(&id)
            || self.turrets.contains(&id)
            || self.constructions.contains(&id)
    }

    /// Energy produced per tick by the commander and power generators.
    #[must_use]
    pub fn energy_output(&self, storage: &UnitStorage) -> Fixed {
        self.commander
            .iter()
            .chain(&self.power_generators)
            .filter_map(|&id| storage.get(id))
            .map(Unit::energy_output)
            .fold(Fixed::ZERO, |total, output| total + output)
    }

    /// Everything an opponent can shoot at.
    #[must_use]
    pub fn all_killable_collidable_units(&self) -> Vec<EntityId> {
        let mut units = Vec::with_capacity(self.unit_count());
        units.extend(&self.vehicles);
        units.extend(&self.factories);
        units.extend(&self.power_generators);
        units.extend(&self.turrets);
        units.extend(&self.constructions);
        units.extend(self.commander);
        units
    }

    /// Place an already-built unit straight into its role list.
    ///
    /// Used when setting up a scenario; commanders take the commander
    /// slot.
    pub fn enroll(&mut self, storage: &UnitStorage, id: EntityId) -> Result<()> {
        let unit = storage.get(id).ok_or(GameError::EntityNotFound(id))?;
        match unit.kind() {
            UnitKind::Commander => {
                if let Some(existing) = self.commander.filter(|&existing| existing != id) {
                    return Err(GameError::InvalidState(format!(
                        "roster already has commander {existing}"
                    )));
                }
                self.commander = Some(id);
                Ok(())
            }
            kind => self.place(id, kind),
        }
    }

    fn place(&mut self, id: EntityId, kind: UnitKind) -> Result<()> {
        match kind.role() {
            Some(RosterRole::Vehicle) => self.vehicles.push(id),
            Some(RosterRole::Engineer) => {
                self.vehicles.push(id);
                self.engineers.push(id);
            }
            Some(RosterRole::Factory) => self.factories.push(id),
            Some(RosterRole::PowerGenerator) => {
                // Several builders can finish the same generator.
                if !self.power_generators.contains(&id) {
                    self.power_generators.push(id);
                }
            }
            Some(RosterRole::Turret) => self.turrets.push(id),
            None => return Err(GameError::InvalidPromotion { entity: id, kind }),
        }
        Ok(())
    }

    /// Advance every unit in the roster by one tick.
    ///
    /// Failures of a single unit are logged and do not stop the update.
    /// An invalid promotion aborts it.
    pub fn update(&mut self, storage: &mut UnitStorage, enemies: &[EntityId]) -> Result<RosterReport> {
        let mut report = RosterReport::default();
        self.reap(storage, &mut report);

        if let Some(commander) = self.commander {
            contain(commander, update_builder(storage, commander))?;
        }
        // Power generators have no per-tick behaviour of their own.
        for &id in &self.vehicles {
            let Some(kind) = storage.get(id).map(Unit::kind) else {
                continue;
            };
            let result = match kind {
                UnitKind::Bot => update_vehicle(storage, id),
                UnitKind::Engineer => update_builder(storage, id),
                UnitKind::ShotgunTank | UnitKind::ArtilleryTank | UnitKind::Titan => {
                    update_combat_vehicle(storage, id, enemies)
                }
                UnitKind::Commander
                | UnitKind::Factory
                | UnitKind::PowerGenerator
                | UnitKind::PowerSource
                | UnitKind::Turret => Err(GameError::UnexpectedKind {
                    entity: id,
                    kind,
                    context: "vehicle update",
                }),
            };
            contain(id, result)?;
        }
        for &id in &self.turrets {
            contain(id, update_turret(storage, id, enemies))?;
        }

        self.update_factories_and_constructions(storage, &mut report)?;
        self.reap(storage, &mut report);

        #[cfg(feature = "debug-validation")]
        self.validate()?;

        Ok(report)
    }

    fn update_factories_and_constructions(
        &mut self,
        storage: &mut UnitStorage,
        report: &mut RosterReport,
    ) -> Result<()> {
        for &id in &self.factories {
            contain(id, update_builder(storage, id))?;
        }
        let builders = self
            .factories
            .iter()
            .chain(&self.commander)
            .chain(&self.engineers);
        for &id in builders {
            if let Some(construction) = storage.get(id).and_then(Unit::construction) {
                self.constructions.insert(construction);
            }
        }

        let entries: Vec<EntityId> = self.constructions.iter().copied().collect();
        for id in entries {
            let Some(unit) = storage.get(id).filter(|unit| unit.is_alive()) else {
                self.constructions.remove(&id);
                report.reaped.push(id);
                continue;
            };
            // Entries dropped above may have freed room under the cap.
            if !unit.is_built() || self.is_at_unit_cap() {
                continue;
            }
            let kind = unit.kind();
            self.place(id, kind)?;
            self.constructions.remove(&id);
            report.promoted.push(id);
            tracing::debug!(unit = id, %kind, "Construction promoted");
        }
        Ok(())
    }

    /// Drop dead and missing units from every role list.
    pub fn reap(&mut self, storage: &UnitStorage, report: &mut RosterReport) {
        if let Some(commander) = self.commander {
            if !is_alive(storage, commander) {
                self.commander = None;
                report.reaped.push(commander);
            }
        }
        for list in [
            &mut self.power_generators,
            &mut self.factories,
            &mut self.vehicles,
            &mut self.turrets,
        ] {
            list.retain(|&id| {
                let alive = is_alive(storage, id);
                if !alive {
                    report.reaped.push(id);
                }
                alive
            });
        }
        self.engineers.retain(|&id| is_alive(storage, id));
    }

    /// Check the roster's structural invariants.
    pub fn validate(&self) -> Result<()> {
        let lists = [
            &self.vehicles,
            &self.factories,
            &self.power_generators,
            &self.turrets,
        ];
        let mut seen = BTreeSet::new();
        for &id in lists.into_iter().flatten().chain(&self.commander) {
            if !seen.insert(id) {
                return Err(GameError::InvalidState(format!("unit {id} listed twice")));
            }
            if self.constructions.contains(&id) {
                return Err(GameError::InvalidState(format!(
                    "unit {id} is both promoted and under construction"
                )));
            }
        }
        if let Some(id) = self.engineers.iter().find(|id| !self.vehicles.contains(id)) {
            return Err(GameError::InvalidState(format!(
                "engineer {id} missing from vehicles"
            )));
        }
        Ok(())
    }
}

/// Log a per-unit failure and carry on, unless it is fatal.
fn contain(id: EntityId, result: Result<()>) -> Result<()> {
    match result {
        Err(err) if err.is_fatal() => Err(err),
        Err(err) => {
            tracing::warn!(unit = id, error = %err, "Unit update failed");
            Ok(())
        }
        Ok(()) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::{BuildState, ConstructOrder, Order};
    use crate::components::PlayerId;
    use crate::math::Vec2Fixed;

    const PLAYER: PlayerId = PlayerId(0);

    fn spawn(storage: &mut UnitStorage, kind: UnitKind, built: bool) -> EntityId {
        storage.spawn(kind, Vec2Fixed::ZERO, Some(PLAYER), built)
    }

    fn finish(storage: &mut UnitStorage, id: EntityId) {
        let unit = storage.get_mut(id).unwrap();
        let full = unit.metadata().full_health.unwrap();
        unit.repair(full);
        unit.build_state = Some(BuildState { built: true });
    }

    #[test]
    fn test_enroll_routes_by_role() {
        let mut storage = UnitStorage::new();
        let mut roster = PlayerUnits::new(None);
        let commander = spawn(&mut storage, UnitKind::Commander, true);
        let engineer = spawn(&mut storage, UnitKind::Engineer, true);
        let factory = spawn(&mut storage, UnitKind::Factory, true);
        for id in [commander, engineer, factory] {
            roster.enroll(&storage, id).unwrap();
        }

        assert_eq!(roster.commander(), Some(commander));
        assert_eq!(roster.vehicles(), &[engineer]);
        assert_eq!(roster.engineers(), &[engineer]);
        assert_eq!(roster.factories(), &[factory]);
        assert_eq!(roster.unit_count(), 3);
        roster.validate().unwrap();

        let other = spawn(&mut storage, UnitKind::Commander, true);
        assert!(roster.enroll(&storage, other).is_err());
    }

    #[test]
    fn test_power_sources_cannot_be_enrolled() {
        let mut storage = UnitStorage::new();
        let mut roster = PlayerUnits::new(None);
        let source = storage.spawn(UnitKind::PowerSource, Vec2Fixed::ZERO, None, true);
        assert!(matches!(
            roster.enroll(&storage, source),
            Err(GameError::InvalidPromotion { .. })
        ));
    }

    #[test]
    fn test_promotes_finished_construction() {
        let mut storage = UnitStorage::new();
        let mut roster = PlayerUnits::new(None);
        let commander = spawn(&mut storage, UnitKind::Commander, true);
        roster.enroll(&storage, commander).unwrap();
        storage
            .get_mut(commander)
            .unwrap()
            .orders
            .as_mut()
            .unwrap()
            .set_current(Order::Construct(ConstructOrder::new(UnitKind::Turret, Vec2Fixed::ZERO)));

        roster.update(&mut storage, &[]).unwrap();
        let turret = storage.get(commander).unwrap().construction().unwrap();
        assert!(roster.constructions().contains(&turret));
        assert_eq!(roster.unit_count(), 2);

        finish(&mut storage, turret);
        let report = roster.update(&mut storage, &[]).unwrap();
        assert_eq!(report.promoted, vec![turret]);
        assert_eq!(roster.turrets(), &[turret]);
        assert!(roster.constructions().is_empty());
        roster.validate().unwrap();
    }

    #[test]
    fn test_dead_construction_frees_room_for_promotion() {
        let mut storage = UnitStorage::new();
        let mut roster = PlayerUnits::new(Some(3));
        let factory = spawn(&mut storage, UnitKind::Factory, true);
        roster.enroll(&storage, factory).unwrap();
        let wreck = spawn(&mut storage, UnitKind::Bot, false);
        let bot = spawn(&mut storage, UnitKind::Bot, false);
        roster.constructions.extend([wreck, bot]);
        storage.get_mut(wreck).unwrap().kill();
        finish(&mut storage, bot);
        assert!(roster.is_at_unit_cap());

        let report = roster.update(&mut storage, &[]).unwrap();
        assert_eq!(report.promoted, vec![bot]);
        assert!(report.reaped.contains(&wreck));
        assert_eq!(roster.vehicles(), &[bot]);
        assert!(roster.constructions().is_empty());
        roster.validate().unwrap();
    }

    #[test]
    fn test_dead_units_are_reaped() {
        let mut storage = UnitStorage::new();
        let mut roster = PlayerUnits::new(None);
        let engineer = spawn(&mut storage, UnitKind::Engineer, true);
        roster.enroll(&storage, engineer).unwrap();

        storage.get_mut(engineer).unwrap().damage(Fixed::from_num(16));
        let report = roster.update(&mut storage, &[]).unwrap();
        assert_eq!(report.reaped, vec![engineer]);
        assert!(roster.vehicles().is_empty());
        assert!(roster.engineers().is_empty());
        assert_eq!(roster.unit_count(), 0);
    }

    #[test]
    fn test_missing_units_count_as_dead() {
        let mut storage = UnitStorage::new();
        let mut roster = PlayerUnits::new(None);
        let factory = spawn(&mut storage, UnitKind::Factory, true);
        roster.enroll(&storage, factory).unwrap();
        storage.remove(factory);

        roster.update(&mut storage, &[]).unwrap();
        assert!(roster.factories().is_empty());
    }

    #[test]
    fn test_commander_promotion_is_fatal() {
        let mut storage = UnitStorage::new();
        let mut roster = PlayerUnits::new(None);
        let factory = spawn(&mut storage, UnitKind::Factory, true);
        roster.enroll(&storage, factory).unwrap();
        storage
            .get_mut(factory)
            .unwrap()
            .orders
            .as_mut()
            .unwrap()
            .set_current(Order::Construct(ConstructOrder::new(UnitKind::Commander, Vec2Fixed::ZERO)));

        roster.update(&mut storage, &[]).unwrap();
        let commander = storage.get(factory).unwrap().construction().unwrap();
        finish(&mut storage, commander);

        assert!(matches!(
            roster.update(&mut storage, &[]),
            Err(GameError::InvalidPromotion { kind: UnitKind::Commander, .. })
        ));
    }

    #[test]
    fn test_energy_output() {
        let mut storage = UnitStorage::new();
        let mut roster = PlayerUnits::new(None);
        let commander = spawn(&mut storage, UnitKind::Commander, true);
        let generator = spawn(&mut storage, UnitKind::PowerGenerator, true);
        roster.enroll(&storage, commander).unwrap();
        roster.enroll(&storage, generator).unwrap();
        roster.enroll(&storage, generator).unwrap();
        assert_eq!(roster.power_generators(), &[generator]);
        assert_eq!(roster.energy_output(&storage), Fixed::from_num(8));
    }

    #[test]
    fn test_all_killable_collidable_units() {
        let mut storage = UnitStorage::new();
        let mut roster = PlayerUnits::new(Some(10));
        let commander = spawn(&mut storage, UnitKind::Commander, true);
        let bot = spawn(&mut storage, UnitKind::Bot, true);
        let turret = spawn(&mut storage, UnitKind::Turret, true);
        for id in [commander, bot, turret] {
            roster.enroll(&storage, id).unwrap();
        }
        assert_eq!(
            roster.all_killable_collidable_units(),
            vec![bot, turret, commander]
        );
        assert_eq!(roster.vehicles_of_kind(&storage, UnitKind::Bot).collect::<Vec<_>>(), vec![bot]);
        assert!(!roster.is_at_unit_cap());
    }
}
