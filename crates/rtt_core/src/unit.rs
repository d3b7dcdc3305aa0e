//! The composed unit.
//!
//! A [`Unit`] is the entity base plus exactly the ability fragments its
//! kind's metadata declares. Fragments are `Option`s; a fragment is `Some`
//! if and only if the kind has the matching [`Abilities`] flag, so code
//! that needs a capability checks the fragment rather than the kind.

use serde::{Deserialize, Serialize};

use crate::abilities::constructable;
use crate::abilities::{BuildState, Motion, Order, OrderQueue, OrderStatus, Ownership, Steering, Vitals};
use crate::combat::Armament;
use crate::components::{Entity, EntityId, PlayerId};
use crate::construction::{Builder, PowerSite};
use crate::math::{Fixed, Vec2Fixed};
use crate::unit_kind::{Abilities, KindMetadata, UnitKind};

/// A simulated unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Identity, kind and position.
    pub entity: Entity,
    /// Owning player, if any.
    pub ownership: Ownership,
    /// Health. `Some` for killable kinds.
    pub vitals: Option<Vitals>,
    /// Construction progress. `Some` for constructable kinds.
    pub build_state: Option<BuildState>,
    /// Speed. `Some` for movable kinds.
    pub motion: Option<Motion>,
    /// Heading. `Some` for steerable kinds.
    pub steering: Option<Steering>,
    /// Order queue. `Some` for orderable kinds.
    pub orders: Option<OrderQueue>,
    /// Construction slot. `Some` for builders.
    pub builder: Option<Builder>,
    /// Weapon cooldown. `Some` for armed kinds.
    pub armament: Option<Armament>,
    /// Power generator slot. `Some` for power sources.
    pub site: Option<PowerSite>,
}

impl Unit {
    /// Create a unit with the fragments its kind declares.
    ///
    /// Constructable kinds start at full health when `built`, otherwise
    /// at zero health and under construction.
    #[must_use]
    pub fn new(
        id: EntityId,
        kind: UnitKind,
        position: Vec2Fixed,
        player: Option<PlayerId>,
        built: bool,
    ) -> Self {
        let metadata = kind.metadata();
        let abilities = metadata.abilities();
        let constructable = abilities.contains(Abilities::CONSTRUCTABLE);
        let vitals = metadata.full_health.map(|full| {
            let health = if built || !constructable {
                full
            } else {
                Fixed::ZERO
            };
            Vitals::new(full, health)
        });

        Self {
            entity: Entity::new(id, kind, position),
            ownership: Ownership::new(player),
            vitals,
            build_state: constructable.then_some(BuildState { built }),
            motion: abilities
                .contains(Abilities::MOVABLE)
                .then(Motion::default),
            steering: abilities
                .contains(Abilities::STEERABLE)
                .then(Steering::default),
            orders: abilities
                .contains(Abilities::ORDERABLE)
                .then(OrderQueue::new),
            builder: abilities
                .contains(Abilities::BUILDER)
                .then(Builder::default),
            armament: abilities
                .contains(Abilities::ARMED)
                .then(Armament::default),
            site: matches!(kind, UnitKind::PowerSource).then(PowerSite::default),
        }
    }

    /// Unique id.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.entity.id
    }

    /// Kind tag.
    #[must_use]
    pub const fn kind(&self) -> UnitKind {
        self.entity.kind
    }

    /// Static metadata for this unit's kind.
    #[must_use]
    pub fn metadata(&self) -> &'static KindMetadata {
        self.entity.kind.metadata()
    }

    /// World position.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.entity.position
    }

    /// Radius used for overlap tests.
    #[must_use]
    pub fn collision_radius(&self) -> Fixed {
        self.metadata().collision_radius
    }

    /// Owning player.
    #[must_use]
    pub const fn player(&self) -> Option<PlayerId> {
        self.ownership.player()
    }

    /// Transfer ownership, returning the previous owner.
    pub fn capture(&mut self, player: Option<PlayerId>) -> Option<PlayerId> {
        self.ownership.capture(player)
    }

    /// Unit-length heading. Units that cannot steer face +x.
    #[must_use]
    pub fn heading(&self) -> Vec2Fixed {
        self.steering.map_or(Vec2Fixed::UNIT_X, |steering| steering.heading())
    }

    /// Current speed. Zero for immobile units.
    #[must_use]
    pub fn velocity(&self) -> Fixed {
        self.motion.map_or(Fixed::ZERO, |motion| motion.velocity())
    }

    // --- Killable -------------------------------------------------------

    /// Current health. Zero for kinds without health.
    #[must_use]
    pub fn health(&self) -> Fixed {
        self.vitals.map_or(Fixed::ZERO, |vitals| vitals.health())
    }

    /// Whether the unit has health and can be targeted.
    #[must_use]
    pub const fn is_killable(&self) -> bool {
        self.vitals.is_some()
    }

    /// Whether the unit is dead. Kinds without health never die.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.vitals.is_some_and(|vitals| vitals.is_dead())
    }

    /// Whether the unit is alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.is_dead()
    }

    /// Whether health is below maximum.
    #[must_use]
    pub fn is_damaged(&self) -> bool {
        self.vitals.is_some_and(|vitals| vitals.is_damaged())
    }

    /// Health as a fraction of maximum. One for kinds without health.
    #[must_use]
    pub fn healthiness(&self) -> Fixed {
        self.vitals.map_or(Fixed::ONE, |vitals| vitals.healthiness())
    }

    /// Kill the unit outright, dropping its orders. Idempotent.
    pub fn kill(&mut self) {
        let Some(vitals) = self.vitals.as_mut() else {
            return;
        };
        vitals.kill();
        if let Some(orders) = self.orders.as_mut() {
            orders.clear();
        }
        if let Some(state) = self.build_state.as_mut() {
            state.built = false;
        }
    }

    /// Remove up to `amount` health. Returns `true` if this call killed
    /// the unit.
    pub fn damage(&mut self, amount: Fixed) -> bool {
        let killed = self
            .vitals
            .as_mut()
            .is_some_and(|vitals| vitals.damage(amount));
        if killed {
            self.kill();
        }
        killed
    }

    /// Restore up to `amount` health. No effect on the dead.
    pub fn repair(&mut self, amount: Fixed) {
        if self.is_dead() {
            return;
        }
        if let Some(vitals) = self.vitals.as_mut() {
            vitals.repair(amount);
        }
    }

    // --- Constructable --------------------------------------------------

    /// Whether construction has finished.
    #[must_use]
    pub fn is_built(&self) -> bool {
        constructable::is_built(self)
    }

    /// Whether the unit is alive and not yet built.
    #[must_use]
    pub fn is_under_construction(&self) -> bool {
        constructable::is_under_construction(self)
    }

    /// Energy produced this tick. Zero unless alive and built.
    #[must_use]
    pub fn energy_output(&self) -> Fixed {
        if self.is_dead() || !self.is_built() {
            return Fixed::ZERO;
        }
        self.metadata().energy_output.unwrap_or(Fixed::ZERO)
    }

    // --- Orderable ------------------------------------------------------

    /// The active order, if any.
    #[must_use]
    pub fn current_order(&self) -> Option<&Order> {
        self.orders.as_ref().and_then(OrderQueue::current)
    }

    /// Whether the unit has nothing to do. Units without orders are
    /// always idle.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.orders.as_ref().map_or(true, OrderQueue::is_empty)
    }

    /// Whether the unit is a builder working on a construction.
    #[must_use]
    pub fn is_constructing(&self) -> bool {
        self.builder.is_some_and(|builder| builder.constructing)
    }

    /// The unit this builder is working on.
    #[must_use]
    pub fn construction(&self) -> Option<EntityId> {
        self.builder.and_then(|builder| builder.construction)
    }

    // --- Movable / Steerable ---------------------------------------------

    /// Advance position one tick along the heading.
    pub fn apply_motion(&mut self) {
        let heading = self.heading();
        if let Some(motion) = self.motion.as_mut() {
            motion.update_position(&mut self.entity.position, heading);
        }
    }

    /// Stop moving.
    pub fn brake(&mut self) {
        if let Some(motion) = self.motion.as_mut() {
            motion.brake();
        }
    }

    /// Steer and thrust towards `destination`.
    ///
    /// Complete (and braked) once within the collision radius of the
    /// destination. Units that cannot move never arrive.
    pub fn manoeuvre(&mut self, destination: Vec2Fixed) -> OrderStatus {
        if self.position().within(destination, self.collision_radius()) {
            self.brake();
            return OrderStatus::Complete;
        }
        let metadata = self.metadata();
        let (Some(rate), Some(motion)) = (metadata.movement_rate, self.motion.as_mut()) else {
            return OrderStatus::Active;
        };
        motion.thrust(rate);
        if let (Some(turn_rate), Some(steering)) = (metadata.turn_rate, self.steering.as_mut()) {
            steering.steer_towards(destination - self.entity.position, turn_rate);
        }
        OrderStatus::Active
    }
}
