//! The construction protocol.
//!
//! Builders (commanders, engineers and factories) turn a construct order
//! into a new unit, or join one already under construction on a power
//! source, and then pour work into it every tick until it is built.
//!
//! Per builder the protocol moves through four states:
//!
//! | state                      | `constructing` | `construction` |
//! |----------------------------|----------------|----------------|
//! | idle                       | `false`        | `None`         |
//! | approaching                | any            | any            |
//! | started                    | `true`         | `Some`         |
//! | awaiting completion signal | `true`         | `None`         |
//!
//! The builder's own update clears `construction` once the target is built
//! or dead. Only the next order dispatch sees `construction == None` while
//! `constructing` is still set and reports the order complete.

use serde::{Deserialize, Serialize};

use crate::abilities::constructable::{build, build_cost_per_health, fabricate};
use crate::abilities::{ConstructOrder, OrderStatus};
use crate::components::{EntityId, PlayerId};
use crate::error::{GameError, Result};
use crate::math::Vec2Fixed;
use crate::simulation::UnitStorage;
use crate::unit_kind::{Abilities, UnitKind};

/// Construction slot carried by builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Builder {
    /// The unit being built. Shared, never owned.
    pub construction: Option<EntityId>,
    /// Whether the current construct order has started a construction.
    pub constructing: bool,
}

/// Slot on a power source for the generator built on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PowerSite {
    /// The generator on this source, if any.
    pub structure: Option<EntityId>,
}

/// Execute a construct order for one tick.
///
/// Returns [`OrderStatus::Complete`] only on the tick after the
/// construction finished (or died); every other path keeps the order
/// active, including a stall on a contested power source.
pub fn construct(
    storage: &mut UnitStorage,
    builder_id: EntityId,
    order: &ConstructOrder,
) -> Result<OrderStatus> {
    let unit = storage
        .get(builder_id)
        .ok_or(GameError::EntityNotFound(builder_id))?;
    let state = unit.builder.ok_or(GameError::UnexpectedKind {
        entity: builder_id,
        kind: unit.kind(),
        context: "construct",
    })?;
    let metadata = unit.metadata();
    let range = metadata.production_range.unwrap_or_default();
    let movable = metadata.abilities().contains(Abilities::MOVABLE);
    let builder_position = unit.position();
    let player = unit.player();

    let target = construction_position(storage, builder_id, builder_position, movable, order)?;

    if !builder_position.within(target, range) {
        if movable {
            if let Some(unit) = storage.get_mut(builder_id) {
                unit.manoeuvre(target);
            }
        }
        return Ok(OrderStatus::Active);
    }

    if state.construction.is_some() {
        return Ok(OrderStatus::Active);
    }

    if state.constructing {
        set_builder(storage, builder_id, None, false);
        tracing::debug!(builder = builder_id, kind = %order.kind, "Construction order complete");
        return Ok(OrderStatus::Complete);
    }

    let player = player.ok_or_else(|| {
        GameError::InvalidState(format!("builder {builder_id} has no owner"))
    })?;

    match (order.kind, order.site) {
        (UnitKind::PowerGenerator, Some(site)) => {
            construct_power_generator(storage, builder_id, player, site, target)?;
        }
        (kind, _) => {
            let id = storage.spawn(kind, target, Some(player), false);
            set_builder(storage, builder_id, Some(id), true);
            tracing::debug!(builder = builder_id, construction = id, %kind, "Construction started");
        }
    }
    Ok(OrderStatus::Active)
}

/// Where the order's unit will be placed.
///
/// Power generators go on their power source; static builders build in
/// place; mobile builders build where they are told.
fn construction_position(
    storage: &UnitStorage,
    builder_id: EntityId,
    builder_position: Vec2Fixed,
    movable: bool,
    order: &ConstructOrder,
) -> Result<Vec2Fixed> {
    if let (UnitKind::PowerGenerator, Some(site)) = (order.kind, order.site) {
        let source = storage.get(site).ok_or(GameError::EntityNotFound(site))?;
        if source.site.is_none() {
            return Err(GameError::InvalidOrder {
                entity: builder_id,
                reason: format!("{} {site} is not a power source", source.kind()),
            });
        }
        return Ok(source.position());
    }
    Ok(if movable {
        order.position
    } else {
        builder_position
    })
}

fn construct_power_generator(
    storage: &mut UnitStorage,
    builder_id: EntityId,
    player: PlayerId,
    site: EntityId,
    position: Vec2Fixed,
) -> Result<()> {
    let structure = storage
        .get(site)
        .and_then(|source| source.site)
        .and_then(|slot| slot.structure)
        .filter(|&id| storage.contains(id));

    match structure {
        None => {
            let id = storage.spawn(UnitKind::PowerGenerator, position, Some(player), false);
            if let Some(slot) = storage.get_mut(site).and_then(|source| source.site.as_mut()) {
                slot.structure = Some(id);
            }
            set_builder(storage, builder_id, Some(id), true);
            tracing::debug!(builder = builder_id, construction = id, site, "Power generator started");
        }
        Some(id) => {
            let joinable = storage
                .get(id)
                .is_some_and(|generator| generator.player() == Some(player) && generator.is_under_construction());
            if joinable {
                set_builder(storage, builder_id, Some(id), true);
                tracing::debug!(builder = builder_id, construction = id, site, "Joined power generator");
            } else {
                tracing::trace!(builder = builder_id, site, "Power source contested, order stalled");
            }
        }
    }
    Ok(())
}

fn set_builder(
    storage: &mut UnitStorage,
    builder_id: EntityId,
    construction: Option<EntityId>,
    constructing: bool,
) {
    if let Some(slot) = storage.get_mut(builder_id).and_then(|unit| unit.builder.as_mut()) {
        slot.construction = construction;
        slot.constructing = constructing;
    }
}

/// Drop the builder's construction handle once the target is built, dead
/// or gone from the arena.
pub fn release_finished(storage: &mut UnitStorage, builder_id: EntityId) {
    let Some(target) = storage.get(builder_id).and_then(|unit| unit.construction()) else {
        return;
    };
    let finished = storage
        .get(target)
        .map_or(true, |unit| unit.is_built() || unit.is_dead());
    if finished {
        if let Some(slot) = storage.get_mut(builder_id).and_then(|unit| unit.builder.as_mut()) {
            slot.construction = None;
        }
    }
}

/// Put one tick of the builder's work into its construction.
///
/// Only contributes while the construction is within production range.
/// Mobile builders use [`build`]; static builders use [`fabricate`], which
/// may produce kinds mobile builders cannot.
pub fn produce(storage: &mut UnitStorage, builder_id: EntityId) {
    let Some(unit) = storage.get(builder_id) else {
        return;
    };
    let Some(target) = unit.construction() else {
        return;
    };
    let metadata = unit.metadata();
    let (Some(range), Some(rate)) = (metadata.production_range, metadata.production_rate) else {
        return;
    };
    let movable = metadata.abilities().contains(Abilities::MOVABLE);
    let position = unit.position();

    let Some(construction) = storage.get_mut(target) else {
        return;
    };
    if !position.within(construction.position(), range) {
        return;
    }
    let Some(cost) = build_cost_per_health(construction.kind()) else {
        return;
    };
    let amount = rate / cost;
    if movable {
        build(construction, amount);
    } else {
        fabricate(construction, amount);
    }
    if construction.is_built() {
        tracing::debug!(builder = builder_id, construction = target, kind = %construction.kind(), "Construction built");
    }
}

/// Clear the constructing flag of a builder that holds no construction.
pub fn settle(storage: &mut UnitStorage, builder_id: EntityId) {
    if let Some(slot) = storage.get_mut(builder_id).and_then(|unit| unit.builder.as_mut()) {
        if slot.construction.is_none() {
            slot.constructing = false;
        }
    }
}
