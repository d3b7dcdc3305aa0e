//! Per-tick unit behaviour.
//!
//! Each function advances one unit by one tick. They are called by the
//! roster in its fixed update order and never touch roster membership.
//!
//! # Builder order
//!
//! 1. Apply motion
//! 2. Release a construction that is built, dead or gone
//! 3. Produce into the construction
//! 4. Dispatch the head order
//! 5. Clear `constructing` if nothing is held

use crate::abilities::{Order, OrderStatus};
use crate::combat::{attack, cool_down, fire_at_will};
use crate::components::EntityId;
use crate::construction::{construct, produce, release_finished, settle};
use crate::error::{GameError, Result};
use crate::simulation::UnitStorage;
use crate::unit::Unit;

fn is_live(storage: &UnitStorage, id: EntityId) -> bool {
    storage.get(id).is_some_and(Unit::is_alive)
}

/// Advance the unit along its heading.
pub fn apply_motion(storage: &mut UnitStorage, id: EntityId) {
    if let Some(unit) = storage.get_mut(id) {
        unit.apply_motion();
    }
}

/// Execute the head order and dequeue it once satisfied.
///
/// Orders the kind has no behaviour for are dropped without effect. An
/// order that can never be carried out is dropped and its error returned.
pub fn dispatch_orders(storage: &mut UnitStorage, id: EntityId) -> Result<()> {
    let unit = storage.get(id).ok_or(GameError::EntityNotFound(id))?;
    let Some(order) = unit.current_order().cloned() else {
        return Ok(());
    };
    if !unit.metadata().accepts(order.tag()) {
        tracing::trace!(unit = id, kind = %unit.kind(), order = ?order.tag(), "Dropping unsupported order");
        pop_order(storage, id);
        return Ok(());
    }

    let status = match &order {
        Order::Construct(construct_order) => match construct(storage, id, construct_order) {
            Err(err @ GameError::InvalidOrder { .. }) => {
                pop_order(storage, id);
                return Err(err);
            }
            status => status?,
        },
        Order::Attack { target } => attack(storage, id, *target)?,
        Order::Manoeuvre { destination } => storage
            .get_mut(id)
            .map_or(OrderStatus::Complete, |unit| unit.manoeuvre(*destination)),
    };
    if status == OrderStatus::Complete {
        pop_order(storage, id);
    }
    Ok(())
}

fn pop_order(storage: &mut UnitStorage, id: EntityId) {
    if let Some(orders) = storage.get_mut(id).and_then(|unit| unit.orders.as_mut()) {
        orders.pop();
    }
}

/// One tick of a commander, engineer or factory.
pub fn update_builder(storage: &mut UnitStorage, id: EntityId) -> Result<()> {
    if !is_live(storage, id) {
        return Ok(());
    }
    apply_motion(storage, id);
    release_finished(storage, id);
    produce(storage, id);
    dispatch_orders(storage, id)?;
    settle(storage, id);
    Ok(())
}

/// One tick of a vehicle that only acts on orders.
pub fn update_vehicle(storage: &mut UnitStorage, id: EntityId) -> Result<()> {
    if !is_live(storage, id) {
        return Ok(());
    }
    apply_motion(storage, id);
    cool_down(storage, id);
    dispatch_orders(storage, id)
}

/// One tick of a combat vehicle: orders first, then a free shot at the
/// nearest enemy if the weapon is still loaded.
pub fn update_combat_vehicle(storage: &mut UnitStorage, id: EntityId, enemies: &[EntityId]) -> Result<()> {
    if !is_live(storage, id) {
        return Ok(());
    }
    update_vehicle(storage, id)?;
    if is_live(storage, id) {
        fire_at_will(storage, id, enemies)?;
    }
    Ok(())
}

/// One tick of a turret.
pub fn update_turret(storage: &mut UnitStorage, id: EntityId, enemies: &[EntityId]) -> Result<()> {
    if !is_live(storage, id) {
        return Ok(());
    }
    cool_down(storage, id);
    fire_at_will(storage, id, enemies)?;
    Ok(())
}
