//! Construction progress.
//!
//! A constructable unit starts at zero health and is built by repairing it
//! up to full health. Builders convert their work into health at
//! [`build_cost_per_health`] work per point.

use serde::{Deserialize, Serialize};

use crate::math::Fixed;
use crate::unit::Unit;
use crate::unit_kind::UnitKind;

/// Build-state fragment.
///
/// Invariant: `built` implies the unit is not dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BuildState {
    /// Whether construction has finished.
    pub built: bool,
}

/// Work needed per point of health for a kind.
///
/// Kinds without an explicit build cost cost ten work per health point.
#[must_use]
pub fn build_cost_per_health(kind: UnitKind) -> Option<Fixed> {
    let metadata = kind.metadata();
    let full_health = metadata.full_health?;
    if full_health == Fixed::ZERO {
        return None;
    }
    let cost = metadata
        .build_cost
        .unwrap_or(full_health * Fixed::from_num(10));
    Some(cost / full_health)
}

/// Contribute `amount` health of construction from a mobile builder.
///
/// No-op for kinds commanders and engineers cannot build.
pub fn build(unit: &mut Unit, amount: Fixed) {
    if !unit.kind().metadata().constructable_by_mobile_units {
        return;
    }
    fabricate(unit, amount);
}

/// Contribute `amount` health of construction from a factory.
///
/// Like [`build`] but without the mobile-builder restriction.
pub fn fabricate(unit: &mut Unit, amount: Fixed) {
    let (Some(vitals), Some(state)) = (unit.vitals.as_mut(), unit.build_state.as_mut()) else {
        return;
    };
    if vitals.is_dead() {
        return;
    }
    vitals.repair(amount);
    if !state.built {
        state.built = vitals.is_full();
    }
}

/// Whether construction has finished. Kinds that are never constructed
/// count as built.
#[must_use]
pub fn is_built(unit: &Unit) -> bool {
    unit.build_state.map_or(true, |state| state.built)
}

/// Whether the unit is alive and not yet built.
#[must_use]
pub fn is_under_construction(unit: &Unit) -> bool {
    unit.is_alive() && !is_built(unit)
}
