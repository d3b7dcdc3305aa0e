//! Entity base shared by every simulated unit.
//!
//! Identity, kind tag and position. Everything else a unit can do lives in
//! the ability fragments under [`crate::abilities`].

use serde::{Deserialize, Serialize};

use crate::math::Vec2Fixed;
use crate::unit_kind::UnitKind;

/// Unique identifier for entities.
///
/// Allocated by [`crate::simulation::UnitStorage`] and never reused within
/// a simulation.
pub type EntityId = u64;

/// Identifier for a player taking part in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Create a new player ID.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Index of this player in the simulation's player list.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player {}", self.0)
    }
}

/// The part every unit has: who it is, what it is and where it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier.
    pub id: EntityId,
    /// Kind tag. Fixed for the lifetime of the entity.
    pub kind: UnitKind,
    /// World position.
    pub position: Vec2Fixed,
}

impl Entity {
    /// Create a new entity.
    #[must_use]
    pub const fn new(id: EntityId, kind: UnitKind, position: Vec2Fixed) -> Self {
        Self { id, kind, position }
    }
}
