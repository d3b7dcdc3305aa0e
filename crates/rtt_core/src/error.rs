//! Error types for the battlefield simulation.

use thiserror::Error;

use crate::components::{EntityId, PlayerId};
use crate::unit_kind::UnitKind;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// A player tried to command a unit it does not own.
    #[error("Entity {entity} is not owned by {player}")]
    NotOwned {
        /// The unit addressed.
        entity: EntityId,
        /// The player that addressed it.
        player: PlayerId,
    },

    /// The unit has no order queue.
    #[error("Entity {0} does not accept orders")]
    NotOrderable(EntityId),

    /// An order that cannot be carried out as given.
    #[error("Invalid order for entity {entity}: {reason}")]
    InvalidOrder {
        /// The unit holding the order.
        entity: EntityId,
        /// What is wrong with it.
        reason: String,
    },

    /// A finished construction whose kind has no roster list.
    #[error("Cannot promote {kind} {entity}: kind has no roster role")]
    InvalidPromotion {
        /// The construction.
        entity: EntityId,
        /// Its kind.
        kind: UnitKind,
    },

    /// A unit reached an update path meant for other kinds.
    #[error("Unexpected {kind} {entity} in {context}")]
    UnexpectedKind {
        /// The unit.
        entity: EntityId,
        /// Its kind.
        kind: UnitKind,
        /// Where it turned up.
        context: &'static str,
    },

    /// Invalid simulation state.
    #[error("Invalid simulation state: {0}")]
    InvalidState(String),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },
}

impl GameError {
    /// Whether the error must abort the tick rather than being contained
    /// to the unit that raised it.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidPromotion { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = GameError::NotOwned {
            entity: 4,
            player: PlayerId(1),
        };
        assert_eq!(err.to_string(), "Entity 4 is not owned by player 1");

        let err = GameError::InvalidPromotion {
            entity: 9,
            kind: UnitKind::Commander,
        };
        assert_eq!(
            err.to_string(),
            "Cannot promote commander 9: kind has no roster role"
        );
        assert!(err.is_fatal());
        assert!(!GameError::EntityNotFound(1).is_fatal());
    }
}
