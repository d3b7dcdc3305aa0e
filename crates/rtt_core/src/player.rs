//! Players taking part in a simulation.

use serde::{Deserialize, Serialize};

use crate::components::PlayerId;
use crate::math::{fixed_serde, Fixed};
use crate::player_units::PlayerUnits;

/// A player: a roster plus the energy it has banked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Identifier, also the player's index in the simulation.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// The player's units.
    pub units: PlayerUnits,
    /// Energy accumulated from the roster's output.
    #[serde(with = "fixed_serde")]
    pub stored_energy: Fixed,
}

impl Player {
    /// Create a player with an empty roster.
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<String>, unit_cap: Option<usize>) -> Self {
        Self {
            id,
            name: name.into(),
            units: PlayerUnits::new(unit_cap),
            stored_energy: Fixed::ZERO,
        }
    }

    /// A player is defeated once its roster is empty.
    #[must_use]
    pub fn is_defeated(&self) -> bool {
        self.units.unit_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_is_defeated_until_it_has_units() {
        let player = Player::new(PlayerId(0), "red", Some(50));
        assert!(player.is_defeated());
        assert_eq!(player.stored_energy, Fixed::ZERO);
        assert_eq!(player.units.unit_cap(), Some(50));
    }
}
