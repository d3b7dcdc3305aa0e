//! Ownership.

use serde::{Deserialize, Serialize};

use crate::components::PlayerId;

/// Ownership fragment. Neutral entities such as power sources have no owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Ownership {
    player: Option<PlayerId>,
}

impl Ownership {
    /// Owned by `player`, or neutral when `None`.
    #[must_use]
    pub const fn new(player: Option<PlayerId>) -> Self {
        Self { player }
    }

    /// Current owner.
    #[must_use]
    pub const fn player(&self) -> Option<PlayerId> {
        self.player
    }

    /// Whether `player` owns this.
    #[must_use]
    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.player == Some(player)
    }

    /// Hand ownership to `player`. Returns the previous owner.
    pub fn capture(&mut self, player: Option<PlayerId>) -> Option<PlayerId> {
        std::mem::replace(&mut self.player, player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_reassigns_owner() {
        let mut ownership = Ownership::new(None);
        assert_eq!(ownership.capture(Some(PlayerId(1))), None);
        assert!(ownership.is_owned_by(PlayerId(1)));
        assert_eq!(ownership.capture(Some(PlayerId(2))), Some(PlayerId(1)));
        assert_eq!(ownership.player(), Some(PlayerId(2)));
    }
}
