//! Movement along a heading.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, ratio, Fixed, Vec2Fixed};

/// Fraction of velocity kept from one tick to the next.
#[must_use]
pub fn drag() -> Fixed {
    ratio(9, 10)
}

/// Movement fragment: scalar speed along the unit's heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Motion {
    #[serde(with = "fixed_serde")]
    velocity: Fixed,
}

impl Motion {
    /// Current speed in world units per tick.
    #[must_use]
    pub const fn velocity(&self) -> Fixed {
        self.velocity
    }

    /// Accelerate by `rate`.
    pub fn thrust(&mut self, rate: Fixed) {
        self.velocity += rate;
    }

    /// Stop dead.
    pub fn brake(&mut self) {
        self.velocity = Fixed::ZERO;
    }

    /// Whether the unit is stationary.
    #[must_use]
    pub fn is_stationary(&self) -> bool {
        self.velocity == Fixed::ZERO
    }

    /// Advance `position` one tick along `heading`, then apply drag.
    pub fn update_position(&mut self, position: &mut Vec2Fixed, heading: Vec2Fixed) {
        if self.is_stationary() {
            return;
        }
        *position = *position + heading.scale(self.velocity);
        self.velocity *= drag();
    }
}
