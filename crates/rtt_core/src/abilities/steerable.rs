//! Turning a unit's heading at a bounded rate.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_cos, fixed_sin, Fixed, Vec2Fixed};

/// Steering fragment: the unit's unit-length heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Steering {
    heading: Vec2Fixed,
}

impl Default for Steering {
    fn default() -> Self {
        Self {
            heading: Vec2Fixed::UNIT_X,
        }
    }
}

impl Steering {
    /// Current heading.
    #[must_use]
    pub const fn heading(&self) -> Vec2Fixed {
        self.heading
    }

    /// Turn towards `desired` by at most `max_turn` radians.
    ///
    /// Snaps onto the desired heading once it is within `max_turn`.
    /// A zero `desired` vector leaves the heading unchanged.
    pub fn steer_towards(&mut self, desired: Vec2Fixed, max_turn: Fixed) {
        let desired = desired.normalize();
        if desired == Vec2Fixed::ZERO {
            return;
        }
        let cos = fixed_cos(max_turn);
        if self.heading.dot(desired) >= cos {
            self.heading = desired;
            return;
        }
        let sin = fixed_sin(max_turn);
        let sin = if self.heading.cross(desired) >= Fixed::ZERO {
            sin
        } else {
            -sin
        };
        self.heading = self.heading.rotate(cos, sin).normalize();
    }
}
