//! Overlap tests between units.
//!
//! Every kind declares a collision radius; there is no mutable collision
//! state beyond it.

use crate::math::{Fixed, Vec2Fixed};
use crate::unit::Unit;

/// Whether two circles overlap or touch.
#[must_use]
pub fn circles_overlap(a: Vec2Fixed, radius_a: Fixed, b: Vec2Fixed, radius_b: Fixed) -> bool {
    a.within(b, radius_a + radius_b)
}

/// Whether two units overlap.
#[must_use]
pub fn is_colliding(a: &Unit, b: &Unit) -> bool {
    circles_overlap(
        a.position(),
        a.collision_radius(),
        b.position(),
        b.collision_radius(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit_kind::UnitKind;

    #[test]
    fn test_touching_circles_overlap() {
        let a = Vec2Fixed::from_ints(0, 0);
        let b = Vec2Fixed::from_ints(10, 0);
        let five = Fixed::from_num(5);
        assert!(circles_overlap(a, five, b, five));
        assert!(!circles_overlap(a, five, b, Fixed::from_num(4)));
    }

    #[test]
    fn test_units_use_registry_radii() {
        // Bot radius 5, factory radius 15.
        let bot = Unit::new(1, UnitKind::Bot, Vec2Fixed::from_ints(0, 0), None, true);
        let near = Unit::new(2, UnitKind::Factory, Vec2Fixed::from_ints(20, 0), None, true);
        let far = Unit::new(3, UnitKind::Factory, Vec2Fixed::from_ints(21, 0), None, true);
        assert!(is_colliding(&bot, &near));
        assert!(!is_colliding(&bot, &far));
    }
}
