//! Health and death.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed};

/// Health fragment for killable units.
///
/// Invariant: `dead` implies `health == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vitals {
    #[serde(with = "fixed_serde")]
    full_health: Fixed,
    #[serde(with = "fixed_serde")]
    health: Fixed,
    dead: bool,
}

impl Vitals {
    /// Create a fragment with the given current and maximum health.
    ///
    /// `health` is clamped to `[0, full_health]`.
    #[must_use]
    pub fn new(full_health: Fixed, health: Fixed) -> Self {
        Self {
            full_health,
            health: health.clamp(Fixed::ZERO, full_health),
            dead: false,
        }
    }

    /// Maximum health.
    #[must_use]
    pub const fn full_health(&self) -> Fixed {
        self.full_health
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> Fixed {
        self.health
    }

    /// Kill outright. Idempotent.
    pub fn kill(&mut self) {
        self.dead = true;
        self.health = Fixed::ZERO;
    }

    /// Restore up to `amount` health, saturating at full health.
    ///
    /// Negative amounts are ignored. Callers do not repair the dead.
    pub fn repair(&mut self, amount: Fixed) {
        if amount <= Fixed::ZERO {
            return;
        }
        self.health = (self.health + amount).min(self.full_health);
    }

    /// Remove up to `amount` health. Returns `true` if this call killed the unit.
    pub fn damage(&mut self, amount: Fixed) -> bool {
        self.health = (self.health - amount.max(Fixed::ZERO)).max(Fixed::ZERO);
        if self.health == Fixed::ZERO && !self.dead {
            self.kill();
            return true;
        }
        false
    }

    /// Whether the unit is dead.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.dead
    }

    /// Whether the unit is alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.dead
    }

    /// Whether health is below maximum.
    #[must_use]
    pub fn is_damaged(&self) -> bool {
        self.health < self.full_health
    }

    /// Whether health has reached maximum.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.health == self.full_health
    }

    /// Health as a fraction of maximum.
    #[must_use]
    pub fn healthiness(&self) -> Fixed {
        if self.full_health == Fixed::ZERO {
            return Fixed::ZERO;
        }
        self.health / self.full_health
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(n: i32) -> Fixed {
        Fixed::from_num(n)
    }

    #[test]
    fn test_new_clamps_health() {
        let vitals = Vitals::new(fixed(10), fixed(50));
        assert_eq!(vitals.health(), fixed(10));
        let vitals = Vitals::new(fixed(10), fixed(-5));
        assert_eq!(vitals.health(), Fixed::ZERO);
        assert!(vitals.is_alive());
    }

    #[test]
    fn test_kill_is_idempotent() {
        let mut vitals = Vitals::new(fixed(10), fixed(10));
        vitals.kill();
        vitals.kill();
        assert!(vitals.is_dead());
        assert_eq!(vitals.health(), Fixed::ZERO);
    }

    #[test]
    fn test_repair_saturates() {
        let mut vitals = Vitals::new(fixed(10), fixed(4));
        vitals.repair(fixed(3));
        assert_eq!(vitals.health(), fixed(7));
        vitals.repair(fixed(30));
        assert_eq!(vitals.health(), fixed(10));
        assert!(!vitals.is_damaged());
        vitals.repair(fixed(-3));
        assert_eq!(vitals.health(), fixed(10));
    }

    #[test]
    fn test_damage_kills_at_zero() {
        let mut vitals = Vitals::new(fixed(10), fixed(10));
        assert!(!vitals.damage(fixed(4)));
        assert_eq!(vitals.health(), fixed(6));
        assert!(vitals.damage(fixed(100)));
        assert!(vitals.is_dead());
        // Already dead: no second death.
        assert!(!vitals.damage(fixed(1)));
    }

    #[test]
    fn test_exact_lethal_damage() {
        let mut vitals = Vitals::new(fixed(35), fixed(35));
        assert!(vitals.damage(fixed(35)));
        assert!(vitals.is_dead());
    }

    #[test]
    fn test_healthiness() {
        let vitals = Vitals::new(fixed(60), fixed(15));
        assert_eq!(vitals.healthiness(), Fixed::from_num(0.25));
    }
}
