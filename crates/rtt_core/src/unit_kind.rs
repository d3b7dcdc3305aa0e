//! Unit kinds and the static metadata registry.
//!
//! This module is the single source of truth for what every kind of unit
//! is and can do:
//! - [`UnitKind`]: the closed set of kind tags
//! - [`Abilities`]: bitflags for fast capability queries
//! - [`KindMetadata`]: per-kind tunables, looked up with [`UnitKind::metadata`]
//!
//! # Design Goals
//!
//! - **Declared, not assumed**: a kind has a capability only if its metadata
//!   declares the matching field
//! - **Read-only**: the registry is built once on first access and never mutated
//! - **Exhaustive**: every dispatch on kind is a `match`, so adding a kind
//!   forces every call site to handle it

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::abilities::orderable::OrderTag;
use crate::math::{ratio, Fixed};

/// Range of the artillery tank's main gun.
pub const ARTILLERY_RANGE: i32 = 240;
/// Range of the shotgun tank's spread.
pub const SHOTGUN_RANGE: i32 = 60;
/// Range of a turret.
pub const TURRET_RANGE: i32 = 120;
/// Range of the titan's cannon.
pub const TITAN_RANGE: i32 = 100;

/// Tag identifying what kind of unit an entity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Long-range, slow-firing tank.
    ArtilleryTank,
    /// Cheap, fast melee unit.
    Bot,
    /// The player's irreplaceable mobile builder.
    Commander,
    /// Cheap mobile builder.
    Engineer,
    /// Static builder that produces vehicles.
    Factory,
    /// Energy structure built on a power source.
    PowerGenerator,
    /// Neutral map feature a power generator can be built on.
    PowerSource,
    /// Short-range, high-damage tank.
    ShotgunTank,
    /// Huge, expensive assault vehicle.
    Titan,
    /// Static defence.
    Turret,
}

impl UnitKind {
    /// Every kind, in registry order.
    pub const ALL: [Self; 10] = [
        Self::ArtilleryTank,
        Self::Bot,
        Self::Commander,
        Self::Engineer,
        Self::Factory,
        Self::PowerGenerator,
        Self::PowerSource,
        Self::ShotgunTank,
        Self::Titan,
        Self::Turret,
    ];

    const fn index(self) -> usize {
        match self {
            Self::ArtilleryTank => 0,
            Self::Bot => 1,
            Self::Commander => 2,
            Self::Engineer => 3,
            Self::Factory => 4,
            Self::PowerGenerator => 5,
            Self::PowerSource => 6,
            Self::ShotgunTank => 7,
            Self::Titan => 8,
            Self::Turret => 9,
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ArtilleryTank => "artillery_tank",
            Self::Bot => "bot",
            Self::Commander => "commander",
            Self::Engineer => "engineer",
            Self::Factory => "factory",
            Self::PowerGenerator => "power_generator",
            Self::PowerSource => "power_source",
            Self::ShotgunTank => "shotgun_tank",
            Self::Titan => "titan",
            Self::Turret => "turret",
        }
    }

    /// Static metadata for this kind.
    #[must_use]
    pub fn metadata(self) -> &'static KindMetadata {
        &registry()[self.index()]
    }

    /// Capabilities declared by this kind's metadata.
    #[must_use]
    pub fn abilities(self) -> Abilities {
        self.metadata().abilities()
    }

    /// Check a single capability.
    #[must_use]
    pub fn has(self, ability: Abilities) -> bool {
        self.abilities().contains(ability)
    }

    /// The roster list a finished unit of this kind is promoted into.
    ///
    /// `None` for kinds that are never produced by a builder.
    #[must_use]
    pub const fn role(self) -> Option<RosterRole> {
        match self {
            Self::ArtilleryTank | Self::Bot | Self::ShotgunTank | Self::Titan => {
                Some(RosterRole::Vehicle)
            }
            Self::Engineer => Some(RosterRole::Engineer),
            Self::Factory => Some(RosterRole::Factory),
            Self::PowerGenerator => Some(RosterRole::PowerGenerator),
            Self::Turret => Some(RosterRole::Turret),
            Self::Commander | Self::PowerSource => None,
        }
    }
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The roster list a unit kind belongs to once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RosterRole {
    /// Mobile combat unit.
    Vehicle,
    /// Mobile builder; listed both as a vehicle and as an engineer.
    Engineer,
    /// Vehicle-producing structure.
    Factory,
    /// Energy structure.
    PowerGenerator,
    /// Static defence.
    Turret,
}

/// Bitflags for fast capability queries.
///
/// Derived from which optional fields a kind's [`KindMetadata`] declares.
///
/// # Example
///
/// ```
/// use rtt_core::unit_kind::{Abilities, UnitKind};
///
/// assert!(UnitKind::Engineer.has(Abilities::MOVABLE.union(Abilities::BUILDER)));
/// assert!(!UnitKind::PowerSource.has(Abilities::KILLABLE));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Abilities(u32);

impl Abilities {
    /// Has health and can die.
    pub const KILLABLE: Self = Self(1 << 0);
    /// Can be under construction.
    pub const CONSTRUCTABLE: Self = Self(1 << 1);
    /// Belongs to a player (possibly none).
    pub const OWNABLE: Self = Self(1 << 2);
    /// Occupies a circle for overlap tests.
    pub const COLLIDABLE: Self = Self(1 << 3);
    /// Moves along its heading.
    pub const MOVABLE: Self = Self(1 << 4);
    /// Turns its heading.
    pub const STEERABLE: Self = Self(1 << 5);
    /// Executes orders.
    pub const ORDERABLE: Self = Self(1 << 6);
    /// Executes construct orders.
    pub const BUILDER: Self = Self(1 << 7);
    /// Carries a weapon.
    pub const ARMED: Self = Self(1 << 8);

    /// Empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Check if all flags in `other` are set in `self`.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Combine two sets.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Get raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

/// A kind's weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeaponMetadata {
    /// Reach in world units. Zero means a contact weapon that only fires
    /// while colliding with its target.
    pub range: Fixed,
    /// Health removed per shot.
    pub damage: Fixed,
}

/// Static tunables for one unit kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindMetadata {
    /// The kind described.
    pub kind: UnitKind,
    /// Radius used for overlap tests.
    pub collision_radius: Fixed,
    /// Maximum health. `None` for kinds that cannot be damaged.
    pub full_health: Option<Fixed>,
    /// Total build work. `None` for kinds that are never constructed.
    pub build_cost: Option<Fixed>,
    /// Thrust added to velocity per tick.
    pub movement_rate: Option<Fixed>,
    /// Maximum heading change per tick, in radians.
    pub turn_rate: Option<Fixed>,
    /// Ticks between shots.
    pub firing_rate: Option<u32>,
    /// Weapon reach and damage.
    pub weapon: Option<WeaponMetadata>,
    /// How close a builder must be to what it builds.
    pub production_range: Option<Fixed>,
    /// Build work a builder contributes per tick.
    pub production_rate: Option<Fixed>,
    /// Energy produced per tick while alive and promoted.
    pub energy_output: Option<Fixed>,
    /// Whether commanders and engineers can build this kind.
    pub constructable_by_mobile_units: bool,
    /// Order tags this kind executes; anything else is dropped.
    pub order_behaviours: &'static [OrderTag],
}

impl KindMetadata {
    fn new(kind: UnitKind, collision_radius: i32) -> Self {
        Self {
            kind,
            collision_radius: Fixed::from_num(collision_radius),
            full_health: None,
            build_cost: None,
            movement_rate: None,
            turn_rate: None,
            firing_rate: None,
            weapon: None,
            production_range: None,
            production_rate: None,
            energy_output: None,
            constructable_by_mobile_units: false,
            order_behaviours: &[],
        }
    }

    fn killable(mut self, full_health: i32, build_cost: i32) -> Self {
        self.full_health = Some(Fixed::from_num(full_health));
        self.build_cost = Some(Fixed::from_num(build_cost));
        self
    }

    fn mobile(mut self, movement_rate: Fixed, turn_rate: Fixed) -> Self {
        self.movement_rate = Some(movement_rate);
        self.turn_rate = Some(turn_rate);
        self
    }

    fn armed(mut self, firing_rate: u32, range: i32, damage: Fixed) -> Self {
        self.firing_rate = Some(firing_rate);
        self.weapon = Some(WeaponMetadata {
            range: Fixed::from_num(range),
            damage,
        });
        self
    }

    fn builder(mut self, production_range: i32, production_rate: i32) -> Self {
        self.production_range = Some(Fixed::from_num(production_range));
        self.production_rate = Some(Fixed::from_num(production_rate));
        self
    }

    fn energy(mut self, output: i32) -> Self {
        self.energy_output = Some(Fixed::from_num(output));
        self
    }

    fn mobile_buildable(mut self) -> Self {
        self.constructable_by_mobile_units = true;
        self
    }

    fn orders(mut self, behaviours: &'static [OrderTag]) -> Self {
        self.order_behaviours = behaviours;
        self
    }

    /// Capabilities implied by the declared fields.
    #[must_use]
    pub fn abilities(&self) -> Abilities {
        let mut abilities = Abilities::OWNABLE.union(Abilities::COLLIDABLE);
        if self.full_health.is_some() {
            abilities = abilities.union(Abilities::KILLABLE);
        }
        if self.build_cost.is_some() {
            abilities = abilities.union(Abilities::CONSTRUCTABLE);
        }
        if self.movement_rate.is_some() {
            abilities = abilities.union(Abilities::MOVABLE);
        }
        if self.turn_rate.is_some() {
            abilities = abilities.union(Abilities::STEERABLE);
        }
        if !self.order_behaviours.is_empty() {
            abilities = abilities.union(Abilities::ORDERABLE);
        }
        if self.production_range.is_some() {
            abilities = abilities.union(Abilities::BUILDER);
        }
        if self.weapon.is_some() {
            abilities = abilities.union(Abilities::ARMED);
        }
        abilities
    }

    /// Whether this kind executes orders with the given tag.
    #[must_use]
    pub fn accepts(&self, tag: OrderTag) -> bool {
        self.order_behaviours.contains(&tag)
    }
}

const FIGHTER_ORDERS: &[OrderTag] = &[OrderTag::Attack, OrderTag::Manoeuvre];
const MOBILE_BUILDER_ORDERS: &[OrderTag] = &[OrderTag::Construct, OrderTag::Manoeuvre];
const FACTORY_ORDERS: &[OrderTag] = &[OrderTag::Construct];

fn registry() -> &'static [KindMetadata] {
    static REGISTRY: OnceLock<Vec<KindMetadata>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let table: Vec<KindMetadata> = UnitKind::ALL.iter().map(|&kind| build(kind)).collect();
        tracing::debug!(kinds = table.len(), "Unit metadata registry initialised");
        table
    })
}

fn build(kind: UnitKind) -> KindMetadata {
    match kind {
        UnitKind::ArtilleryTank => KindMetadata::new(kind, 9)
            .killable(50, 500)
            .mobile(ratio(4, 100), ratio(4, 3))
            .armed(75, ARTILLERY_RANGE, Fixed::from_num(18))
            .orders(FIGHTER_ORDERS),
        UnitKind::Bot => KindMetadata::new(kind, 5)
            .killable(10, 70)
            .mobile(ratio(15, 100), ratio(5, 3))
            .armed(10, 0, Fixed::ONE)
            .mobile_buildable()
            .orders(FIGHTER_ORDERS),
        UnitKind::Commander => KindMetadata::new(kind, 8)
            .killable(1000, 10000)
            .mobile(ratio(3, 100), ratio(2, 3))
            .builder(35, 10)
            .energy(5)
            .orders(MOBILE_BUILDER_ORDERS),
        UnitKind::Engineer => KindMetadata::new(kind, 6)
            .killable(16, 50)
            .mobile(ratio(6, 100), ratio(4, 3))
            .builder(25, 5)
            .orders(MOBILE_BUILDER_ORDERS),
        UnitKind::Factory => KindMetadata::new(kind, 15)
            .killable(120, 1200)
            .builder(15, 10)
            .mobile_buildable()
            .orders(FACTORY_ORDERS),
        UnitKind::PowerGenerator => KindMetadata::new(kind, 8)
            .killable(60, 300)
            .energy(3)
            .mobile_buildable(),
        UnitKind::PowerSource => KindMetadata::new(kind, 7),
        UnitKind::ShotgunTank => KindMetadata::new(kind, 8)
            .killable(35, 400)
            .mobile(ratio(7, 100), ratio(4, 3))
            .armed(40, SHOTGUN_RANGE, ratio(25, 2))
            .orders(FIGHTER_ORDERS),
        UnitKind::Titan => KindMetadata::new(kind, 12)
            .killable(700, 7000)
            .mobile(ratio(3, 100), ratio(1, 3))
            .armed(30, TITAN_RANGE, Fixed::from_num(20))
            .orders(FIGHTER_ORDERS),
        UnitKind::Turret => KindMetadata::new(kind, 5)
            .killable(60, 600)
            .armed(5, TURRET_RANGE, Fixed::from_num(7))
            .mobile_buildable(),
    }
}
