//! # RTT Core
//!
//! Deterministic battlefield simulation for a real-time-tactics game.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO beyond reading scenario files
//! - No system randomness
//! - No floating-point math (uses fixed-point)
//!
//! ## Crate Structure
//!
//! - [`unit_kind`] - Unit kinds and the static metadata registry
//! - [`abilities`] - Ability fragments (health, construction, movement, orders)
//! - [`unit`] - Units composed from fragments
//! - [`construction`] - The builder protocol
//! - [`combat`] - Hitscan weapons
//! - [`player_units`] - Per-player rosters
//! - [`simulation`] - The unit arena and tick loop
//! - [`player_facade`] - The controller interface
//! - [`scenario`] - RON scenario files
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod abilities;
pub mod combat;
pub mod components;
pub mod construction;
pub mod error;
pub mod math;
pub mod player;
pub mod player_facade;
pub mod player_units;
pub mod scenario;
pub mod simulation;
pub mod systems;
pub mod unit;
pub mod unit_kind;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::abilities::{ConstructOrder, Order, OrderStatus, OrderTag};
    pub use crate::components::{EntityId, PlayerId};
    pub use crate::error::{GameError, Result};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::player::Player;
    pub use crate::player_facade::{PlayerFacade, PlayerHandle, PowerSourceInfo};
    pub use crate::player_units::{PlayerUnits, RosterReport};
    pub use crate::scenario::{Scenario, ScenarioError};
    pub use crate::simulation::{Simulation, TickEvents, UnitStorage};
    pub use crate::unit::Unit;
    pub use crate::unit_kind::{Abilities, RosterRole, UnitKind};
}
