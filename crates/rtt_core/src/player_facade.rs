//! The interface controllers use to play.
//!
//! This module defines the `PlayerFacade` trait through which AI (and any
//! other controller) observes the battlefield and commands its units. The
//! only write it allows is replacing the active order of one of the
//! player's own units; everything else is read-only.

use crate::abilities::Order;
use crate::components::{EntityId, PlayerId};
use crate::error::Result;
use crate::math::{Fixed, Vec2Fixed};
use crate::player_units::PlayerUnits;
use crate::simulation::Simulation;
use crate::unit::Unit;

/// A power source as seen by a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerSourceInfo {
    /// Entity ID.
    pub id: EntityId,
    /// Where it is.
    pub position: Vec2Fixed,
    /// The generator on it, if any.
    pub structure: Option<EntityId>,
}

/// What a controller can see and do on behalf of one player.
pub trait PlayerFacade {
    /// The player this facade acts for.
    fn player_id(&self) -> PlayerId;

    /// The player's roster.
    fn units(&self) -> &PlayerUnits;

    /// Look up any unit on the battlefield.
    fn unit(&self, id: EntityId) -> Option<&Unit>;

    /// Energy the player has banked.
    fn stored_energy(&self) -> Fixed;

    /// Opponents that are not yet defeated, in player order.
    fn opponents(&self) -> Vec<PlayerId>;

    /// Everything of `opponent`'s that can be shot at.
    fn opponent_targets(&self, opponent: PlayerId) -> Vec<EntityId>;

    /// Every power source on the map.
    fn power_sources(&self) -> Vec<PowerSourceInfo>;

    /// Replace the active order of one of the player's units.
    ///
    /// # Errors
    ///
    /// Fails if the unit does not exist, is not the player's, or does not
    /// take orders.
    fn assign_order(&mut self, unit: EntityId, order: Order) -> Result<()>;

    /// Whether the player's roster is full.
    fn is_at_unit_cap(&self) -> bool {
        self.units().is_at_unit_cap()
    }
}

/// [`PlayerFacade`] over a live [`Simulation`].
pub struct PlayerHandle<'a> {
    sim: &'a mut Simulation,
    player: PlayerId,
    empty: PlayerUnits,
}

impl<'a> PlayerHandle<'a> {
    /// Create a facade for `player`.
    pub fn new(sim: &'a mut Simulation, player: PlayerId) -> Self {
        Self {
            sim,
            player,
            empty: PlayerUnits::default(),
        }
    }

    /// Current simulation tick.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.sim.get_tick()
    }
}

impl PlayerFacade for PlayerHandle<'_> {
    fn player_id(&self) -> PlayerId {
        self.player
    }

    fn units(&self) -> &PlayerUnits {
        self.sim
            .player(self.player)
            .map_or(&self.empty, |player| &player.units)
    }

    fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.sim.unit(id)
    }

    fn stored_energy(&self) -> Fixed {
        self.sim.stored_energy(self.player)
    }

    fn opponents(&self) -> Vec<PlayerId> {
        self.sim
            .active_players()
            .map(|player| player.id)
            .filter(|&id| id != self.player)
            .collect()
    }

    fn opponent_targets(&self, opponent: PlayerId) -> Vec<EntityId> {
        if opponent == self.player {
            return Vec::new();
        }
        self.sim
            .player(opponent)
            .map(|player| player.units.all_killable_collidable_units())
            .unwrap_or_default()
    }

    fn power_sources(&self) -> Vec<PowerSourceInfo> {
        self.sim
            .power_sources()
            .iter()
            .filter_map(|&id| self.sim.unit(id))
            .map(|source| PowerSourceInfo {
                id: source.id(),
                position: source.position(),
                structure: source.site.and_then(|site| site.structure),
            })
            .collect()
    }

    fn assign_order(&mut self, unit: EntityId, order: Order) -> Result<()> {
        self.sim.assign_order(self.player, unit, order)
    }
}

impl Simulation {
    /// Facade acting for `player`.
    pub fn facade(&mut self, player: PlayerId) -> PlayerHandle<'_> {
        PlayerHandle::new(self, player)
    }
}
