//! Core simulation loop.
//!
//! The simulation owns every unit through a single arena, the players and
//! their rosters, and the neutral power sources. It advances all of them
//! one tick at a time in a fixed order.
//!
//! # Determinism
//!
//! All operations in this module are fully deterministic:
//! - No floating-point math (uses fixed-point via [`Fixed`])
//! - No system randomness
//! - Consistent iteration order (sorted entity IDs, players in id order)
//! - Same inputs always produce same outputs
//!
//! # Example
//!
//! ```
//! use rtt_core::abilities::{ConstructOrder, Order};
//! use rtt_core::math::Vec2Fixed;
//! use rtt_core::simulation::Simulation;
//! use rtt_core::unit_kind::UnitKind;
//!
//! let mut sim = Simulation::new();
//! let red = sim.add_player("red", Some(50)).unwrap();
//! let commander = sim.spawn_unit(red, UnitKind::Commander, Vec2Fixed::ZERO).unwrap();
//!
//! let order = Order::Construct(ConstructOrder::new(UnitKind::Factory, Vec2Fixed::ZERO));
//! sim.assign_order(red, commander, order).unwrap();
//! sim.tick().unwrap();
//!
//! assert_eq!(sim.get_tick(), 1);
//! assert_eq!(sim.player(red).unwrap().units.constructions().len(), 1);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::abilities::{Order, OrderQueue};
use crate::components::{EntityId, PlayerId};
use crate::error::{GameError, Result};
use crate::math::{Fixed, Vec2Fixed};
use crate::player::Player;
use crate::player_units::RosterReport;
use crate::unit::Unit;
use crate::unit_kind::UnitKind;

/// Storage for all units in the simulation.
///
/// Uses a `HashMap` for O(1) lookup by ID, with deterministic iteration
/// via sorted keys when processing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStorage {
    units: HashMap<EntityId, Unit>,
    next_id: EntityId,
}

impl UnitStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            units: HashMap::new(),
            next_id: 1,
        }
    }

    /// Create a unit of `kind` and return its ID.
    ///
    /// Unbuilt constructable units start at zero health.
    pub fn spawn(
        &mut self,
        kind: UnitKind,
        position: Vec2Fixed,
        player: Option<PlayerId>,
        built: bool,
    ) -> EntityId {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        self.units
            .insert(id, Unit::new(id, kind, position, player, built));
        id
    }

    /// Remove a unit by ID.
    pub fn remove(&mut self, id: EntityId) -> Option<Unit> {
        self.units.remove(&id)
    }

    /// Get a unit by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Get a mutable reference to a unit by ID.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Check if a unit exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.units.contains_key(&id)
    }

    /// Number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Sorted unit IDs for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.units.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate over all units (not in deterministic order).
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &Unit)> {
        self.units.iter()
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvents {
    /// The tick that was just simulated.
    pub tick: u64,
    /// Constructions promoted, per player.
    pub promoted: Vec<(PlayerId, EntityId)>,
    /// Units dropped from rosters, per player.
    pub reaped: Vec<(PlayerId, EntityId)>,
    /// Units removed from the arena.
    pub removed: Vec<EntityId>,
    /// Players that lost their last unit this tick.
    pub defeated: Vec<PlayerId>,
}

impl TickEvents {
    fn record(&mut self, player: PlayerId, report: RosterReport) {
        self.promoted
            .extend(report.promoted.into_iter().map(|id| (player, id)));
        self.reaped
            .extend(report.reaped.into_iter().map(|id| (player, id)));
    }
}

/// The battlefield simulation.
///
/// # Tick Order
///
/// 1. **Targets** - each player's enemy list is taken before anyone moves
/// 2. **Rosters** - every player's roster updates, in player order
/// 3. **Energy** - roster output is banked
/// 4. **Cleanup** - dead units leave the arena and power sources
/// 5. **Bookkeeping** - the tick counter advances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Simulation {
    tick: u64,
    units: UnitStorage,
    players: Vec<Player>,
    power_sources: Vec<EntityId>,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation {
    /// Create an empty simulation at tick 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tick: 0,
            units: UnitStorage::new(),
            players: Vec::new(),
            power_sources: Vec::new(),
        }
    }

    /// Current tick number.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// The unit arena.
    #[must_use]
    pub const fn units(&self) -> &UnitStorage {
        &self.units
    }

    /// Look up a unit.
    #[must_use]
    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.units.get(id)
    }

    /// All players, in id order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Look up a player.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id.index())
    }

    /// Neutral power sources.
    #[must_use]
    pub fn power_sources(&self) -> &[EntityId] {
        &self.power_sources
    }

    /// Add a player with an empty roster.
    ///
    /// Fails once every [`PlayerId`] is taken.
    pub fn add_player(&mut self, name: impl Into<String>, unit_cap: Option<usize>) -> Result<PlayerId> {
        let index = u8::try_from(self.players.len()).map_err(|_| {
            GameError::InvalidState(format!("too many players: {}", self.players.len()))
        })?;
        let id = PlayerId(index);
        self.players.push(Player::new(id, name, unit_cap));
        Ok(id)
    }

    /// Spawn a finished unit for `player` and enroll it in the roster.
    pub fn spawn_unit(&mut self, player: PlayerId, kind: UnitKind, position: Vec2Fixed) -> Result<EntityId> {
        let roster = &mut self
            .players
            .get_mut(player.index())
            .ok_or_else(|| GameError::InvalidState(format!("no such player: {player}")))?
            .units;
        let id = self.units.spawn(kind, position, Some(player), true);
        if let Err(err) = roster.enroll(&self.units, id) {
            self.units.remove(id);
            return Err(err);
        }
        Ok(id)
    }

    /// Place a neutral power source.
    pub fn spawn_power_source(&mut self, position: Vec2Fixed) -> EntityId {
        let id = self.units.spawn(UnitKind::PowerSource, position, None, true);
        self.power_sources.push(id);
        id
    }

    /// Players that still have units.
    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|player| !player.is_defeated())
    }

    /// The last player standing, once every other player is defeated.
    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        let mut active = self.active_players();
        match (active.next(), active.next()) {
            (Some(player), None) if self.players.len() > 1 => Some(player.id),
            _ => None,
        }
    }

    /// Whether at most one player is left.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.active_players().nth(1).is_none()
    }

    fn orders_of(&mut self, player: PlayerId, unit: EntityId) -> Result<&mut OrderQueue> {
        let target = self
            .units
            .get_mut(unit)
            .ok_or(GameError::EntityNotFound(unit))?;
        if !target.ownership.is_owned_by(player) {
            return Err(GameError::NotOwned {
                entity: unit,
                player,
            });
        }
        if target.is_dead() {
            return Err(GameError::EntityNotFound(unit));
        }
        target.orders.as_mut().ok_or(GameError::NotOrderable(unit))
    }

    /// Replace the active order of one of `player`'s units.
    pub fn assign_order(&mut self, player: PlayerId, unit: EntityId, order: Order) -> Result<()> {
        self.orders_of(player, unit)?.set_current(order);
        Ok(())
    }

    /// Queue an order behind the active one.
    pub fn queue_order(&mut self, player: PlayerId, unit: EntityId, order: Order) -> Result<()> {
        self.orders_of(player, unit)?.push(order);
        Ok(())
    }

    /// Killable units belonging to every player except `player`.
    #[must_use]
    pub fn enemies_of(&self, player: PlayerId) -> Vec<EntityId> {
        self.players
            .iter()
            .filter(|other| other.id != player)
            .flat_map(|other| other.units.all_killable_collidable_units())
            .collect()
    }

    /// Advance the simulation by one tick.
    ///
    /// Only an invalid promotion fails a tick; the simulation should not
    /// be advanced further after an error.
    pub fn tick(&mut self) -> Result<TickEvents> {
        let mut events = TickEvents {
            tick: self.tick,
            ..TickEvents::default()
        };
        let was_active: Vec<bool> = self.players.iter().map(|p| !p.is_defeated()).collect();

        let enemies: Vec<Vec<EntityId>> = self
            .players
            .iter()
            .map(|player| self.enemies_of(player.id))
            .collect();

        for (player, enemies) in self.players.iter_mut().zip(&enemies) {
            let report = player.units.update(&mut self.units, enemies)?;
            events.record(player.id, report);
        }

        for player in &mut self.players {
            player.stored_energy += player.units.energy_output(&self.units);
        }

        events.removed = self.collect_dead();
        for player in &mut self.players {
            let mut report = RosterReport::default();
            player.units.reap(&self.units, &mut report);
            events.record(player.id, report);
        }

        for (player, was_active) in self.players.iter().zip(was_active) {
            if was_active && player.is_defeated() {
                tracing::info!(player = %player.id, name = %player.name, "Player defeated");
                events.defeated.push(player.id);
            }
        }

        self.tick += 1;
        tracing::debug!(tick = self.tick, hash = self.state_hash(), "Tick complete");
        Ok(events)
    }

    /// Remove dead units from the arena and free their power sources.
    fn collect_dead(&mut self) -> Vec<EntityId> {
        let dead: Vec<EntityId> = self
            .units
            .sorted_ids()
            .into_iter()
            .filter(|&id| self.units.get(id).is_some_and(Unit::is_dead))
            .collect();
        for &id in &dead {
            self.units.remove(id);
        }
        for &source in &self.power_sources {
            let structure = self
                .units
                .get(source)
                .and_then(|unit| unit.site)
                .and_then(|site| site.structure);
            if structure.is_some_and(|id| !self.units.contains(id)) {
                if let Some(site) = self.units.get_mut(source).and_then(|unit| unit.site.as_mut()) {
                    site.structure = None;
                }
            }
        }
        dead
    }

    /// Hash of the whole simulation state.
    ///
    /// Two simulations with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);

        let ids = self.units.sorted_ids();
        ids.len().hash(&mut hasher);
        for id in ids {
            if let Some(unit) = self.units.get(id) {
                unit.hash(&mut hasher);
            }
        }

        for player in &self.players {
            player.id.hash(&mut hasher);
            player.stored_energy.to_bits().hash(&mut hasher);
            player.units.all_killable_collidable_units().hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Total energy banked by `player`.
    #[must_use]
    pub fn stored_energy(&self, player: PlayerId) -> Fixed {
        self.player(player)
            .map_or(Fixed::ZERO, |player| player.stored_energy)
    }

    /// Serialize the simulation state for snapshots.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize simulation: {e}")))
    }

    /// Deserialize simulation state from bytes.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize simulation: {e}")))
    }
}
