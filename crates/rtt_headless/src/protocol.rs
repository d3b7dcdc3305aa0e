//! JSON-lines output protocol.
//!
//! The runner writes one JSON object per line to stdout:
//!
//! 1. `{"type":"ready",...}` once the scenario is loaded
//! 2. `{"type":"state",...}` every `state_interval` ticks
//! 3. `{"type":"events",...}` for ticks where units were promoted, reaped
//!    or players defeated
//! 4. `{"type":"game_over",...}` when one player is left or time runs out
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","scenario":"Duel","tick":0,"players":["red","blue"]}
//! <- {"type":"events","tick":120,"promoted":[[0,9]],"reaped":[],"removed":[],"defeated":[]}
//! <- {"type":"state","tick":200,"hash":1234,"players":[...],"units":[...]}
//! <- {"type":"game_over","tick":9000,"winner":"red","hash":5678}
//! ```

use serde::{Deserialize, Serialize};

use rtt_core::abilities::OrderTag;
use rtt_core::simulation::{Simulation, TickEvents};
use rtt_core::unit::Unit;
use rtt_core::unit_kind::UnitKind;

/// Protocol version reported in [`Response::Ready`].
pub const PROTOCOL_VERSION: &str = "1.0";

/// Lines written by the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// The scenario is loaded and the game is about to start.
    Ready {
        version: String,
        scenario: String,
        tick: u64,
        players: Vec<String>,
    },
    /// Snapshot of the battlefield.
    State {
        tick: u64,
        hash: u64,
        players: Vec<PlayerState>,
        units: Vec<UnitState>,
    },
    /// Roster changes from one tick.
    Events(TickEvents),
    /// The game has ended.
    GameOver {
        tick: u64,
        winner: Option<String>,
        hash: u64,
    },
    /// Something went wrong; the game stops.
    Error { message: String },
}

/// A player in a [`Response::State`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: u8,
    pub name: String,
    pub stored_energy: f64,
    pub unit_count: usize,
    pub constructions: usize,
    pub defeated: bool,
}

/// A unit in a [`Response::State`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitState {
    pub id: u64,
    pub kind: UnitKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<u8>,
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthState>,
    pub built: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderTag>,
}

/// Health of a killable unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthState {
    pub current: f64,
    pub max: f64,
}

impl UnitState {
    /// Describe a unit.
    pub fn from_unit(unit: &Unit) -> Self {
        let position = unit.position();
        Self {
            id: unit.id(),
            kind: unit.kind(),
            player: unit.player().map(|player| player.0),
            x: position.x.to_num(),
            y: position.y.to_num(),
            health: unit.vitals.map(|vitals| HealthState {
                current: vitals.health().to_num(),
                max: vitals.full_health().to_num(),
            }),
            built: unit.is_built(),
            order: unit.current_order().map(|order| order.tag()),
        }
    }
}

impl Response {
    /// Create a ready response.
    pub fn ready(scenario: &str, sim: &Simulation) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            scenario: scenario.to_string(),
            tick: sim.get_tick(),
            players: sim.players().iter().map(|p| p.name.clone()).collect(),
        }
    }

    /// Snapshot the whole battlefield, units in id order.
    pub fn state(sim: &Simulation) -> Self {
        let players = sim
            .players()
            .iter()
            .map(|player| PlayerState {
                id: player.id.0,
                name: player.name.clone(),
                stored_energy: player.stored_energy.to_num(),
                unit_count: player.units.unit_count(),
                constructions: player.units.constructions().len(),
                defeated: player.is_defeated(),
            })
            .collect();
        let units = sim
            .units()
            .sorted_ids()
            .into_iter()
            .filter_map(|id| sim.unit(id))
            .map(UnitState::from_unit)
            .collect();
        Self::State {
            tick: sim.get_tick(),
            hash: sim.state_hash(),
            players,
            units,
        }
    }

    /// Create a game-over response.
    pub fn game_over(sim: &Simulation) -> Self {
        let winner = sim
            .winner()
            .and_then(|id| sim.player(id))
            .map(|player| player.name.clone());
        Self::GameOver {
            tick: sim.get_tick(),
            winner,
            hash: sim.state_hash(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}
