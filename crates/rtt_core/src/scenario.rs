//! Scenario loading and configuration.
//!
//! Scenarios describe the initial battlefield: the players, their unit
//! caps and starting units, and the neutral power sources.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::GameError;
use crate::math::{Fixed, Vec2Fixed};
use crate::simulation::Simulation;
use crate::unit_kind::UnitKind;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The scenario parsed but describes an impossible setup.
    #[error("Invalid scenario: {0}")]
    Setup(#[from] GameError),
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// One entry per player, in player order.
    pub players: Vec<PlayerSetup>,
    /// Power source positions.
    #[serde(default)]
    pub power_sources: Vec<(i32, i32)>,
    /// Stop after this many ticks even without a winner.
    #[serde(default)]
    pub max_ticks: Option<u64>,
}

/// Starting state of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSetup {
    /// Display name.
    pub name: String,
    /// Maximum roster size; `None` for unlimited.
    #[serde(default)]
    pub unit_cap: Option<usize>,
    /// Commander position, if the player starts with one.
    #[serde(default)]
    pub commander: Option<(i32, i32)>,
    /// Other starting units.
    #[serde(default)]
    pub units: Vec<UnitPlacement>,
}

/// A group of identical starting units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPlacement {
    /// Unit kind.
    pub kind: UnitKind,
    /// X of the first unit.
    pub x: i32,
    /// Y of every unit in the group.
    pub y: i32,
    /// How many to place, side by side along x.
    #[serde(default = "one")]
    pub count: u32,
}

const fn one() -> u32 {
    1
}

impl UnitPlacement {
    /// Place `count` units of `kind` starting at `(x, y)`.
    #[must_use]
    pub const fn new(kind: UnitKind, x: i32, y: i32, count: u32) -> Self {
        Self { kind, x, y, count }
    }

    /// Positions of the units in this group.
    pub fn positions(&self) -> impl Iterator<Item = Vec2Fixed> + '_ {
        let spacing = self.kind.metadata().collision_radius * Fixed::from_num(2);
        let origin = Vec2Fixed::from_ints(self.x, self.y);
        (0..self.count).map(move |i| {
            Vec2Fixed::new(origin.x + spacing * Fixed::from_num(i), origin.y)
        })
    }
}

impl PlayerSetup {
    /// A player with just a commander.
    #[must_use]
    pub fn commander_at(name: impl Into<String>, x: i32, y: i32, unit_cap: Option<usize>) -> Self {
        Self {
            name: name.into(),
            unit_cap,
            commander: Some((x, y)),
            units: Vec::new(),
        }
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::duel()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Serialize to pretty RON.
    pub fn to_ron_string(&self) -> Result<String, GameError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()).map_err(|e| {
            GameError::DataParseError {
                path: self.name.clone(),
                message: e.to_string(),
            }
        })
    }

    /// Two commanders facing each other across a field of power sources.
    #[must_use]
    pub fn duel() -> Self {
        Self {
            name: "Duel".to_string(),
            description: "Two commanders, six power sources".to_string(),
            players: vec![
                PlayerSetup::commander_at("red", -300, 0, Some(50)),
                PlayerSetup::commander_at("blue", 300, 0, Some(50)),
            ],
            power_sources: vec![
                (-250, -100),
                (-250, 100),
                (0, -150),
                (0, 150),
                (250, -100),
                (250, 100),
            ],
            max_ticks: Some(20_000),
        }
    }
}

impl Simulation {
    /// Build the initial simulation a scenario describes.
    ///
    /// Starting units are built and enrolled directly in their rosters.
    pub fn from_scenario(scenario: &Scenario) -> Result<Self, ScenarioError> {
        if scenario.players.len() > usize::from(u8::MAX) {
            return Err(GameError::InvalidState(format!(
                "too many players: {}",
                scenario.players.len()
            ))
            .into());
        }
        let mut sim = Self::new();
        for &(x, y) in &scenario.power_sources {
            sim.spawn_power_source(Vec2Fixed::from_ints(x, y));
        }
        for setup in &scenario.players {
            let player = sim.add_player(setup.name.clone(), setup.unit_cap)?;
            if let Some((x, y)) = setup.commander {
                sim.spawn_unit(player, UnitKind::Commander, Vec2Fixed::from_ints(x, y))?;
            }
            for placement in &setup.units {
                for position in placement.positions() {
                    sim.spawn_unit(player, placement.kind, position)?;
                }
            }
        }
        tracing::info!(
            scenario = %scenario.name,
            players = scenario.players.len(),
            units = sim.units().len(),
            "Scenario loaded"
        );
        Ok(sim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scenario() {
        let scenario = Scenario::default();
        let sim = Simulation::from_scenario(&scenario).unwrap();
        assert_eq!(sim.players().len(), 2);
        assert_eq!(sim.power_sources().len(), 6);
        for player in sim.players() {
            assert!(player.units.commander().is_some());
            assert_eq!(player.units.unit_count(), 1);
        }
    }

    #[test]
    fn test_parse_from_ron() {
        let ron = r#"
            (
                name: "Tank line",
                players: [
                    (
                        name: "red",
                        unit_cap: Some(10),
                        units: [(kind: ShotgunTank, x: 0, y: 0, count: 3)],
                    ),
                    (name: "blue", commander: Some((200, 0))),
                ],
                power_sources: [(100, 100)],
            )
        "#;
        let scenario = Scenario::from_ron_str(ron).unwrap();
        assert_eq!(scenario.players[0].units[0].count, 3);
        assert_eq!(scenario.max_ticks, None);

        let sim = Simulation::from_scenario(&scenario).unwrap();
        let red = &sim.players()[0];
        assert_eq!(red.units.vehicles().len(), 3);
        assert!(red.units.commander().is_none());
        let xs: Vec<_> = red
            .units
            .vehicles()
            .iter()
            .map(|&id| sim.unit(id).unwrap().position().x)
            .collect();
        assert_eq!(xs, vec![Fixed::ZERO, Fixed::from_num(16), Fixed::from_num(32)]);
    }

    #[test]
    fn test_ron_round_trip() {
        let scenario = Scenario::duel();
        let text = scenario.to_ron_string().unwrap();
        assert_eq!(Scenario::from_ron_str(&text).unwrap(), scenario);
    }

    #[test]
    fn test_power_source_placement_is_rejected() {
        let mut scenario = Scenario::duel();
        scenario.players[0]
            .units
            .push(UnitPlacement::new(UnitKind::PowerSource, 0, 0, 1));
        assert!(matches!(
            Simulation::from_scenario(&scenario),
            Err(ScenarioError::Setup(GameError::InvalidPromotion { .. }))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Scenario::load("/nonexistent/scenario.ron"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }
}
