//! Drives one game: AI controllers act, the simulation ticks, and the
//! battlefield is reported as JSON lines.

use std::io::Write;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use rtt_core::components::PlayerId;
use rtt_core::error::GameError;
use rtt_core::scenario::{Scenario, ScenarioError};
use rtt_core::simulation::{Simulation, TickEvents};

use crate::ai::{Controller, ControllerKind};
use crate::protocol::Response;

/// Tick limit used when neither the scenario nor the config sets one.
pub const DEFAULT_MAX_TICKS: u64 = 20_000;

/// Errors that stop a headless game.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The scenario could not be loaded or set up.
    #[error("scenario error: {0}")]
    Scenario(#[from] ScenarioError),

    /// The simulation aborted a tick.
    #[error("simulation error: {0}")]
    Game(#[from] GameError),

    /// Output could not be written.
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),

    /// Results could not be encoded or decoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;

/// How to run a game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Seed for the AI controllers.
    pub seed: u64,
    /// Overrides the scenario's tick limit.
    pub max_ticks: Option<u64>,
    /// Ticks between state lines. 0 writes only the final state.
    pub state_interval: u64,
    /// Controllers assigned to players in order, cycling if there are
    /// more players than entries.
    pub controllers: Vec<ControllerKind>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_ticks: None,
            state_interval: 0,
            controllers: vec![ControllerKind::Existing, ControllerKind::AttackNearest],
        }
    }
}

/// How a finished game went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    /// Scenario name.
    pub scenario: String,
    /// AI seed.
    pub seed: u64,
    /// Ticks simulated.
    pub ticks: u64,
    /// Name of the last player standing, if any.
    pub winner: Option<String>,
    /// State hash after the last tick.
    pub final_hash: u64,
}

/// A simulation plus the controllers playing it.
pub struct GameRunner {
    scenario: String,
    seed: u64,
    sim: Simulation,
    controllers: Vec<(PlayerId, Box<dyn Controller>)>,
    max_ticks: u64,
    state_interval: u64,
}

impl GameRunner {
    /// Set up a game from a scenario.
    pub fn new(scenario: &Scenario, config: &RunConfig) -> Result<Self> {
        let sim = Simulation::from_scenario(scenario)?;
        let kinds = if config.controllers.is_empty() {
            vec![ControllerKind::default()]
        } else {
            config.controllers.clone()
        };
        let controllers = sim
            .players()
            .iter()
            .zip(kinds.iter().cycle())
            .map(|(player, kind)| {
                let seed = config.seed.wrapping_add(u64::from(player.id.0));
                (player.id, kind.build(seed))
            })
            .collect();
        Ok(Self {
            scenario: scenario.name.clone(),
            seed: config.seed,
            sim,
            controllers,
            max_ticks: config
                .max_ticks
                .or(scenario.max_ticks)
                .unwrap_or(DEFAULT_MAX_TICKS),
            state_interval: config.state_interval,
        })
    }

    /// The simulation being played.
    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Whether the game has ended.
    pub fn is_finished(&self) -> bool {
        self.sim.is_over() || self.sim.get_tick() >= self.max_ticks
    }

    /// Let every undefeated player's controller act, then tick once.
    ///
    /// A controller that issues an invalid order loses that order only.
    pub fn step(&mut self) -> Result<TickEvents> {
        for (player, controller) in &mut self.controllers {
            let defeated = self.sim.player(*player).map_or(true, |p| p.is_defeated());
            if defeated {
                continue;
            }
            let mut facade = self.sim.facade(*player);
            if let Err(error) = controller.act(&mut facade) {
                warn!(
                    player = player.0,
                    controller = controller.name(),
                    %error,
                    "controller order rejected"
                );
            }
        }
        Ok(self.sim.tick()?)
    }

    /// Play until the game ends, writing JSON lines to `out`.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<GameOutcome> {
        info!(
            scenario = %self.scenario,
            seed = self.seed,
            max_ticks = self.max_ticks,
            "starting game"
        );
        write_line(out, &Response::ready(&self.scenario, &self.sim))?;

        while !self.is_finished() {
            let events = match self.step() {
                Ok(events) => events,
                Err(error) => {
                    write_line(out, &Response::error(error.to_string()))?;
                    return Err(error);
                }
            };
            if has_roster_changes(&events) {
                write_line(out, &Response::Events(events))?;
            }
            if self.state_interval > 0 && self.sim.get_tick() % self.state_interval == 0 {
                write_line(out, &Response::state(&self.sim))?;
            }
        }

        write_line(out, &Response::state(&self.sim))?;
        write_line(out, &Response::game_over(&self.sim))?;
        out.flush()?;

        let outcome = self.outcome();
        info!(
            ticks = outcome.ticks,
            winner = ?outcome.winner,
            hash = outcome.final_hash,
            "game finished"
        );
        Ok(outcome)
    }

    /// Play until the game ends without writing anything.
    pub fn run_silent(&mut self) -> Result<GameOutcome> {
        while !self.is_finished() {
            self.step()?;
        }
        debug!(scenario = %self.scenario, seed = self.seed, "silent game finished");
        Ok(self.outcome())
    }

    fn outcome(&self) -> GameOutcome {
        GameOutcome {
            scenario: self.scenario.clone(),
            seed: self.seed,
            ticks: self.sim.get_tick(),
            winner: self
                .sim
                .winner()
                .and_then(|id| self.sim.player(id))
                .map(|player| player.name.clone()),
            final_hash: self.sim.state_hash(),
        }
    }
}

fn has_roster_changes(events: &TickEvents) -> bool {
    !events.promoted.is_empty() || !events.reaped.is_empty() || !events.defeated.is_empty()
}

fn write_line<W: Write>(out: &mut W, response: &Response) -> Result<()> {
    out.write_all(response.to_json_line().as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtt_core::scenario::{PlayerSetup, UnitPlacement};
    use rtt_core::unit_kind::UnitKind;

    fn skirmish() -> Scenario {
        Scenario {
            name: "Skirmish".to_string(),
            description: String::new(),
            players: vec![
                PlayerSetup {
                    name: "red".to_string(),
                    unit_cap: None,
                    commander: None,
                    units: vec![UnitPlacement::new(UnitKind::ShotgunTank, -20, 0, 1)],
                },
                PlayerSetup {
                    name: "blue".to_string(),
                    unit_cap: None,
                    commander: None,
                    units: vec![UnitPlacement::new(UnitKind::Bot, 20, 0, 1)],
                },
            ],
            power_sources: Vec::new(),
            max_ticks: Some(2_000),
        }
    }

    fn lines(buffer: &[u8]) -> Vec<serde_json::Value> {
        String::from_utf8(buffer.to_vec())
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_run_writes_ready_first_and_game_over_last() {
        let mut runner = GameRunner::new(&skirmish(), &RunConfig::default()).unwrap();
        let mut out = Vec::new();
        let outcome = runner.run(&mut out).unwrap();

        let lines = lines(&out);
        assert_eq!(lines.first().unwrap()["type"], "ready");
        assert_eq!(lines.last().unwrap()["type"], "game_over");
        assert_eq!(lines.last().unwrap()["hash"], outcome.final_hash);
    }

    #[test]
    fn test_tank_beats_bot() {
        let mut runner = GameRunner::new(&skirmish(), &RunConfig::default()).unwrap();
        let outcome = runner.run_silent().unwrap();
        assert_eq!(outcome.winner.as_deref(), Some("red"));
        assert!(outcome.ticks < 2_000);
    }

    #[test]
    fn test_max_ticks_override() {
        let config = RunConfig {
            max_ticks: Some(5),
            ..RunConfig::default()
        };
        let mut scenario = skirmish();
        scenario.players[0].units[0].x = -2_000;
        let mut runner = GameRunner::new(&scenario, &config).unwrap();
        let outcome = runner.run_silent().unwrap();
        assert_eq!(outcome.ticks, 5);
        assert_eq!(outcome.winner, None);
    }

    #[test]
    fn test_state_interval() {
        let config = RunConfig {
            max_ticks: Some(10),
            state_interval: 2,
            ..RunConfig::default()
        };
        let mut scenario = skirmish();
        scenario.players[0].units[0].x = -2_000;
        let mut runner = GameRunner::new(&scenario, &config).unwrap();
        let mut out = Vec::new();
        runner.run(&mut out).unwrap();

        let states = lines(&out)
            .iter()
            .filter(|line| line["type"] == "state")
            .count();
        // Five periodic snapshots plus the final one.
        assert_eq!(states, 6);
    }

    #[test]
    fn test_same_seed_same_game() {
        let config = RunConfig {
            seed: 11,
            max_ticks: Some(600),
            ..RunConfig::default()
        };
        let a = GameRunner::new(&Scenario::duel(), &config)
            .unwrap()
            .run_silent()
            .unwrap();
        let b = GameRunner::new(&Scenario::duel(), &config)
            .unwrap()
            .run_silent()
            .unwrap();
        assert_eq!(a, b);
    }
}
