//! Batch game runner.
//!
//! Runs many seeds of one scenario in parallel using rayon and
//! summarises who won. Every game owns its own simulation; nothing is
//! shared between threads except the read-only scenario.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use rtt_core::scenario::Scenario;

use crate::ai::ControllerKind;
use crate::runner::{GameOutcome, GameRunner, Result, RunConfig, RunnerError};

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Scenario every game starts from.
    pub scenario: Scenario,
    /// Number of games to run.
    pub game_count: u32,
    /// Seed of the first game; game `i` uses `seed_start + i`.
    pub seed_start: u64,
    /// Worker threads (0 = rayon default).
    pub parallel_games: usize,
    /// Overrides the scenario's tick limit.
    pub max_ticks: Option<u64>,
    /// Controllers assigned to players in order.
    pub controllers: Vec<ControllerKind>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenario: Scenario::duel(),
            game_count: 100,
            seed_start: 0,
            parallel_games: 0,
            max_ticks: None,
            controllers: RunConfig::default().controllers,
        }
    }
}

impl BatchConfig {
    /// Create config for a scenario.
    pub fn new(scenario: Scenario, game_count: u32) -> Self {
        Self {
            scenario,
            game_count,
            ..Default::default()
        }
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the tick limit
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    fn run_config(&self, seed: u64) -> RunConfig {
        RunConfig {
            seed,
            max_ticks: self.max_ticks,
            state_interval: 0,
            controllers: self.controllers.clone(),
        }
    }
}

/// Error from one game of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Aggregate results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Games that finished.
    pub total_games: u32,
    /// Games won by each player name.
    pub wins: BTreeMap<String, u32>,
    /// Games without a winner at the tick limit.
    pub draws: u32,
    /// Average game length.
    pub avg_duration_ticks: f64,
    /// Shortest game.
    pub min_duration_ticks: u64,
    /// Longest game.
    pub max_duration_ticks: u64,
}

impl BatchSummary {
    /// Summarise finished games.
    pub fn from_games(games: &[GameOutcome]) -> Self {
        if games.is_empty() {
            return Self::default();
        }
        let mut summary = Self {
            total_games: games.len() as u32,
            min_duration_ticks: u64::MAX,
            ..Self::default()
        };
        let mut total_ticks = 0u64;
        for game in games {
            match &game.winner {
                Some(winner) => *summary.wins.entry(winner.clone()).or_insert(0) += 1,
                None => summary.draws += 1,
            }
            total_ticks += game.ticks;
            summary.min_duration_ticks = summary.min_duration_ticks.min(game.ticks);
            summary.max_duration_ticks = summary.max_duration_ticks.max(game.ticks);
        }
        summary.avg_duration_ticks = total_ticks as f64 / games.len() as f64;
        summary
    }

    /// Fraction of games `player` won.
    pub fn win_rate(&self, player: &str) -> f64 {
        if self.total_games == 0 {
            return 0.0;
        }
        f64::from(self.wins.get(player).copied().unwrap_or(0)) / f64::from(self.total_games)
    }
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Finished games, in seed order
    pub games: Vec<GameOutcome>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Games that aborted
    pub errors: Vec<BatchError>,
    /// Wall-clock runtime
    pub duration_seconds: f64,
}

impl BatchResults {
    /// Write `batch_results.json` and the scenario used (`scenario.ron`)
    /// into `dir`.
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(dir.join("batch_results.json"), json)?;

        let scenario =
            ron::ser::to_string_pretty(&self.config.scenario, ron::ser::PrettyConfig::default())
                .map_err(|e| RunnerError::Io(std::io::Error::other(e)))?;
        std::fs::write(dir.join("scenario.ron"), scenario)?;
        Ok(())
    }

    /// Load results written by [`BatchResults::save`].
    pub fn load(dir: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(dir.join("batch_results.json"))?;
        Ok(serde_json::from_str(&json)?)
    }
}

fn run_single_game(config: &BatchConfig, seed: u64) -> Result<GameOutcome> {
    GameRunner::new(&config.scenario, &config.run_config(seed))?.run_silent()
}

fn run_games(config: &BatchConfig, seeds: &[u64]) -> Vec<(u64, Result<GameOutcome>)> {
    let run = || -> Vec<(u64, Result<GameOutcome>)> {
        seeds
            .par_iter()
            .map(|&seed| {
                let result = run_single_game(config, seed);
                debug!(seed, ok = result.is_ok(), "batch game done");
                (seed, result)
            })
            .collect()
    };
    if config.parallel_games == 0 {
        return run();
    }
    match rayon::ThreadPoolBuilder::new()
        .num_threads(config.parallel_games)
        .build()
    {
        Ok(pool) => pool.install(run),
        Err(error) => {
            warn!(%error, "could not build thread pool, using the global one");
            run()
        }
    }
}

/// Run a batch of games.
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    info!(
        scenario = %config.scenario.name,
        games = config.game_count,
        seed_start = config.seed_start,
        "starting batch run"
    );

    let seeds: Vec<u64> = (0..config.game_count)
        .map(|i| config.seed_start.wrapping_add(u64::from(i)))
        .collect();

    let mut games = Vec::with_capacity(seeds.len());
    let mut errors = Vec::new();
    for (seed, result) in run_games(&config, &seeds) {
        match result {
            Ok(outcome) => games.push(outcome),
            Err(error) => {
                warn!(seed, %error, "game failed");
                errors.push(BatchError {
                    seed,
                    message: error.to_string(),
                });
            }
        }
    }

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();
    info!(
        games = games.len(),
        failed = errors.len(),
        duration_secs = format!("{duration_seconds:.1}"),
        "batch complete"
    );

    BatchResults {
        config,
        games,
        summary,
        errors,
        duration_seconds,
    }
}

/// Outcome of replaying one seed several times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Seed replayed.
    pub seed: u64,
    /// Final state hash of each run.
    pub hashes: Vec<u64>,
    /// Tick count of each run.
    pub ticks: Vec<u64>,
}

impl VerifyReport {
    /// Whether every run ended in the same state at the same tick.
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|pair| pair[0] == pair[1])
            && self.ticks.windows(2).all(|pair| pair[0] == pair[1])
    }
}

/// Play the same seed `runs` times in parallel and collect the final hashes.
pub fn verify_determinism(config: &BatchConfig, seed: u64, runs: u32) -> Result<VerifyReport> {
    let seeds = vec![seed; runs as usize];
    let mut hashes = Vec::with_capacity(seeds.len());
    let mut ticks = Vec::with_capacity(seeds.len());
    for (_, result) in run_games(config, &seeds) {
        let outcome = result?;
        hashes.push(outcome.final_hash);
        ticks.push(outcome.ticks);
    }
    let report = VerifyReport { seed, hashes, ticks };
    if report.is_deterministic() {
        info!(seed, runs, "determinism verified");
    } else {
        warn!(seed, hashes = ?report.hashes, "runs diverged");
    }
    Ok(report)
}
