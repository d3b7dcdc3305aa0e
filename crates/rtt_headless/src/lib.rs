//! Headless battle runner for AI testing and CI verification.
//!
//! This crate plays [`rtt_core`] simulations without a renderer:
//!
//! - **AI testing**: reference controllers play through the player facade
//! - **CI verification**: batch runs and determinism checks over many seeds
//! - **Tooling**: game state streamed as JSON lines on stdout
//!
//! # Protocol
//!
//! - **stdout**: JSON lines (ready, state, events, game over)
//! - **stderr**: logs (human-readable)
//!
//! See [`protocol`] for the line formats.
//!
//! # Example
//!
//! ```bash
//! # Play the built-in duel
//! cargo run -p rtt_headless -- run --state-interval 600
//!
//! # Run a scenario file for 100 seeds
//! cargo run -p rtt_headless -- batch --scenario duel.ron --count 100
//!
//! # Verify determinism
//! cargo run -p rtt_headless -- verify --seed 12345 --runs 5
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ai;
pub mod batch;
#[allow(missing_docs)]
pub mod protocol;
pub mod runner;

pub use ai::{AttackNearestAi, Controller, ControllerKind, ExistingAi};
pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults, BatchSummary};
pub use protocol::Response;
pub use runner::{GameOutcome, GameRunner, RunConfig, RunnerError};

use std::path::Path;

use rtt_core::scenario::{Scenario, ScenarioError};

/// Load a scenario file, or the built-in duel when no path is given.
pub fn load_scenario(path: Option<&Path>) -> Result<Scenario, ScenarioError> {
    match path {
        Some(path) => Scenario::load(path),
        None => Ok(Scenario::duel()),
    }
}
