//! Headless battle runner.
//!
//! Plays simulations without graphics, with AI controllers on every side.
//!
//! # Usage
//!
//! ```bash
//! # Play one game of the built-in duel, state every 600 ticks
//! cargo run -p rtt_headless -- run --state-interval 600
//!
//! # Batch run for balance testing
//! cargo run -p rtt_headless -- batch --scenario duel.ron --count 1000 --output results/
//!
//! # Verify determinism
//! cargo run -p rtt_headless -- verify --seed 12345 --runs 5
//! ```
//!
//! Output (stdout): JSON lines. Logs (stderr): human-readable.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rtt_headless::{
    ai::ControllerKind,
    batch::{run_batch, verify_determinism, BatchConfig},
    load_scenario,
    runner::{GameRunner, RunConfig},
};

#[derive(Parser)]
#[command(name = "rtt_headless")]
#[command(about = "Headless real-time tactics runner for AI testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single game, streaming JSON lines to stdout
    Run {
        /// Scenario file to load (default: built-in duel)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Seed for the AI controllers
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Override the scenario's tick limit
        #[arg(long)]
        max_ticks: Option<u64>,

        /// Ticks between state lines (0 = final state only)
        #[arg(long, default_value = "0")]
        state_interval: u64,

        /// Controllers assigned to players in order
        #[arg(long, value_enum, value_delimiter = ',', default_values_t = [ControllerKind::Existing, ControllerKind::AttackNearest])]
        ai: Vec<ControllerKind>,
    },

    /// Run many seeds in parallel and summarise the results
    Batch {
        /// Scenario file to load (default: built-in duel)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of games to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel games (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: usize,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Starting seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Override the scenario's tick limit
        #[arg(long)]
        max_ticks: Option<u64>,

        /// Controllers assigned to players in order
        #[arg(long, value_enum, value_delimiter = ',', default_values_t = [ControllerKind::Existing, ControllerKind::AttackNearest])]
        ai: Vec<ControllerKind>,
    },

    /// Verify determinism by running the same seed several times
    Verify {
        /// Scenario file to load (default: built-in duel)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Override the scenario's tick limit
        #[arg(long)]
        max_ticks: Option<u64>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is for the protocol.
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let command = cli.command.unwrap_or(Commands::Run {
        scenario: None,
        seed: 0,
        max_ticks: None,
        state_interval: 0,
        ai: RunConfig::default().controllers,
    });

    match command {
        Commands::Run {
            scenario,
            seed,
            max_ticks,
            state_interval,
            ai,
        } => cmd_run(scenario, seed, max_ticks, state_interval, ai),
        Commands::Batch {
            scenario,
            count,
            parallel,
            output,
            seed,
            max_ticks,
            ai,
        } => cmd_batch(scenario, count, parallel, output, seed, max_ticks, ai),
        Commands::Verify {
            scenario,
            seed,
            runs,
            max_ticks,
        } => cmd_verify(scenario, seed, runs, max_ticks),
    }
}

/// Play a single game
fn cmd_run(
    scenario: Option<PathBuf>,
    seed: u64,
    max_ticks: Option<u64>,
    state_interval: u64,
    controllers: Vec<ControllerKind>,
) -> ExitCode {
    let scenario = match load_scenario(scenario.as_deref()) {
        Ok(scenario) => scenario,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load scenario");
            return ExitCode::FAILURE;
        }
    };
    let config = RunConfig {
        seed,
        max_ticks,
        state_interval,
        controllers,
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let result = GameRunner::new(&scenario, &config).and_then(|mut runner| runner.run(&mut out));
    let _ = out.flush();
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Game aborted");
            ExitCode::FAILURE
        }
    }
}

/// Run a batch of games for balance testing
fn cmd_batch(
    scenario: Option<PathBuf>,
    count: u32,
    parallel: usize,
    output: PathBuf,
    seed: u64,
    max_ticks: Option<u64>,
    controllers: Vec<ControllerKind>,
) -> ExitCode {
    let scenario = match load_scenario(scenario.as_deref()) {
        Ok(scenario) => scenario,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load scenario");
            return ExitCode::FAILURE;
        }
    };

    let num_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        scenario = %scenario.name,
        count,
        parallel,
        seed,
        output = %output.display(),
        cpus_available = num_cpus,
        "Batch configuration"
    );

    let config = BatchConfig {
        scenario,
        game_count: count,
        seed_start: seed,
        parallel_games: parallel,
        max_ticks,
        controllers,
    };
    let results = run_batch(config);

    if let Err(e) = results.save(&output) {
        tracing::error!(error = %e, path = %output.display(), "Failed to save results");
        return ExitCode::FAILURE;
    }

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Games played: {}", results.games.len());
    if !results.errors.is_empty() {
        eprintln!("Games failed: {}", results.errors.len());
    }
    for (player, wins) in &results.summary.wins {
        eprintln!(
            "  {:<12} {:>5} wins ({:>5.1}%)",
            player,
            wins,
            results.summary.win_rate(player) * 100.0
        );
    }
    eprintln!("  {:<12} {:>5}", "draws", results.summary.draws);
    eprintln!(
        "Average game length: {:.0} ticks",
        results.summary.avg_duration_ticks
    );
    eprintln!("Results saved to: {}", output.display());

    if results.errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Verify determinism
fn cmd_verify(scenario: Option<PathBuf>, seed: u64, runs: u32, max_ticks: Option<u64>) -> ExitCode {
    let scenario = match load_scenario(scenario.as_deref()) {
        Ok(scenario) => scenario,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load scenario");
            return ExitCode::FAILURE;
        }
    };
    let config = BatchConfig {
        max_ticks,
        ..BatchConfig::new(scenario, runs)
    };

    match verify_determinism(&config, seed, runs) {
        Ok(report) if report.is_deterministic() => {
            println!("{}", serde_json::json!({ "deterministic": true, "seed": seed, "hash": report.hashes.first() }));
            ExitCode::SUCCESS
        }
        Ok(report) => {
            println!("{}", serde_json::json!({ "deterministic": false, "seed": seed, "hashes": report.hashes }));
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "Verification aborted");
            ExitCode::FAILURE
        }
    }
}
