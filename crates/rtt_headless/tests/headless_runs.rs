//! End-to-end runs of the headless crate against scenario files on disk.

use std::io::Write;

use rtt_core::scenario::Scenario;
use rtt_headless::{
    ai::ControllerKind,
    batch::{run_batch, verify_determinism, BatchConfig, BatchResults},
    load_scenario,
    runner::{GameRunner, RunConfig},
};
use rtt_test_utils::fixtures::{economy_scenario, tank_battle_scenario};

fn write_scenario(scenario: &Scenario) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(scenario.to_ron_string().unwrap().as_bytes())
        .unwrap();
    file
}

#[test]
fn scenario_file_round_trips_through_disk() {
    let file = write_scenario(&tank_battle_scenario());
    let loaded = load_scenario(Some(file.path())).unwrap();
    assert_eq!(loaded, tank_battle_scenario());
}

#[test]
fn missing_scenario_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_scenario(Some(&dir.path().join("nope.ron"))).is_err());
}

#[test]
fn no_scenario_means_the_duel() {
    assert_eq!(load_scenario(None).unwrap(), Scenario::duel());
}

#[test]
fn run_streams_json_lines() {
    let file = write_scenario(&economy_scenario());
    let scenario = load_scenario(Some(file.path())).unwrap();
    let config = RunConfig {
        seed: 3,
        max_ticks: Some(400),
        state_interval: 100,
        controllers: vec![ControllerKind::AttackNearest],
    };
    let mut out = Vec::new();
    let outcome = GameRunner::new(&scenario, &config)
        .unwrap()
        .run(&mut out)
        .unwrap();
    assert_eq!(outcome.ticks, 400);

    let lines: Vec<serde_json::Value> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines[0]["type"], "ready");
    assert_eq!(lines[0]["players"][1], "blue");

    let last_state = lines
        .iter()
        .filter(|line| line["type"] == "state")
        .last()
        .unwrap();
    assert_eq!(last_state["tick"], 400);
    // Both commanders have started building by now.
    let units = last_state["units"].as_array().unwrap();
    assert!(units.iter().any(|unit| unit["kind"] == "Factory"));
}

#[test]
fn batch_results_are_written_and_reloaded() {
    let dir = tempfile::tempdir().unwrap();
    let config = BatchConfig::new(tank_battle_scenario(), 3)
        .with_seed(5)
        .with_max_ticks(1_500);
    let results = run_batch(config);
    results.save(dir.path()).unwrap();

    assert!(dir.path().join("scenario.ron").exists());
    let saved = Scenario::load(dir.path().join("scenario.ron")).unwrap();
    assert_eq!(saved, tank_battle_scenario());

    let reloaded = BatchResults::load(dir.path()).unwrap();
    assert_eq!(reloaded.games, results.games);
    assert_eq!(reloaded.summary.total_games, 3);
}

#[test]
fn verify_reports_identical_hashes() {
    let config = BatchConfig::new(tank_battle_scenario(), 1).with_max_ticks(500);
    let report = verify_determinism(&config, 99, 4).unwrap();
    assert!(report.is_deterministic());
    assert_eq!(report.ticks.len(), 4);
}

#[test]
fn different_seeds_can_be_replayed_individually() {
    let config = BatchConfig::new(Scenario::duel(), 2)
        .with_seed(40)
        .with_max_ticks(800);
    let results = run_batch(config);
    for game in &results.games {
        let replay = GameRunner::new(
            &Scenario::duel(),
            &RunConfig {
                seed: game.seed,
                max_ticks: Some(800),
                ..RunConfig::default()
            },
        )
        .unwrap()
        .run_silent()
        .unwrap();
        assert_eq!(&replay, game);
    }
}
