//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary with a throwaway data directory and verify
//! outputs.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    run_cli_with_input(home, args, "")
}

fn run_cli_with_input(home: &Path, args: &[&str], input: &str) -> (String, String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_shadowbox-cli"))
        .args(args)
        .env("SHADOWBOX_HOME", home)
        .env_remove("SHADOWBOX_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI");

    {
        let mut stdin = child.stdin.take().expect("stdin");
        stdin.write_all(input.as_bytes()).expect("write stdin");
    }
    let output = child.wait_with_output().expect("Failed to run CLI");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);
    (stdout, stderr, code)
}

fn json_lines(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("JSON line"))
        .collect()
}

#[test]
fn test_config_list_shows_defaults() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "list"]);
    assert_eq!(code, 0);
    let config: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(config["workout"]["round_secs"], 180);
    assert_eq!(config["workout"]["rest_secs"], 60);
    assert_eq!(config["workout"]["total_rounds"], 3);
    assert_eq!(config["breathing"]["exercise"], "box");
    assert!(home.path().join("config.toml").exists());
}

#[test]
fn test_config_set_and_get() {
    let home = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(home.path(), &["config", "set", "workout.total_rounds", "5"]);
    assert_eq!(code, 0);
    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "workout.total_rounds"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "5");
}

#[test]
fn test_config_set_clamps_to_range() {
    let home = tempfile::tempdir().unwrap();
    run_cli(home.path(), &["config", "set", "workout.round_secs", "5"]);
    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "workout.round_secs"]);
    assert_eq!(stdout.trim(), "10");
}

#[test]
fn test_config_rejects_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["config", "set", "workout.nope", "1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_config_reset() {
    let home = tempfile::tempdir().unwrap();
    run_cli(home.path(), &["config", "set", "workout.difficulty", "hard"]);
    let (_, _, code) = run_cli(home.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "workout.difficulty"]);
    assert_eq!(stdout.trim(), "medium");
}

#[test]
fn test_combo_is_reproducible_with_seed() {
    let home = tempfile::tempdir().unwrap();
    let args = ["combo", "--tier", "hard", "--count", "4", "--seed", "9", "--json"];
    let (first, _, code) = run_cli(home.path(), &args);
    assert_eq!(code, 0);
    let (second, _, _) = run_cli(home.path(), &args);
    assert_eq!(first, second);

    let combos: Vec<serde_json::Value> = serde_json::from_str(&first).unwrap();
    assert_eq!(combos.len(), 4);
    assert!(combos.iter().all(|c| c["display"].is_string()));
}

#[test]
fn test_easy_combos_are_punches_only() {
    let home = tempfile::tempdir().unwrap();
    for mode in ["library", "procedural"] {
        let (stdout, _, code) = run_cli(
            home.path(),
            &["combo", "--tier", "easy", "--mode", mode, "--count", "10", "--json"],
        );
        assert_eq!(code, 0);
        let combos: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
        for combo in &combos {
            let moves = combo["combo"]["moves"].as_array().unwrap();
            assert!(moves.iter().all(|m| m["kind"] == "punch"), "{combo}");
        }
    }
}

#[test]
fn test_stats_on_fresh_home() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["stats"]);
    assert_eq!(code, 0);
    let stats: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(stats["total_workouts"], 0);
    assert_eq!(stats["current_streak"], 0);
    assert!(stats["last_workout"].is_null());
}

#[test]
fn test_workout_start_and_quit() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli_with_input(
        home.path(),
        &["workout", "--rounds", "2", "--round", "30", "--json"],
        "q\n",
    );
    assert_eq!(code, 0);
    let events = json_lines(&stdout);
    assert_eq!(events[0]["type"], "PhaseStarted");
    assert_eq!(events[0]["phase"], "prepare");
    assert_eq!(events[0]["total_rounds"], 2);
    assert_eq!(events.last().unwrap()["type"], "TimerStopped");
}

#[test]
fn test_stopwatch_marks_rounds() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) =
        run_cli_with_input(home.path(), &["stopwatch", "--json"], "l\nl\nq\n");
    assert_eq!(code, 0);
    let lines = json_lines(&stdout);
    let marked: Vec<_> = lines
        .iter()
        .filter(|v| v["type"] == "RoundMarked")
        .collect();
    assert_eq!(marked.len(), 2);
    assert_eq!(marked[1]["round"], 2);
    // Final line is the split table.
    assert_eq!(lines.last().unwrap().as_array().unwrap().len(), 2);
}

#[test]
fn test_breathe_rejects_unknown_exercise() {
    let home = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(home.path(), &["breathe", "--exercise", "bogus"]);
    assert_ne!(code, 0);
}

#[test]
fn test_stopwatch_ends_when_stdin_closes() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli_with_input(home.path(), &["stopwatch", "--json"], "l\n");
    assert_eq!(code, 0);
    let lines = json_lines(&stdout);
    let marked = lines.iter().filter(|v| v["type"] == "RoundMarked").count();
    assert_eq!(marked, 1);
    assert_eq!(lines.last().unwrap().as_array().unwrap().len(), 1);

    let (_, _, code) = run_cli(home.path(), &["stopwatch", "--json"]);
    assert_eq!(code, 0);
}
