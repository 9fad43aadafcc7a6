//! Integration tests for the wellness binary.
//!
//! These tests verify end-to-end behavior including:
//! - Account registration and sign-in
//! - Mood and habit tracking
//! - Routine playback
//! - Data persistence across runs

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// CLI command isolated from the user's config file
fn cli(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("wellness"));
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env_remove("RUST_LOG");
    cmd
}

fn register(dir: &Path) {
    cli(dir)
        .args(["register", "--email", "ana@example.com"])
        .args(["--password", "secret1", "--name", "Ana"])
        .arg("--data-dir")
        .arg(dir)
        .assert()
        .success();
}

/// Pull the id printed as `(id: ...)`
fn printed_id(stdout: &[u8]) -> String {
    let text = String::from_utf8_lossy(stdout);
    let start = text.find("id: ").expect("no id in output") + 4;
    text[start..]
        .chars()
        .take_while(|c| *c != ')')
        .collect()
}

#[test]
fn test_cli_help() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wellness tracker"));
}

#[test]
fn test_register_and_whoami() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["register", "--email", "ana@example.com"])
        .args(["--password", "secret1", "--name", "Ana"])
        .arg("--data-dir")
        .arg(dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Registered Ana"));

    cli(dir)
        .arg("whoami")
        .arg("--data-dir")
        .arg(dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Ana <ana@example.com>"));

    assert!(dir.join("store.json").exists());
    assert!(dir.join("auth.json").exists());
}

#[test]
fn test_wrong_password_fails() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    register(dir);

    cli(dir)
        .args(["login", "--email", "ana@example.com", "--password", "wrong-pass"])
        .arg("--data-dir")
        .arg(dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid email or password"));
}

#[test]
fn test_logout_then_login() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    register(dir);

    cli(dir)
        .arg("logout")
        .arg("--data-dir")
        .arg(dir)
        .assert()
        .success();

    cli(dir)
        .arg("whoami")
        .arg("--data-dir")
        .arg(dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in"));

    cli(dir)
        .args(["login", "--email", "ANA@example.com", "--password", "secret1"])
        .arg("--data-dir")
        .arg(dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed in as Ana"));
}

#[test]
fn test_mood_requires_sign_in() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["mood", "log", "happy"])
        .arg("--data-dir")
        .arg(dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not signed in"));
}

#[test]
fn test_mood_log_and_list() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    register(dir);

    cli(dir)
        .args(["mood", "log", "Happy", "--note", "sunny walk"])
        .arg("--data-dir")
        .arg(dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged mood: happy"));

    cli(dir)
        .args(["mood", "list"])
        .arg("--data-dir")
        .arg(dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("happy"))
        .stdout(predicate::str::contains("sunny walk"));
}

#[test]
fn test_unknown_mood_rejected() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    register(dir);

    cli(dir)
        .args(["mood", "log", "ecstatic"])
        .arg("--data-dir")
        .arg(dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid input"));
}

#[test]
fn test_mood_delete() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    register(dir);

    let output = cli(dir)
        .args(["mood", "log", "tired"])
        .arg("--data-dir")
        .arg(dir)
        .output()
        .unwrap();
    assert!(output.status.success());
    let id = printed_id(&output.stdout);

    cli(dir)
        .args(["mood", "delete", &id])
        .arg("--data-dir")
        .arg(dir)
        .assert()
        .success();

    cli(dir)
        .args(["mood", "list"])
        .arg("--data-dir")
        .arg(dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("No mood entries"));
}

#[test]
fn test_habit_workflow() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    register(dir);

    let output = cli(dir)
        .args(["habit", "add", "Walk", "--description", "20 minutes outside"])
        .arg("--data-dir")
        .arg(dir)
        .output()
        .unwrap();
    assert!(output.status.success());
    let id = printed_id(&output.stdout);

    cli(dir)
        .args(["habit", "done", &id])
        .arg("--data-dir")
        .arg(dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("streak: 1"));

    cli(dir)
        .args(["habit", "list"])
        .arg("--data-dir")
        .arg(dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("[x] Walk"))
        .stdout(predicate::str::contains("20 minutes outside"));

    cli(dir)
        .args(["habit", "done", &id, "--undo"])
        .arg("--data-dir")
        .arg(dir)
        .assert()
        .success();

    cli(dir)
        .args(["habit", "list"])
        .arg("--data-dir")
        .arg(dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("[ ] Walk"));
}

#[test]
fn test_habit_rename_and_delete() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    register(dir);

    let output = cli(dir)
        .args(["habit", "add", "Read"])
        .arg("--data-dir")
        .arg(dir)
        .output()
        .unwrap();
    let id = printed_id(&output.stdout);

    cli(dir)
        .args(["habit", "rename", &id, "Read 10 pages"])
        .arg("--data-dir")
        .arg(dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Read 10 pages"));

    cli(dir)
        .args(["habit", "delete", &id])
        .arg("--data-dir")
        .arg(dir)
        .assert()
        .success();

    cli(dir)
        .args(["habit", "list"])
        .arg("--data-dir")
        .arg(dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("No habits yet"));
}

#[test]
fn test_unknown_habit_fails() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    register(dir);

    cli(dir)
        .args(["habit", "done", "missing-id"])
        .arg("--data-dir")
        .arg(dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing-id"));
}

#[test]
fn test_stats_summary() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    register(dir);

    for mood in ["happy", "happy", "sad"] {
        cli(dir)
            .args(["mood", "log", mood])
            .arg("--data-dir")
            .arg(dir)
            .assert()
            .success();
    }

    cli(dir)
        .args(["stats", "--days", "7"])
        .arg("--data-dir")
        .arg(dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("entries: 3"))
        .stdout(predicate::str::contains("most frequent: happy"));
}

#[test]
fn test_quote_without_account() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .arg("quote")
        .arg("--data-dir")
        .arg(dir)
        .assert()
        .success()
        .stdout(predicate::str::contains(" - "));
}

#[test]
fn test_routine_categories() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .args(["routine", "categories"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cardio"))
        .stdout(predicate::str::contains("yoga"));
}

#[test]
fn test_unknown_routine_falls_back() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .args(["routine", "show", "underwater-basket-weaving"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Warm-up"))
        .stdout(predicate::str::contains("Cool-down"))
        .stderr(predicate::str::contains("Unknown category"));
}

#[test]
fn test_fast_routine_plays_to_the_end() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .args(["routine", "play", "strength", "--fast"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[1/"))
        .stdout(predicate::str::contains("Routine finished"));
}

#[test]
fn test_interactive_quit() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .args(["routine", "play", "yoga"])
        .write_stdin("q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Routine finished"));
}

#[test]
fn test_input_closed_while_paused_ends_playback() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .args(["routine", "play", "cardio"])
        .write_stdin("p\n")
        .timeout(Duration::from_secs(10))
        .assert()
        .success()
        .stdout(predicate::str::contains("Paused"))
        .stdout(predicate::str::contains("Routine finished"));
}

#[test]
fn test_huge_stats_window_rejected() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    register(dir);

    cli(dir)
        .args(["stats", "--days", "4000000000"])
        .arg("--data-dir")
        .arg(dir)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--days must be between 1 and"));
}

#[test]
fn test_huge_mood_list_window_rejected() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    register(dir);

    cli(dir)
        .args(["mood", "list", "--days", "4000000000"])
        .arg("--data-dir")
        .arg(dir)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--days must be between 1 and"));
}

#[test]
fn test_data_persists_across_runs() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    register(dir);

    cli(dir)
        .args(["habit", "add", "Stretch"])
        .arg("--data-dir")
        .arg(dir)
        .assert()
        .success();

    // A fresh data dir knows nothing about it
    let other = setup_test_dir();
    cli(other.path())
        .args(["habit", "list"])
        .arg("--data-dir")
        .arg(other.path())
        .assert()
        .failure();

    cli(dir)
        .args(["habit", "list"])
        .arg("--data-dir")
        .arg(dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Stretch"));
}
