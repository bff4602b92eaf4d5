//! CLI-level checks for the fishbatch binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn fishbatch_cmd() -> Command {
    Command::cargo_bin("fishbatch").expect("fishbatch binary")
}

#[test]
fn test_help_lists_configuration_surface() {
    fishbatch_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--workers"))
        .stdout(predicate::str::contains("--movetime-ms"))
        .stdout(predicate::str::contains("--multipv"))
        .stdout(predicate::str::contains("--checkpoint-interval"));
}

#[test]
fn test_missing_positions_file_fails_cleanly() {
    let temp_dir = TempDir::new().expect("temp dir");

    fishbatch_cmd()
        .current_dir(temp_dir.path())
        .arg("--quiet")
        .arg("--positions")
        .arg("does-not-exist.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_rejects_unknown_flag() {
    fishbatch_cmd().arg("--frobnicate").assert().failure();
}
