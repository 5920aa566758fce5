use std::fs;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::tempdir;

const VALID_YAML: &str = r#"
run_id: "cli_check"
games:
  setup:
    block_rows: 2
    block_cols: 2
    clues: 6
  count: 2
  seed: 7
agents:
  - name: "deep"
    strategy: "minimax"
  - name: "floor"
    strategy: "random"
outputs:
  jsonl: "out/{run_id}/games.jsonl"
  summary_md: "out/{run_id}/summary.md"
"#;

#[test]
fn validate_only_accepts_a_good_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bench.yaml");
    fs::write(&path, VALID_YAML).unwrap();

    Command::cargo_bin("sudoku-bench")
        .unwrap()
        .current_dir(dir.path())
        .arg("--config")
        .arg(&path)
        .arg("--validate-only")
        .assert()
        .success()
        .stdout(predicate::str::contains("deep (minimax) vs floor (random)"))
        .stdout(predicate::str::contains(
            "Validation-only mode: match execution skipped.",
        ));

    assert!(!dir.path().join("out").exists(), "validation must not write outputs");
}

#[test]
fn invalid_config_fails_with_field_name() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bench.yaml");
    fs::write(&path, VALID_YAML.replace("count: 2", "count: 0")).unwrap();

    Command::cargo_bin("sudoku-bench")
        .unwrap()
        .arg("--config")
        .arg(&path)
        .arg("--validate-only")
        .assert()
        .failure()
        .stderr(predicate::str::contains("games.count"));
}

#[test]
fn cli_overrides_are_validated() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bench.yaml");
    fs::write(&path, VALID_YAML).unwrap();

    Command::cargo_bin("sudoku-bench")
        .unwrap()
        .arg("--config")
        .arg(&path)
        .args(["--max-steps", "0", "--validate-only"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("turn.max_steps"));
}

#[test]
fn full_run_writes_rows_and_summary() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bench.yaml");
    fs::write(&path, VALID_YAML).unwrap();

    Command::cargo_bin("sudoku-bench")
        .unwrap()
        .current_dir(dir.path())
        .arg("--config")
        .arg(&path)
        .args(["--max-steps", "1", "--run-id", "override"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Match complete for 'override': 2 games"));

    let rows = fs::read_to_string(dir.path().join("out/override/games.jsonl")).unwrap();
    assert_eq!(rows.lines().count(), 2);
    assert!(dir.path().join("out/override/summary.md").exists());
}
