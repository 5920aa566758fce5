use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};
use sudoku_bench::arena::MatchRunner;
use sudoku_bench::config::MatchConfig;
use tempfile::tempdir;

fn load_config(output_dir: &Path) -> MatchConfig {
    let yaml = format!(
        r#"
run_id: "test_smoke"
games:
  setup:
    block_rows: 2
    block_cols: 2
    clues: 5
  count: 4
  seed: 4242
turn:
  time_ms: 60000
  max_steps: 2
agents:
  - name: "deep"
    strategy: "minimax"
    params:
      prune_margin: 0.0
  - name: "rollouts"
    strategy: "uct"
    params:
      rollouts_per_step: 6
outputs:
  jsonl: "{jsonl}"
  summary_md: "{summary}"
logging:
  enable_structured: false
"#,
        jsonl = output_dir.join("games.jsonl").display(),
        summary = output_dir.join("summary.md").display(),
    );

    let mut cfg: MatchConfig = serde_yaml::from_str(&yaml).expect("valid yaml");
    cfg.validate().expect("config validates");
    cfg
}

/// Runs a match in `dir` and returns the hex digest of its rows with timing fields zeroed.
fn run_digest(dir: &Path) -> (String, Vec<serde_json::Value>) {
    let config = load_config(dir);
    let outputs = config.resolved_outputs();
    let runner = MatchRunner::new(config, outputs).expect("runner created");
    let summary = runner.run().expect("match completes");

    assert_eq!(summary.games_played, 4);
    assert_eq!(summary.rows_written, 4);
    assert!(summary.summary_path.exists(), "summary markdown missing");
    assert!(summary.telemetry_path.is_none());

    let jsonl = fs::read_to_string(&summary.jsonl_path).expect("jsonl readable");
    let mut normalized = String::new();
    let mut rows = Vec::new();
    for line in jsonl.lines() {
        let mut value: serde_json::Value = serde_json::from_str(line).expect("row decodes to JSON");
        if let Some(seats) = value.get_mut("seats").and_then(|s| s.as_array_mut()) {
            for seat in seats {
                if let Some(speed) = seat.get_mut("speed_ms_turn") {
                    *speed = serde_json::json!(0.0);
                }
            }
        }
        normalized.push_str(&serde_json::to_string(&value).expect("re-serialize normalized row"));
        normalized.push('\n');
        rows.push(value);
    }

    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    (hex::encode(hasher.finalize()), rows)
}

#[test]
fn match_rows_are_reproducible_across_runs() {
    let first_dir = tempdir().expect("temp dir");
    let second_dir = tempdir().expect("temp dir");

    let (first, rows) = run_digest(first_dir.path());
    let (second, _) = run_digest(second_dir.path());
    assert_eq!(first, second, "same seed and step budget must replay identically");

    for (index, row) in rows.iter().enumerate() {
        assert_eq!(row["run_id"], "test_smoke");
        assert_eq!(row["game_index"], index);
        assert_eq!(row["board"], "2x2");
        assert_eq!(row["empty_at_start"], 11);
        assert!(row["forfeit"].is_null(), "search agents never forfeit: {row}");
        let expected_first = if index % 2 == 0 { "deep" } else { "rollouts" };
        assert_eq!(row["seats"][0]["agent"], expected_first);
    }
}

#[test]
fn summary_reports_both_agents() {
    let dir = tempdir().expect("temp dir");
    run_digest(dir.path());
    let text = fs::read_to_string(dir.path().join("summary.md")).expect("summary readable");
    assert!(text.contains("# Match Summary: test_smoke"));
    assert!(text.contains("| deep | minimax | 4 |"));
    assert!(text.contains("| rollouts | uct | 4 |"));
    assert!(text.contains("Wilcoxon signed-rank"));
}
