//! End-to-end runs against a stub UCI engine: resume, checkpointing,
//! and cooperative cancellation.

mod common;

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::watch;

use fishbatch::types::{PositionEval, PvLine};
use fishbatch::{AnalyzerConfig, RunOutcome, Runner};

fn write_positions(dir: &Path, ids: &[u32]) -> std::path::PathBuf {
    let positions: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| serde_json::json!({ "id": id, "fen": format!("fen-{id}") }))
        .collect();
    let path = dir.join("positions.json");
    fs::write(
        &path,
        serde_json::to_string(&serde_json::json!({ "positions": positions })).expect("serialize"),
    )
    .expect("write positions");
    path
}

fn seed_result(path: &Path, id: u32) {
    let mut seeded: HashMap<u32, PositionEval> = HashMap::new();
    seeded.insert(
        id,
        PositionEval {
            fen: format!("fen-{id}"),
            depth: 30,
            pvs: vec![PvLine {
                moves: "e2e4".to_string(),
                eval: 0.5,
                mate: None,
            }],
            analyzed_at: chrono::Utc::now(),
        },
    );
    fs::write(path, serde_json::to_string(&seeded).expect("serialize")).expect("seed output");
}

fn read_results(path: &Path) -> HashMap<u32, PositionEval> {
    serde_json::from_str(&fs::read_to_string(path).expect("read output")).expect("parse output")
}

fn test_config(dir: &TempDir, engine: std::path::PathBuf, positions: std::path::PathBuf) -> AnalyzerConfig {
    let mut config = AnalyzerConfig::new()
        .with_engine_path(engine)
        .with_movetime(Duration::from_millis(10))
        .with_workers(2)
        .with_checkpoint_interval(1)
        .with_handshake_timeout(Duration::from_secs(5))
        .with_paths(positions, dir.path().join("evals.json"));
    config.quiet = true;
    config
}

#[tokio::test]
async fn test_run_resumes_past_persisted_ids() {
    let dir = TempDir::new().expect("temp dir");
    let engine = common::write_stub_engine(dir.path(), 0);
    let positions = write_positions(dir.path(), &[1, 2, 3]);
    let config = test_config(&dir, engine, positions);
    seed_result(&config.output_path, 1);

    let (_cancel_tx, cancel_rx) = watch::channel(false);
    let summary = Runner::new(config.clone())
        .run(cancel_rx)
        .await
        .expect("run");

    assert_eq!(summary.total, 3);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.analyzed, 2);
    assert_eq!(summary.outcome, RunOutcome::Completed);

    let results = read_results(&config.output_path);
    let mut ids: Vec<u32> = results.keys().copied().collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3]);
    for eval in results.values() {
        assert!(eval.pvs.len() <= 3);
        assert!(!eval.pvs.is_empty());
    }

    // The pre-seeded result was not re-analyzed.
    assert_eq!(results[&1].depth, 30);
    assert_eq!(results[&2].depth, 12);
    assert_eq!(results[&2].pvs[2].mate, Some(-4));
    assert_eq!(results[&2].pvs[2].eval, -9999.0);
}

#[tokio::test]
async fn test_run_with_everything_persisted_is_a_no_op() {
    let dir = TempDir::new().expect("temp dir");
    let engine = common::write_stub_engine(dir.path(), 0);
    let positions = write_positions(dir.path(), &[1]);
    let config = test_config(&dir, engine, positions);
    seed_result(&config.output_path, 1);

    let (_cancel_tx, cancel_rx) = watch::channel(false);
    let summary = Runner::new(config).run(cancel_rx).await.expect("run");

    assert_eq!(summary.analyzed, 0);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.outcome, RunOutcome::Completed);
}

#[tokio::test]
async fn test_cancellation_preserves_a_superset_of_prior_state() {
    let dir = TempDir::new().expect("temp dir");
    // Slow searches so the cancel lands while jobs are in flight.
    let engine = common::write_stub_engine(dir.path(), 1);
    let positions = write_positions(dir.path(), &[1, 2, 3, 4, 5, 6]);
    let config = test_config(&dir, engine, positions);
    seed_result(&config.output_path, 1);

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let runner_config = config.clone();
    let run = tokio::spawn(async move { Runner::new(runner_config).run(cancel_rx).await });

    tokio::time::sleep(Duration::from_millis(300)).await;
    cancel_tx.send(true).expect("send cancel");

    let summary = run.await.expect("join").expect("run");
    assert_eq!(summary.outcome, RunOutcome::Interrupted);
    assert!(summary.analyzed < 5, "cancel should leave work behind");

    // Final persisted state is a superset of the state at run start.
    let results = read_results(&config.output_path);
    assert!(results.contains_key(&1));
    assert_eq!(results.len(), summary.analyzed + 1);
}

#[tokio::test]
async fn test_unspawnable_engine_is_an_error_not_a_completed_run() {
    let dir = TempDir::new().expect("temp dir");
    let positions = write_positions(dir.path(), &[1, 2]);
    let config = test_config(&dir, dir.path().join("no-such-engine"), positions);

    let (_cancel_tx, cancel_rx) = watch::channel(false);
    let err = Runner::new(config)
        .run(cancel_rx)
        .await
        .expect_err("a bad engine path must not look like success");
    assert!(err.to_string().contains("no engine worker started"));
}

#[tokio::test]
async fn test_missing_positions_file_is_an_error() {
    let dir = TempDir::new().expect("temp dir");
    let engine = common::write_stub_engine(dir.path(), 0);
    let config = test_config(&dir, engine, dir.path().join("absent.json"));

    let (_cancel_tx, cancel_rx) = watch::channel(false);
    assert!(Runner::new(config).run(cancel_rx).await.is_err());
}
