//! Shared helpers for integration tests: a shell-script UCI engine stub.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Write an executable stub engine that speaks just enough UCI for the
/// analyzer: handshake, canned MultiPV output, `bestmove`, `quit`.
/// `go_delay_secs` slows each search down so cancellation can land mid-run.
pub fn write_stub_engine(dir: &Path, go_delay_secs: u32) -> PathBuf {
    let delay = if go_delay_secs > 0 {
        format!("sleep {go_delay_secs}\n      ")
    } else {
        String::new()
    };
    let body = format!(
        r#"#!/bin/sh
while IFS= read -r line; do
  case "$line" in
    uci) echo "id name stubfish"; echo "uciok" ;;
    isready) echo "readyok" ;;
    go*)
      {delay}echo "info depth 12 multipv 1 score cp 25 pv e2e4 e7e5"
      echo "info depth 12 multipv 2 score cp -8 pv d2d4 d7d5"
      echo "info depth 12 multipv 3 score mate -4 pv g2g4"
      echo "bestmove e2e4"
      ;;
    quit) exit 0 ;;
  esac
done
"#
    );

    let path = dir.join("stub-engine.sh");
    fs::write(&path, body).expect("write stub engine");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod stub engine");
    path
}
