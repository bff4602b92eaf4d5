//! Shared result mapping and atomic checkpoint persistence.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::Result;
use crate::types::PositionEval;

/// Concurrency-safe mapping of position id to its completed analysis.
///
/// Upsert-only: entries are never removed, and an id written twice keeps
/// the latest value. Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    inner: Arc<RwLock<HashMap<u32, PositionEval>>>,
}

impl ResultStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store from a prior run's persisted file.
    ///
    /// A missing file starts an empty store; an unreadable or corrupt file
    /// is logged and also starts empty, matching a fresh run.
    pub fn load(path: &Path) -> Self {
        let results = match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(map) => map,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "ignoring corrupt results file");
                    HashMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "could not read results file");
                HashMap::new()
            }
        };
        Self {
            inner: Arc::new(RwLock::new(results)),
        }
    }

    /// Insert or replace the result for `id`.
    pub async fn upsert(&self, id: u32, eval: PositionEval) {
        self.inner.write().await.insert(id, eval);
    }

    /// Number of completed results.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether the store holds no results.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Ids already analyzed; used to exclude them from the queue on resume.
    pub async fn completed_ids(&self) -> HashSet<u32> {
        self.inner.read().await.keys().copied().collect()
    }

    /// Consistent clone of the current mapping.
    pub async fn snapshot(&self) -> HashMap<u32, PositionEval> {
        self.inner.read().await.clone()
    }

    /// Persist the current mapping to `path` while holding the read lock,
    /// so concurrent upserts cannot tear the snapshot.
    pub async fn persist(&self, path: &Path) -> Result<()> {
        let guard = self.inner.read().await;
        write_atomic(path, &*guard)
    }
}

/// Write the mapping with the temp-file-then-rename pattern: a crash
/// mid-write leaves the previous durable copy intact.
fn write_atomic(path: &Path, results: &HashMap<u32, PositionEval>) -> Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    let temp_path = path.with_extension("json.tmp");
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(err.into());
    }
    Ok(())
}

/// Periodic persistence of [`ResultStore`] snapshots.
///
/// Flushes after every `interval` completed positions. A failed write is
/// logged and retried at the next interval; the run itself continues.
#[derive(Debug)]
pub struct Checkpointer {
    path: PathBuf,
    interval: usize,
    last_flush: usize,
}

impl Checkpointer {
    /// Create a checkpointer writing to `path` every `interval` completions.
    pub fn new(path: impl Into<PathBuf>, interval: usize) -> Self {
        Self {
            path: path.into(),
            interval,
            last_flush: 0,
        }
    }

    /// Flush if at least `interval` positions completed since the last
    /// successful flush.
    pub async fn maybe_flush(&mut self, store: &ResultStore, done: usize) {
        if self.interval == 0 {
            return;
        }
        if done.saturating_sub(self.last_flush) >= self.interval {
            self.flush(store, done).await;
        }
    }

    /// Unconditional snapshot and persist, used on shutdown and cancellation.
    pub async fn flush(&mut self, store: &ResultStore, done: usize) {
        match store.persist(&self.path).await {
            Ok(()) => {
                self.last_flush = done;
                debug!(path = %self.path.display(), done, "checkpoint written");
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "checkpoint write failed");
            }
        }
    }
}
