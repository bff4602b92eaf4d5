//! End-to-end orchestration of one analysis run.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::config::AnalyzerConfig;
use crate::error::{Error, Result};
use crate::input::load_positions;
use crate::pool::{RunContext, WorkerPool};
use crate::progress::{ProgressReporter, RunOutcome};
use crate::queue::WorkQueue;
use crate::store::{Checkpointer, ResultStore};
use crate::types::WorkItem;

/// Final accounting for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Positions analyzed during this invocation.
    pub analyzed: usize,
    /// Positions skipped because a prior run already persisted them.
    pub skipped: usize,
    /// Positions in the input list.
    pub total: usize,
    /// Whether the run drained the queue or was interrupted.
    pub outcome: RunOutcome,
}

/// Positions not yet present in the persisted mapping, in input order.
/// The queue is filled from exactly this set, which makes re-invocation
/// after a crash or cancellation idempotent.
fn remaining_items(items: Vec<WorkItem>, completed: &HashSet<u32>) -> Vec<WorkItem> {
    items
        .into_iter()
        .filter(|item| !completed.contains(&item.id))
        .collect()
}

/// Drives a full batch run: resume, dispatch, report, checkpoint.
pub struct Runner {
    config: AnalyzerConfig,
}

impl Runner {
    /// Create a runner for the given configuration.
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Execute the run. `cancel` flips to `true` when the operator asks to
    /// stop; in-flight positions finish naturally and a final checkpoint is
    /// written either way.
    pub async fn run(&self, cancel: watch::Receiver<bool>) -> Result<RunSummary> {
        let items = load_positions(&self.config.positions_path)?;
        let total = items.len();
        info!(total, path = %self.config.positions_path.display(), "positions loaded");

        let store = ResultStore::load(&self.config.output_path);
        let completed = store.completed_ids().await;
        let pending = remaining_items(items, &completed);
        let skipped = total - pending.len();
        let remaining = pending.len();
        info!(remaining, skipped, "resume state computed");

        if pending.is_empty() {
            return Ok(RunSummary {
                analyzed: 0,
                skipped,
                total,
                outcome: RunOutcome::Completed,
            });
        }

        let queue = Arc::new(WorkQueue::new(pending, self.config.pull_timeout));
        let ctx = RunContext::new(queue, store, cancel);
        let workers = WorkerPool::spawn(&self.config, &ctx);

        let mut checkpointer = Checkpointer::new(
            &self.config.output_path,
            self.config.checkpoint_interval,
        );
        let reporter = ProgressReporter::new(&self.config);
        let outcome = reporter
            .run(&ctx, &mut checkpointer, remaining, workers)
            .await;

        // All workers bailing before a single engine came up is a setup
        // problem, not an empty run.
        if ctx.started_count() == 0 {
            return Err(Error::Protocol(format!(
                "no engine worker started; check the engine at {}",
                self.config.engine_path.display()
            )));
        }

        Ok(RunSummary {
            analyzed: ctx.done_count(),
            skipped,
            total,
            outcome,
        })
    }
}
