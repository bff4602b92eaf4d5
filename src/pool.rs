//! Worker pool: N tasks, each owning one long-lived engine session.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::AnalyzerConfig;
use crate::engine::EngineSession;
use crate::queue::WorkQueue;
use crate::store::ResultStore;

/// Shared state handed to every pool component.
///
/// The queue and store carry their own locking; the counters here are the
/// only other mutable state the workers and the reporter share.
#[derive(Clone)]
pub struct RunContext {
    /// Pending positions.
    pub queue: Arc<WorkQueue>,
    /// Completed results.
    pub store: ResultStore,
    /// Positions completed during this run.
    pub done: Arc<AtomicUsize>,
    /// Workers that brought an engine session up at least once.
    pub started: Arc<AtomicUsize>,
    /// Short label describing the most recent completion.
    pub last_completed: Arc<Mutex<String>>,
    /// Cooperative cancellation signal.
    pub cancel: watch::Receiver<bool>,
}

impl RunContext {
    /// Build a context over a filled queue and a seeded store.
    pub fn new(queue: Arc<WorkQueue>, store: ResultStore, cancel: watch::Receiver<bool>) -> Self {
        Self {
            queue,
            store,
            done: Arc::new(AtomicUsize::new(0)),
            started: Arc::new(AtomicUsize::new(0)),
            last_completed: Arc::new(Mutex::new(String::new())),
            cancel,
        }
    }

    /// Positions completed so far in this run.
    pub fn done_count(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }

    /// Workers that reached a ready engine. Zero after the pool drains
    /// means the engine binary itself is unusable.
    pub fn started_count(&self) -> usize {
        self.started.load(Ordering::Relaxed)
    }

    fn record_completion(&self, id: u32, depth: u32) {
        self.done.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_completed.lock() {
            *last = format!("#{id} @ d{depth}");
        }
    }

    fn cancelled(&self) -> bool {
        *self.cancel.borrow()
    }
}

/// Spawns and tracks the fixed set of analysis workers.
pub struct WorkerPool;

impl WorkerPool {
    /// Launch `config.workers` tasks pulling from the shared queue.
    pub fn spawn(config: &AnalyzerConfig, ctx: &RunContext) -> Vec<JoinHandle<()>> {
        (0..config.workers)
            .map(|worker_id| {
                let config = config.clone();
                let ctx = ctx.clone();
                tokio::spawn(worker_loop(worker_id, config, ctx))
            })
            .collect()
    }
}

/// Spawn an engine process and walk it through handshake and configuration.
async fn new_session(config: &AnalyzerConfig) -> crate::error::Result<EngineSession> {
    let mut session = EngineSession::spawn(config)?;
    session.start().await?;
    session.configure().await?;
    Ok(session)
}

/// One worker: pull positions until the queue is exhausted or cancellation
/// is observed, driving a single reused engine session.
///
/// A failed job is abandoned for this run; it stays out of the store and
/// becomes eligible again on the next invocation. The broken session is
/// replaced so the worker can keep going.
async fn worker_loop(worker_id: u32, config: AnalyzerConfig, ctx: RunContext) {
    let mut session = match new_session(&config).await {
        Ok(session) => session,
        Err(err) => {
            warn!(worker_id, error = %err, "engine failed to start; worker exiting");
            return;
        }
    };
    ctx.started.fetch_add(1, Ordering::Relaxed);
    debug!(worker_id, "engine ready");

    loop {
        if ctx.cancelled() {
            break;
        }
        let Some(item) = ctx.queue.pull().await else {
            break;
        };

        match session.analyze(&item.fen).await {
            Ok(result) => {
                let depth = result.depth;
                ctx.store.upsert(item.id, result.into_eval(&item.fen)).await;
                ctx.record_completion(item.id, depth);
            }
            Err(err) => {
                warn!(worker_id, id = item.id, error = %err, "analysis failed; abandoning position");
                session.shutdown().await;
                session = match new_session(&config).await {
                    Ok(session) => session,
                    Err(err) => {
                        warn!(worker_id, error = %err, "engine restart failed; worker exiting");
                        return;
                    }
                };
            }
        }
    }

    session.shutdown().await;
    info!(worker_id, "worker finished");
}
