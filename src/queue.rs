//! Pull-only work queue shared by the worker pool.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::types::WorkItem;

/// FIFO queue of pending positions, filled once at startup.
///
/// A semaphore sized to the fill count backs `pull`: every successful pop
/// forgets one permit, so each item is handed to exactly one caller exactly
/// once. When the permits run out, pulls time out and return `None`, which
/// tells a worker to exit.
pub struct WorkQueue {
    items: Mutex<VecDeque<WorkItem>>,
    permits: Semaphore,
    pull_timeout: Duration,
}

impl WorkQueue {
    /// Build a queue over `items`. No insertion is possible afterwards.
    pub fn new(items: Vec<WorkItem>, pull_timeout: Duration) -> Self {
        let permits = Semaphore::new(items.len());
        Self {
            items: Mutex::new(items.into()),
            permits,
            pull_timeout,
        }
    }

    /// Number of items not yet pulled.
    pub fn len(&self) -> usize {
        self.permits.available_permits()
    }

    /// Whether every item has been pulled.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take the next pending item, waiting up to the pull timeout.
    /// Returns `None` once the queue is exhausted.
    pub async fn pull(&self) -> Option<WorkItem> {
        let permit = tokio::time::timeout(self.pull_timeout, self.permits.acquire())
            .await
            .ok()?
            .ok()?;
        permit.forget();
        self.items.lock().ok()?.pop_front()
    }
}
