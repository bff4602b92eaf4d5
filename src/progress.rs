//! Throughput reporting, checkpoint cadence, and graceful drain.

use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::AnalyzerConfig;
use crate::pool::RunContext;
use crate::store::Checkpointer;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every queued position was processed or abandoned.
    Completed,
    /// The operator cancelled; remaining positions stay queued for resume.
    Interrupted,
}

/// Render an ETA the way an operator reads one.
pub(crate) fn format_eta(seconds: f64) -> String {
    if seconds > 3600.0 {
        format!("{:.1}h", seconds / 3600.0)
    } else if seconds > 60.0 {
        format!("{:.0}m", seconds / 60.0)
    } else {
        format!("{seconds:.0}s")
    }
}

/// Polls the shared counters, drives the checkpoint cadence, and handles
/// cancellation and the final flush.
pub struct ProgressReporter {
    tick: Duration,
    drain_timeout: Duration,
    quiet: bool,
}

impl ProgressReporter {
    /// Build a reporter from the run configuration. Ticks once per second.
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            tick: Duration::from_secs(1),
            drain_timeout: config.drain_timeout,
            quiet: config.quiet,
        }
    }

    /// Run until the workers finish or cancellation fires, then drain and
    /// write the final checkpoint.
    ///
    /// `remaining` is the number of positions queued at startup; it bounds
    /// the progress bar and the ETA arithmetic.
    pub async fn run(
        &self,
        ctx: &RunContext,
        checkpointer: &mut Checkpointer,
        remaining: usize,
        workers: Vec<JoinHandle<()>>,
    ) -> RunOutcome {
        let bar = if self.quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new(remaining as u64);
            bar.set_style(
                ProgressStyle::with_template("[{pos}/{len}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        };

        let started = Instant::now();
        let mut interval = tokio::time::interval(self.tick);
        let mut cancel = ctx.cancel.clone();
        let mut cancel_open = true;

        let outcome = loop {
            tokio::select! {
                _ = interval.tick() => {
                    let done = ctx.done_count();
                    bar.set_position(done as u64);
                    if done > 0 {
                        let avg = started.elapsed().as_secs_f64() / done as f64;
                        let eta = (remaining.saturating_sub(done)) as f64 * avg;
                        let last = ctx
                            .last_completed
                            .lock()
                            .map(|l| l.clone())
                            .unwrap_or_default();
                        bar.set_message(format!(
                            "{last} | {avg:.1}s/pos | ETA: {}",
                            format_eta(eta)
                        ));
                    }
                    checkpointer.maybe_flush(&ctx.store, done).await;

                    if workers.iter().all(|handle| handle.is_finished()) {
                        break RunOutcome::Completed;
                    }
                }
                changed = cancel.changed(), if cancel_open => {
                    match changed {
                        Ok(()) if *cancel.borrow() => break RunOutcome::Interrupted,
                        Ok(()) => {}
                        Err(_) => cancel_open = false,
                    }
                }
            }
        };

        if outcome == RunOutcome::Interrupted {
            info!("cancellation received; waiting for in-flight positions");
            let drain = async {
                for handle in workers {
                    let _ = handle.await;
                }
            };
            if tokio::time::timeout(self.drain_timeout, drain).await.is_err() {
                warn!(
                    "drain exceeded {:?}; abandoning in-flight positions",
                    self.drain_timeout
                );
            }
        }

        let done = ctx.done_count();
        checkpointer.flush(&ctx.store, done).await;
        bar.set_position(done as u64);
        match outcome {
            RunOutcome::Completed => bar.finish_with_message("completed"),
            RunOutcome::Interrupted => bar.abandon_with_message("interrupted"),
        }
        outcome
    }
}
