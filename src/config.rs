//! Configuration for a batch analysis run.

use std::path::PathBuf;
use std::time::Duration;

/// Fixed per-run settings for the engine pool and checkpointing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// Path to the UCI engine executable.
    pub engine_path: PathBuf,
    /// Search budget per position (`go movetime`).
    pub movetime: Duration,
    /// Threads given to each engine instance (`setoption name Threads`).
    pub engine_threads: u32,
    /// Number of ranked lines to request and retain (`setoption name MultiPV`).
    pub multipv: u32,
    /// Number of parallel workers, each owning one engine process.
    pub workers: u32,
    /// Checkpoint after this many completed positions.
    /// Default: 10
    pub checkpoint_interval: usize,
    /// Whether to enable Chess960 castling rules (`UCI_Chess960`).
    pub chess960: bool,
    /// Maximum wait for each handshake acknowledgment (`uciok`, `readyok`).
    /// Default: 10 seconds
    pub handshake_timeout: Duration,
    /// Maximum wait on an empty queue before a worker gives up.
    /// Default: 1 second
    pub pull_timeout: Duration,
    /// Grace period between `quit` and forced process kill.
    /// Default: 2 seconds
    pub quit_timeout: Duration,
    /// Maximum wait for in-flight jobs after cancellation.
    /// Default: 30 seconds
    pub drain_timeout: Duration,
    /// Input list of `{id, fen}` positions.
    pub positions_path: PathBuf,
    /// Persisted results mapping, read at startup and checkpointed during the run.
    pub output_path: PathBuf,
    /// Suppress the progress line.
    pub quiet: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            engine_path: PathBuf::from("stockfish"),
            movetime: Duration::from_secs(20),
            engine_threads: 4,
            multipv: 3,
            workers: 2,
            checkpoint_interval: 10,
            chess960: true,
            handshake_timeout: Duration::from_secs(10),
            pull_timeout: Duration::from_secs(1),
            quit_timeout: Duration::from_secs(2),
            drain_timeout: Duration::from_secs(30),
            positions_path: PathBuf::from("chess960.json"),
            output_path: PathBuf::from("chess960_evals.json"),
            quiet: false,
        }
    }
}

impl AnalyzerConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the engine executable path.
    pub fn with_engine_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.engine_path = path.into();
        self
    }

    /// Sets the per-position search budget.
    pub fn with_movetime(mut self, movetime: Duration) -> Self {
        self.movetime = movetime;
        self
    }

    /// Sets the number of parallel workers.
    pub fn with_workers(mut self, workers: u32) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the number of retained principal variations.
    pub fn with_multipv(mut self, multipv: u32) -> Self {
        self.multipv = multipv;
        self
    }

    /// Sets the checkpoint interval in completed positions.
    pub fn with_checkpoint_interval(mut self, interval: usize) -> Self {
        self.checkpoint_interval = interval;
        self
    }

    /// Sets the handshake acknowledgment timeout.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Sets the input and output file paths.
    pub fn with_paths(mut self, positions: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        self.positions_path = positions.into();
        self.output_path = output.into();
        self
    }
}
