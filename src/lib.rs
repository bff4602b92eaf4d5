//! fishbatch: parallel UCI engine batch analyzer with resumable checkpoints.
//!
//! Coordinates a fixed pool of engine processes (one per worker) to evaluate
//! a batch of positions over the UCI line protocol. Completed results are
//! checkpointed atomically so an interrupted run resumes where it left off,
//! and a status line reports throughput and ETA while the batch runs.

pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod pool;
pub mod progress;
pub mod queue;
pub mod runner;
pub mod store;
pub mod types;

pub use config::AnalyzerConfig;
pub use error::{Error, Result};
pub use progress::RunOutcome;
pub use runner::{RunSummary, Runner};
