use std::io;

use thiserror::Error;

/// Errors that can occur while driving an engine or persisting results.
#[derive(Error, Debug)]
pub enum Error {
    /// The engine violated the UCI conversation: a missing acknowledgment,
    /// an unexpected stream close, or a session used in the wrong state.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// IO error during file or process operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for analyzer operations.
pub type Result<T> = std::result::Result<T, Error>;
