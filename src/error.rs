//! Error Types
//!
//! The crate's fallible surface. Cancellation and end-of-input are not
//! errors; `readline` reports them as `Ok(None)`. Degraded terminal
//! capability and history persistence failures are handled internally and
//! never reach the caller.

use thiserror::Error;

/// Errors surfaced by the editing engine
#[derive(Debug, Error)]
pub enum Error {
    /// Terminal read/write failure
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed or written
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
