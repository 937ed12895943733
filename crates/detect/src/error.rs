//! Error types for detection sources, configuration and the engine.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single call into an OS-facing source.
///
/// Always transient from the engine's point of view: the poll cycle that
/// hit it is abandoned and the next one runs on schedule.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("command execution failed: {0}")]
    ExecutionFailed(String),

    #[error("command exited with status {code:?}: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed output: {0}")]
    Parse(String),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to watch '{path}': {message}")]
    Watch { path: PathBuf, message: String },

    #[error("source unavailable: {0}")]
    Unavailable(String),
}

/// Errors loading a [`crate::DetectConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Engine-level failures surfaced through [`crate::DetectEvent::Error`].
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("no async runtime available: {0}")]
    NoRuntime(String),
}
