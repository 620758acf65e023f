//! Crate-level error type.
//!
//! Each subsystem owns its own error enum; this type gathers the ones that
//! can abort startup so the binary has a single thing to report.

use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::transport::TransportError;

/// Errors that stop the process.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A socket could not be bound or used.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Listener or server I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A background task panicked or was cancelled.
    #[error("task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result type for startup and process-level operations.
pub type Result<T> = std::result::Result<T, Error>;
