/// Trestle Error Types
///
/// User-visible failures of the bridge. Everything else is logged and the
/// worker loops stay live.

use std::io;
use thiserror::Error;

/// Main error type for trestle operations
#[derive(Error, Debug)]
pub enum TrestleError {
    /// Invalid arguments to the registration API
    #[error("invalid registration: {0}")]
    Usage(String),

    /// A socket-type name outside the supported enumeration
    #[error("unknown socket type: {0:?}")]
    UnknownSocketType(String),

    /// Error reported by the native messaging library
    #[error("zmq error: {0}")]
    Socket(#[from] zmq::Error),

    /// IO error while spawning a worker thread
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The context has been shut down; no further registrations are possible
    #[error("context has been shut down")]
    Terminated,
}

/// Result type alias for trestle operations
pub type Result<T> = std::result::Result<T, TrestleError>;

impl TrestleError {
    /// Create a usage error with a message
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    /// Check if this error was caused by the caller rather than the system
    #[must_use]
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_) | Self::UnknownSocketType(_))
    }
}
