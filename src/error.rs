//! Error types for the loopback pipeline.

use thiserror::Error;

/// Result type alias for inputloop operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while setting up or tearing down the loopback.
///
/// Per-event conditions (a full queue, a redundant key repeat) are not
/// errors and never surface here.
#[derive(Debug, Error)]
pub enum Error {
    /// The loopback is already running.
    #[error("loopback is already running")]
    AlreadyRunning,

    /// Failed to install a capture hook.
    #[error("failed to start hook: {0}")]
    HookStartFailed(String),

    /// Failed to remove a capture hook.
    #[error("failed to stop hook: {0}")]
    HookStopFailed(String),

    /// The injection facility rejected a batch.
    #[error("failed to inject input: {0}")]
    InjectFailed(String),

    /// Platform-specific error.
    #[error("platform error: {0}")]
    Platform(String),

    /// Thread-related error.
    #[error("thread error: {0}")]
    ThreadError(String),

    /// The requested feature is not supported on this platform.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Invalid or unreadable configuration.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error while reading configuration.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
