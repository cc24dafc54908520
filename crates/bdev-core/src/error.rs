//! Common error types for NVMe backends

use thiserror::Error;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors that can occur in NVMe backends and the forwarder in front of them
#[derive(Debug, Error)]
pub enum BackendError {
    /// The device or driver reported a failure. The message is surfaced as-is
    /// so that per-device results carry the backend's own wording.
    #[error("{0}")]
    Hardware(String),

    /// Failed to reach or run the privileged helper
    #[error("Transport error: {0}")]
    Transport(String),

    /// The privileged helper answered with something unexpected
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl BackendError {
    /// Whether the failure happened on the way to the hardware rather than
    /// on the hardware itself
    pub fn is_transport(&self) -> bool {
        matches!(self, BackendError::Transport(_) | BackendError::Protocol(_))
    }
}
