//! Transport layer errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to start helper {path}: {reason}")]
    Spawn { path: String, reason: String },

    #[error("Helper I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Helper exited with {status}: {stderr}")]
    HelperExited { status: String, stderr: String },

    #[error("Helper did not answer within {0}s")]
    Timeout(u64),

    #[error("Malformed helper message: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Reply {got} does not answer request {expected}")]
    ReplyMismatch { expected: String, got: String },
}
