//! Protocol error types.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while encoding or decoding wire traffic.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A frame payload exceeds the maximum size.
    #[error("frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: u64, max: u32 },

    /// The stream ended in the middle of a frame.
    #[error("truncated frame: expected {expected} bytes, got {received}")]
    TruncatedFrame { expected: usize, received: usize },

    /// The stream ended before a full file-transfer header arrived.
    #[error("malformed file header: expected 8 bytes, got {received}")]
    MalformedHeader { received: usize },

    /// A file transfer ended before the announced byte count.
    #[error("file transfer interrupted after {received} of {expected} bytes")]
    TransferInterrupted { received: u64, expected: u64 },

    /// A request payload was not valid UTF-8.
    #[error("request is not valid UTF-8")]
    InvalidUtf8,

    /// A request did not match any known verb.
    #[error("unknown request: {request:?}")]
    UnknownRequest { request: String },

    /// A filename failed validation before any filesystem access.
    #[error("invalid filename {name:?}: {reason}")]
    InvalidFilename { name: String, reason: String },

    /// A response arrived with an unexpected shape or at the wrong time.
    #[error("malformed response: {detail}")]
    MalformedResponse { detail: String },

    /// JSON serialization or deserialization failed.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Underlying IO failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// Creates a malformed-response error with the given detail.
    pub fn malformed_response(detail: impl Into<String>) -> Self {
        Self::MalformedResponse {
            detail: detail.into(),
        }
    }
}
