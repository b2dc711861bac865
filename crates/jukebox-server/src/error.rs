//! Server error types.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Underlying IO failure (socket or file).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Framing, transfer or encoding failure.
    #[error("protocol error: {0}")]
    Protocol(#[from] jukebox_protocol::ProtocolError),

    /// The listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    /// A response write did not complete in time.
    #[error("timeout while {operation}")]
    Timeout { operation: String },
}
