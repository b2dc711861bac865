//! Client error types.

use thiserror::Error;

use jukebox_protocol::{FILE_NOT_FOUND_PREFIX, ProtocolError};

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// An operation was attempted without a live connection.
    #[error("not connected to a server")]
    NotConnected,

    /// The connection or handshake could not be established.
    #[error("connection failed: {message}")]
    Connect { message: String },

    /// A frame exchange did not complete in time.
    #[error("timeout while {operation}")]
    Timeout { operation: String },

    /// The server does not have the requested file.
    #[error("file not found on server: {filename}")]
    FileNotFound { filename: String },

    /// The server rejected the request for another reason.
    #[error("request rejected by server: {message}")]
    Rejected { message: String },

    /// Framing, transfer or encoding failure.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Underlying IO failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// True when the error left the connection in an undefined state.
    ///
    /// The transport drops the socket on such errors; the caller must
    /// reconnect before retrying. Server-reported outcomes and local
    /// validation failures leave the connection usable.
    pub fn poisons_connection(&self) -> bool {
        !matches!(
            self,
            Self::NotConnected
                | Self::FileNotFound { .. }
                | Self::Rejected { .. }
                | Self::Protocol(ProtocolError::InvalidFilename { .. })
        )
    }

    /// Maps a server `Error` response message onto the client taxonomy.
    pub(crate) fn from_server_error(message: String) -> Self {
        match message.strip_prefix(FILE_NOT_FOUND_PREFIX) {
            Some(filename) => Self::FileNotFound {
                filename: filename.to_string(),
            },
            None => Self::Rejected { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_map_onto_the_taxonomy() {
        let err = ClientError::from_server_error("File not found: x.mp3".into());
        assert!(matches!(
            err,
            ClientError::FileNotFound { ref filename } if filename == "x.mp3"
        ));
        assert!(err.to_string().contains("x.mp3"));

        let err = ClientError::from_server_error("unknown request: \"NOPE\"".into());
        assert!(matches!(err, ClientError::Rejected { .. }));
    }

    #[test]
    fn server_reported_outcomes_do_not_poison() {
        assert!(
            !ClientError::FileNotFound {
                filename: "a.mp3".into()
            }
            .poisons_connection()
        );
        assert!(
            !ClientError::Rejected {
                message: "no".into()
            }
            .poisons_connection()
        );
        assert!(!ClientError::NotConnected.poisons_connection());
    }

    #[test]
    fn wire_errors_poison() {
        assert!(
            ClientError::Timeout {
                operation: "reading response".into()
            }
            .poisons_connection()
        );
        assert!(
            ClientError::Protocol(ProtocolError::malformed_response("bad")).poisons_connection()
        );
        assert!(
            ClientError::Io(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"))
                .poisons_connection()
        );
    }
}
