//! Wire protocol for the jukebox server and its clients.
//!
//! All control traffic is length-prefixed frames over TCP:
//! - 4 bytes: payload length (u32, big-endian)
//! - N bytes: payload
//!
//! Requests are UTF-8 text (`LIST`, `PLAY:<filename>`). Responses are
//! either the literal bytes `READY` or a JSON object with a `status`
//! field. After a `READY` response the same stream carries one chunked
//! file transfer: an 8-byte big-endian size followed by exactly that
//! many raw bytes.
//!
//! # Example
//!
//! ```rust
//! use jukebox_protocol::{Request, Response};
//!
//! let wire = Request::play("song.mp3").encode();
//! assert_eq!(wire, b"PLAY:song.mp3");
//!
//! let response = Response::parse(br#"{"status":"OK","files":["song.mp3"]}"#).unwrap();
//! assert!(matches!(response, Response::Catalog { .. }));
//! ```

mod error;
mod framing;
mod transfer;
mod types;

pub use error::{ProtocolError, ProtocolResult};
pub use framing::{encode_frame, read_frame, write_frame};
pub use transfer::{receive_file, send_file};
pub use types::{FILE_NOT_FOUND_PREFIX, Request, Response, validate_filename};

/// Default TCP port the jukebox server listens on.
pub const DEFAULT_PORT: u16 = 12345;

/// Maximum frame payload size (4 MiB).
pub const MAX_FRAME_SIZE: u32 = 4 * 1024 * 1024;

/// Chunk size for file transfers.
pub const CHUNK_SIZE: usize = 4096;

/// Size of the file-transfer header in bytes.
pub const FILE_HEADER_LEN: usize = 8;
