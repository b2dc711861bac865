//! Jukebox daemon: music catalog, per-connection sessions, TCP listener.
//!
//! This crate provides the server side of the jukebox protocol:
//! - TCP listener with a connection limit and graceful shutdown
//! - One session task per connection, isolated from its neighbors
//! - Fresh catalog scans of the music directory on every `LIST`
//! - Chunked file streaming for `PLAY`
//!
//! # Example
//!
//! ```rust,no_run
//! use jukebox_server::{Server, ServerConfig, SignalHandler};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind(ServerConfig::default()).await?;
//!     let signals = SignalHandler::new();
//!     signals.spawn_listener();
//!     server.run_until_shutdown(signals.shutdown().wait()).await?;
//!     Ok(())
//! }
//! ```

mod catalog;
mod config;
mod error;
mod listener;
mod registry;
mod session;
mod signals;

pub use catalog::{AUDIO_EXTENSIONS, scan_catalog};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use listener::Server;
pub use registry::{CloseSignal, SessionId, SessionRegistry};
pub use session::{Session, SessionConfig};
pub use signals::{ShutdownSignal, SignalHandler};
