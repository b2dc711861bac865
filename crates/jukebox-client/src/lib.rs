//! CLI and socket client for the jukebox server.
//!
//! This crate provides the `jukebox` command-line interface and the
//! [`SocketClient`] transport it is built on. The transport keeps one
//! connection to a server and exposes three operations: connect, fetch
//! the catalog, and download a file. Anything audible is the caller's
//! business; this crate only moves bytes.

pub mod cli;
pub mod config;
pub mod error;
pub mod transport;

pub use cli::Cli;
pub use config::{ClientConfig, default_download_dir};
pub use error::{ClientError, ClientResult};
pub use transport::SocketClient;
