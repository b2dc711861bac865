//! Server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use jukebox_protocol::DEFAULT_PORT;

/// Configuration for the jukebox server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the TCP listener binds to.
    pub listen_addr: SocketAddr,
    /// Directory the catalog is served from.
    pub music_dir: PathBuf,
    /// How long a session waits for the next request before closing.
    pub idle_timeout: Duration,
    /// Maximum number of concurrent client connections.
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            music_dir: PathBuf::from("music_files"),
            idle_timeout: Duration::from_secs(30),
            max_connections: 100,
        }
    }
}

impl ServerConfig {
    /// Creates a configuration listening on the given address.
    pub fn new(listen_addr: SocketAddr) -> Self {
        Self {
            listen_addr,
            ..Default::default()
        }
    }

    /// Sets the music directory.
    pub fn with_music_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.music_dir = dir.into();
        self
    }

    /// Sets the session idle timeout.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Sets the connection limit.
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }
}
