//! Client configuration.

use std::path::PathBuf;
use std::time::Duration;

use jukebox_protocol::DEFAULT_PORT;

/// Returns the default directory downloads are saved into.
///
/// Prefers a `jukebox` folder inside the user's download directory and
/// falls back to `downloaded_music` under the working directory when no
/// download directory is known.
pub fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .map(|dir| dir.join("jukebox"))
        .unwrap_or_else(|| PathBuf::from("downloaded_music"))
}

/// Configuration for the jukebox client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address as `host:port`.
    pub server_addr: String,
    /// Timeout for establishing the TCP connection.
    pub connect_timeout: Duration,
    /// Timeout for a single frame exchange. The body of a file
    /// transfer is not time-bounded.
    pub request_timeout: Duration,
    /// Directory downloads default into.
    pub download_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: format!("localhost:{DEFAULT_PORT}"),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            download_dir: default_download_dir(),
        }
    }
}

impl ClientConfig {
    /// Creates a configuration pointing at the given server.
    pub fn new(server_addr: impl Into<String>) -> Self {
        Self {
            server_addr: server_addr.into(),
            ..Default::default()
        }
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the per-exchange request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the download directory.
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }
}
