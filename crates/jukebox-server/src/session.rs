//! Per-connection session state machine.
//!
//! Each accepted connection is served by one [`Session`]: a greeting is
//! sent first, then requests are handled one at a time in arrival
//! order. `LIST` answers with a fresh catalog scan; `PLAY` validates
//! the filename, opens the file, answers `READY` and streams the bytes
//! on the same stream. A request the session cannot honor (bad verb,
//! bad filename, missing file) produces an `Error` response and the
//! session keeps serving; only wire-level failures end it.
//!
//! The session is generic over its stream so tests can drive it with
//! in-memory pipes instead of TCP sockets.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

use jukebox_protocol::{Request, Response, read_frame, send_file, validate_filename, write_frame};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// Per-session settings, extracted from [`ServerConfig`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directory the catalog is served from.
    pub music_dir: PathBuf,
    /// How long to wait for the next request before closing.
    pub idle_timeout: Duration,
}

impl SessionConfig {
    /// Creates a configuration serving the given directory.
    pub fn new(music_dir: impl Into<PathBuf>) -> Self {
        Self {
            music_dir: music_dir.into(),
            idle_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the idle timeout.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }
}

impl From<&ServerConfig> for SessionConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            music_dir: config.music_dir.clone(),
            idle_timeout: config.idle_timeout,
        }
    }
}

/// The server side of one client connection.
pub struct Session<S> {
    stream: S,
    peer: String,
    config: SessionConfig,
    requests: u64,
    bytes_sent: u64,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a session over the given stream.
    pub fn new(stream: S, peer: impl Into<String>, config: SessionConfig) -> Self {
        Self {
            stream,
            peer: peer.into(),
            config,
            requests: 0,
            bytes_sent: 0,
        }
    }

    /// Number of requests received over the life of the session.
    pub fn requests_handled(&self) -> u64 {
        self.requests
    }

    /// Total file bytes streamed to the peer.
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Runs the session to completion: greeting first, then the request
    /// loop.
    ///
    /// Returns `Ok` on a clean disconnect or an idle timeout; framing,
    /// transfer and IO failures end the session with an error.
    pub async fn run(&mut self) -> ServerResult<()> {
        // Clients only require that a greeting frame arrives; the
        // content is informational.
        let greeting = Response::Welcome {
            message: format!("jukebox {} ready", env!("CARGO_PKG_VERSION")),
        };
        self.send_response(&greeting).await?;

        loop {
            let frame = match tokio::time::timeout(
                self.config.idle_timeout,
                read_frame(&mut self.stream),
            )
            .await
            {
                Ok(result) => result?,
                Err(_) => {
                    debug!(peer = %self.peer, "idle timeout, closing session");
                    return Ok(());
                }
            };
            let Some(payload) = frame else {
                debug!(peer = %self.peer, "client disconnected");
                return Ok(());
            };
            self.requests += 1;
            self.dispatch(&payload).await?;
        }
    }

    async fn dispatch(&mut self, payload: &[u8]) -> ServerResult<()> {
        let request = match Request::parse(payload) {
            Ok(request) => request,
            Err(e) => {
                debug!(peer = %self.peer, error = %e, "rejecting request");
                return self
                    .send_response(&Response::Error {
                        message: e.to_string(),
                    })
                    .await;
            }
        };
        match request {
            Request::List => self.handle_list().await,
            Request::Play { filename } => self.handle_play(&filename).await,
        }
    }

    async fn handle_list(&mut self) -> ServerResult<()> {
        debug!(peer = %self.peer, "handling LIST");
        let response = match crate::catalog::scan_catalog(&self.config.music_dir).await {
            Ok(files) => Response::Catalog { files },
            Err(e) => {
                warn!(peer = %self.peer, error = %e, "catalog scan failed");
                Response::Error {
                    message: format!("Failed to list files: {e}"),
                }
            }
        };
        self.send_response(&response).await
    }

    async fn handle_play(&mut self, filename: &str) -> ServerResult<()> {
        debug!(peer = %self.peer, filename, "handling PLAY");
        if let Err(e) = validate_filename(filename) {
            warn!(peer = %self.peer, filename, "rejecting filename");
            return self
                .send_response(&Response::Error {
                    message: e.to_string(),
                })
                .await;
        }

        // The file is opened and measured before READY commits this
        // session to a transfer.
        let path = self.config.music_dir.join(filename);
        let mut file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(peer = %self.peer, filename, "file not found");
                return self.send_response(&Response::file_not_found(filename)).await;
            }
            Err(e) => {
                warn!(peer = %self.peer, filename, error = %e, "failed to open file");
                return self
                    .send_response(&Response::Error {
                        message: format!("Failed to open {filename}: {e}"),
                    })
                    .await;
            }
        };
        let metadata = match file.metadata().await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(peer = %self.peer, filename, error = %e, "failed to read metadata");
                return self
                    .send_response(&Response::Error {
                        message: format!("Failed to open {filename}: {e}"),
                    })
                    .await;
            }
        };
        if !metadata.is_file() {
            debug!(peer = %self.peer, filename, "not a regular file");
            return self.send_response(&Response::file_not_found(filename)).await;
        }

        let len = metadata.len();
        self.send_response(&Response::Ready).await?;

        // The transfer body is not bounded by the idle timeout; only
        // frame traffic is.
        let mut sent = 0u64;
        send_file(&mut self.stream, &mut file, len, |done, _| sent = done).await?;
        self.bytes_sent += sent;
        debug!(peer = %self.peer, filename, bytes = sent, "file sent");
        Ok(())
    }

    async fn send_response(&mut self, response: &Response) -> ServerResult<()> {
        let payload = response.encode()?;
        match tokio::time::timeout(
            self.config.idle_timeout,
            write_frame(&mut self.stream, &payload),
        )
        .await
        {
            Ok(result) => {
                result?;
                Ok(())
            }
            Err(_) => Err(ServerError::Timeout {
                operation: "writing response".into(),
            }),
        }
    }
}
