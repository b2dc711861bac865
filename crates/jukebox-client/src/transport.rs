//! Socket client for the jukebox protocol.
//!
//! [`SocketClient`] holds at most one connection to a server and
//! serializes every operation on it, so a UI can share one client from
//! several tasks. Connection state is explicit: operations fail with
//! [`ClientError::NotConnected`] until [`SocketClient::connect`] has
//! succeeded, and any wire-level failure drops the socket so the next
//! call starts from a clean state. Server-reported outcomes such as a
//! missing file leave the connection open.

use std::path::Path;

use tokio::fs::File;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use jukebox_protocol::{
    ProtocolError, Request, Response, read_frame, receive_file, validate_filename, write_frame,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Client for the jukebox socket protocol.
pub struct SocketClient {
    config: ClientConfig,
    stream: Mutex<Option<TcpStream>>,
}

impl SocketClient {
    /// Creates a client for the configured server. No connection is
    /// made until [`connect`](Self::connect) is called.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            stream: Mutex::new(None),
        }
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Establishes the connection and waits for the server greeting.
    ///
    /// The greeting content is ignored; its arrival is what proves a
    /// live jukebox server is on the other end. Calling `connect` on an
    /// already connected client is a no-op.
    pub async fn connect(&self) -> ClientResult<()> {
        let mut guard = self.stream.lock().await;
        if guard.is_some() {
            return Ok(());
        }

        debug!(server = %self.config.server_addr, "connecting");
        let mut stream = match tokio::time::timeout(
            self.config.connect_timeout,
            TcpStream::connect(&self.config.server_addr),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(ClientError::Connect {
                    message: format!("failed to connect to {}: {e}", self.config.server_addr),
                });
            }
            Err(_) => {
                return Err(ClientError::Connect {
                    message: format!(
                        "connection to {} timed out after {}s",
                        self.config.server_addr,
                        self.config.connect_timeout.as_secs()
                    ),
                });
            }
        };

        match tokio::time::timeout(self.config.request_timeout, read_frame(&mut stream)).await {
            Ok(Ok(Some(greeting))) => {
                debug!(bytes = greeting.len(), "greeting received");
            }
            Ok(Ok(None)) => {
                return Err(ClientError::Connect {
                    message: "server closed the connection during the handshake".into(),
                });
            }
            Ok(Err(e)) => {
                return Err(ClientError::Connect {
                    message: format!("bad greeting from server: {e}"),
                });
            }
            Err(_) => {
                return Err(ClientError::Connect {
                    message: "no greeting from server".into(),
                });
            }
        }

        *guard = Some(stream);
        debug!(server = %self.config.server_addr, "connected");
        Ok(())
    }

    /// Closes the connection. Safe to call when not connected.
    pub async fn disconnect(&self) {
        let mut guard = self.stream.lock().await;
        if guard.take().is_some() {
            debug!("disconnected");
        }
    }

    /// True while a connection is held.
    pub async fn is_connected(&self) -> bool {
        self.stream.lock().await.is_some()
    }

    /// Fetches the catalog of files available on the server.
    pub async fn fetch_catalog(&self) -> ClientResult<Vec<String>> {
        let mut guard = self.stream.lock().await;
        let stream = guard.as_mut().ok_or(ClientError::NotConnected)?;

        let result = Self::catalog_exchange(stream, &self.config).await;
        if let Err(ref e) = result
            && e.poisons_connection()
        {
            debug!(error = %e, "dropping connection after transport error");
            *guard = None;
        }
        result
    }

    /// Downloads `filename` from the server into `dest`.
    pub async fn fetch_file(&self, filename: &str, dest: &Path) -> ClientResult<()> {
        self.fetch_file_with_progress(filename, dest, |_, _| {}).await
    }

    /// Downloads `filename` into `dest`, reporting progress.
    ///
    /// `progress` is invoked with `(bytes_received, total)` after every
    /// chunk. The destination file is created only once the server has
    /// answered `READY`, and a partial file is removed if the transfer
    /// fails.
    pub async fn fetch_file_with_progress<F>(
        &self,
        filename: &str,
        dest: &Path,
        progress: F,
    ) -> ClientResult<()>
    where
        F: FnMut(u64, u64),
    {
        // Reject hostile names before anything touches the wire or the
        // filesystem; a well-behaved server would refuse them anyway.
        validate_filename(filename)?;

        let mut guard = self.stream.lock().await;
        let stream = guard.as_mut().ok_or(ClientError::NotConnected)?;

        let result = Self::transfer_exchange(stream, &self.config, filename, dest, progress).await;
        if let Err(ref e) = result
            && e.poisons_connection()
        {
            debug!(error = %e, "dropping connection after transport error");
            *guard = None;
        }
        result
    }

    async fn catalog_exchange(
        stream: &mut TcpStream,
        config: &ClientConfig,
    ) -> ClientResult<Vec<String>> {
        Self::send_request(stream, config, &Request::List).await?;
        match Self::read_response(stream, config).await? {
            Response::Catalog { files } => Ok(files),
            Response::Error { message } => Err(ClientError::from_server_error(message)),
            other => Err(ClientError::Protocol(ProtocolError::malformed_response(
                format!("expected a catalog, got {}", other.kind()),
            ))),
        }
    }

    async fn transfer_exchange<F>(
        stream: &mut TcpStream,
        config: &ClientConfig,
        filename: &str,
        dest: &Path,
        progress: F,
    ) -> ClientResult<()>
    where
        F: FnMut(u64, u64),
    {
        Self::send_request(stream, config, &Request::play(filename)).await?;
        match Self::read_response(stream, config).await? {
            Response::Ready => {}
            Response::Error { message } => return Err(ClientError::from_server_error(message)),
            other => {
                return Err(ClientError::Protocol(ProtocolError::malformed_response(
                    format!("expected READY, got {}", other.kind()),
                )));
            }
        }

        // READY commits the server to a transfer; only now is the
        // destination created. The body is not bounded by the request
        // timeout since large files legitimately take a while.
        let mut file = File::create(dest).await?;
        match receive_file(stream, &mut file, progress).await {
            Ok(received) => {
                debug!(filename, bytes = received, dest = %dest.display(), "download complete");
                Ok(())
            }
            Err(e) => {
                drop(file);
                if let Err(remove_err) = tokio::fs::remove_file(dest).await {
                    warn!(
                        dest = %dest.display(),
                        error = %remove_err,
                        "failed to remove partial download"
                    );
                }
                Err(e.into())
            }
        }
    }

    async fn send_request(
        stream: &mut TcpStream,
        config: &ClientConfig,
        request: &Request,
    ) -> ClientResult<()> {
        match tokio::time::timeout(
            config.request_timeout,
            write_frame(stream, &request.encode()),
        )
        .await
        {
            Ok(result) => {
                result?;
                Ok(())
            }
            Err(_) => Err(ClientError::Timeout {
                operation: "sending request".into(),
            }),
        }
    }

    async fn read_response(
        stream: &mut TcpStream,
        config: &ClientConfig,
    ) -> ClientResult<Response> {
        let payload = match tokio::time::timeout(config.request_timeout, read_frame(stream)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ClientError::Timeout {
                    operation: "reading response".into(),
                });
            }
        };
        match payload {
            Some(payload) => Ok(Response::parse(&payload)?),
            None => Err(ClientError::Protocol(ProtocolError::malformed_response(
                "connection closed before a response arrived",
            ))),
        }
    }
}
