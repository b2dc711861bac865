//! TCP listener and per-connection task management.
//!
//! One task per accepted connection runs a [`Session`]; a fault in one
//! session never reaches another. Every session is raced against its
//! [`CloseSignal`](crate::CloseSignal) from the registry, so shutdown
//! interrupts parked reads and in-flight transfers by dropping the
//! socket.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::registry::SessionRegistry;
use crate::session::{Session, SessionConfig};

/// TCP server accepting jukebox client connections.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    listener: TcpListener,
    registry: Arc<SessionRegistry>,
    connection_semaphore: Arc<Semaphore>,
}

impl Server {
    /// Binds the listening socket.
    pub async fn bind(config: ServerConfig) -> ServerResult<Self> {
        let listener = TcpListener::bind(config.listen_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: config.listen_addr,
                source,
            })?;
        info!(
            addr = %listener.local_addr()?,
            dir = %config.music_dir.display(),
            "Server listening"
        );
        let connection_semaphore = Arc::new(Semaphore::new(config.max_connections));

        Ok(Self {
            config,
            listener,
            registry: Arc::new(SessionRegistry::new()),
            connection_semaphore,
        })
    }

    /// Returns the bound address.
    ///
    /// Useful when the configuration asked for an ephemeral port.
    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Number of currently live sessions.
    pub fn session_count(&self) -> usize {
        self.registry.len()
    }

    /// Accepts connections forever, spawning one session task each.
    pub async fn run(&self) -> ServerResult<()> {
        loop {
            // Acquire a connection permit before accepting.
            let permit = self
                .connection_semaphore
                .clone()
                .acquire_owned()
                .await
                .expect("connection semaphore closed");

            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                    continue;
                }
            };
            debug!(%peer, "Accepted connection");

            let (id, close) = self.registry.register();
            let registry = self.registry.clone();
            let session_config = SessionConfig::from(&self.config);

            tokio::spawn(async move {
                let _permit = permit;
                let mut session = Session::new(stream, peer.to_string(), session_config);
                let result = tokio::select! {
                    result = session.run() => result,
                    _ = close.wait() => {
                        debug!(%peer, "Session closed by shutdown");
                        Ok(())
                    }
                };
                match result {
                    Ok(()) => info!(
                        %peer,
                        requests = session.requests_handled(),
                        bytes_sent = session.bytes_sent(),
                        "Session closed"
                    ),
                    Err(e) => warn!(%peer, error = %e, "Session ended with error"),
                }
                registry.deregister(id);
            });
        }
    }

    /// Runs the accept loop until `shutdown` completes, then fires the
    /// close signal of every live session.
    pub async fn run_until_shutdown<F>(&self, shutdown: F) -> ServerResult<()>
    where
        F: std::future::Future<Output = ()> + Send,
    {
        let result = tokio::select! {
            result = self.run() => result,
            _ = shutdown => {
                info!("Shutdown signal received");
                Ok(())
            }
        };
        self.registry.close_all();
        result
    }
}
