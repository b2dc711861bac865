//! Registry of live sessions for coordinated shutdown.
//!
//! Sessions register on accept and deregister when their task ends.
//! The only cross-session operation is [`SessionRegistry::close_all`],
//! which fires every session's close signal so shutdown can interrupt
//! parked reads and in-flight transfers.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

/// Identifier of a registered session.
pub type SessionId = u64;

/// Tracks live sessions and their close channels.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    next_id: AtomicU64,
    sessions: Mutex<HashMap<SessionId, watch::Sender<bool>>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new session, returning its id and close signal.
    pub fn register(&self) -> (SessionId, CloseSignal) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = watch::channel(false);
        self.lock().insert(id, tx);
        (id, CloseSignal { rx })
    }

    /// Removes a finished session.
    pub fn deregister(&self, id: SessionId) {
        self.lock().remove(&id);
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when no session is live.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Fires the close signal of every live session.
    pub fn close_all(&self) {
        for sender in self.lock().values() {
            let _ = sender.send(true);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SessionId, watch::Sender<bool>>> {
        self.sessions.lock().expect("session registry lock poisoned")
    }
}

/// Completes when the owning session should shut down.
#[derive(Debug)]
pub struct CloseSignal {
    rx: watch::Receiver<bool>,
}

impl CloseSignal {
    /// Waits for the close signal to fire.
    ///
    /// Also completes if the registry itself is dropped, so an orphaned
    /// session never outlives the server.
    pub async fn wait(mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn register_and_deregister_track_count() {
        let registry = SessionRegistry::new();
        assert!(registry.is_empty());

        let (a, _close_a) = registry.register();
        let (b, _close_b) = registry.register();
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);

        registry.deregister(a);
        assert_eq!(registry.len(), 1);
        registry.deregister(b);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn close_all_fires_every_signal() {
        let registry = SessionRegistry::new();
        let (_, close_a) = registry.register();
        let (_, close_b) = registry.register();

        registry.close_all();

        tokio::time::timeout(Duration::from_secs(1), close_a.wait())
            .await
            .expect("close signal did not fire");
        tokio::time::timeout(Duration::from_secs(1), close_b.wait())
            .await
            .expect("close signal did not fire");
    }

    #[tokio::test]
    async fn dropping_the_registry_releases_waiters() {
        let registry = SessionRegistry::new();
        let (_, close) = registry.register();
        drop(registry);

        tokio::time::timeout(Duration::from_secs(1), close.wait())
            .await
            .expect("close signal did not fire");
    }

    #[tokio::test]
    async fn deregister_of_unknown_id_is_harmless() {
        let registry = SessionRegistry::new();
        registry.deregister(42);
        assert!(registry.is_empty());
    }
}
