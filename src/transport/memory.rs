//! Channel-backed in-process transport.
//!
//! [`MemoryConnector`] hands the client one end of a pair of unbounded
//! channels and delivers the other end, a [`MemoryPeer`], to a
//! [`MemoryAcceptor`]. The peer plays the server: it pushes text frames to
//! the client, reads what the client sent, and closes the session by being
//! dropped.
//!
//! # Example
//!
//! ```ignore
//! let (connector, mut acceptor) = MemoryConnector::new();
//! let client = ConnectionManager::builder()
//!     .endpoint("ws://memory/socket")
//!     .connector(connector)
//!     .build()?;
//! client.connect();
//!
//! let peer = acceptor.accept().await.expect("session");
//! peer.send_text(r#"{"formatted":"hi","received":"now"}"#);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use futures_util::{sink, stream};
use tokio::sync::mpsc;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

use super::{Connector, Session};

// ============================================================================
// Shared State
// ============================================================================

#[derive(Debug)]
struct MemoryShared {
    /// Accepted sessions, server side.
    accept_tx: mpsc::UnboundedSender<MemoryPeer>,
    /// Refuse new sessions while set.
    refuse: AtomicBool,
    /// Total connect calls, refused ones included.
    attempts: AtomicUsize,
}

// ============================================================================
// MemoryConnector
// ============================================================================

/// Connector producing in-process sessions.
///
/// Clones share the same acceptor, refusal flag and attempt counter.
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    inner: Arc<MemoryShared>,
}

impl MemoryConnector {
    /// Creates a connector and the acceptor receiving its sessions.
    #[must_use]
    pub fn new() -> (Self, MemoryAcceptor) {
        let (accept_tx, accept_rx) = mpsc::unbounded_channel();
        let connector = Self {
            inner: Arc::new(MemoryShared {
                accept_tx,
                refuse: AtomicBool::new(false),
                attempts: AtomicUsize::new(0),
            }),
        };
        (connector, MemoryAcceptor { accept_rx })
    }

    /// Makes later connect calls fail (`true`) or succeed (`false`).
    pub fn refuse_connections(&self, refuse: bool) {
        self.inner.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Returns how many times `connect` was called.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.inner.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, endpoint: &Url) -> Result<Session> {
        let attempt = self.inner.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        if self.inner.refuse.load(Ordering::SeqCst) {
            debug!(%endpoint, attempt, "Memory connection refused");
            return Err(Error::connection("connection refused"));
        }

        let (to_server_tx, to_server_rx) = mpsc::unbounded_channel::<String>();
        let (to_client_tx, to_client_rx) = mpsc::unbounded_channel::<String>();

        let peer = MemoryPeer {
            outgoing: to_client_tx,
            incoming: to_server_rx,
        };
        self.inner
            .accept_tx
            .send(peer)
            .map_err(|_| Error::connection("no acceptor for memory endpoint"))?;

        let sink = sink::unfold(to_server_tx, |tx, text: String| async move {
            tx.send(text).map_err(|_| Error::ConnectionClosed)?;
            Ok::<_, Error>(tx)
        });

        let stream = stream::unfold(to_client_rx, |mut rx| async move {
            rx.recv().await.map(|text| (Ok::<_, Error>(text), rx))
        });

        debug!(%endpoint, attempt, "Memory connection open");
        Ok(Session::new(Box::pin(sink), Box::pin(stream)))
    }
}

// ============================================================================
// MemoryAcceptor
// ============================================================================

/// Receives the server side of each accepted session.
#[derive(Debug)]
pub struct MemoryAcceptor {
    accept_rx: mpsc::UnboundedReceiver<MemoryPeer>,
}

impl MemoryAcceptor {
    /// Waits for the next accepted session.
    ///
    /// Returns `None` once every connector clone is dropped.
    pub async fn accept(&mut self) -> Option<MemoryPeer> {
        self.accept_rx.recv().await
    }

    /// Returns an already accepted session without waiting.
    pub fn try_accept(&mut self) -> Option<MemoryPeer> {
        self.accept_rx.try_recv().ok()
    }
}

// ============================================================================
// MemoryPeer
// ============================================================================

/// Server side of one in-process session.
///
/// Dropping the peer (or calling [`MemoryPeer::close`]) ends the session
/// for the client.
#[derive(Debug)]
pub struct MemoryPeer {
    outgoing: mpsc::UnboundedSender<String>,
    incoming: mpsc::UnboundedReceiver<String>,
}

impl MemoryPeer {
    /// Pushes one text frame to the client.
    ///
    /// Returns `false` if the client side is gone.
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        self.outgoing.send(text.into()).is_ok()
    }

    /// Waits for the next frame the client sent.
    ///
    /// Returns `None` once the client dropped the session.
    pub async fn recv_text(&mut self) -> Option<String> {
        self.incoming.recv().await
    }

    /// Returns a frame the client already sent, without waiting.
    pub fn try_recv_text(&mut self) -> Option<String> {
        self.incoming.try_recv().ok()
    }

    /// Closes the session.
    pub fn close(self) {
        drop(self);
    }
}

// ============================================================================
// Tests
// ============================================================================
