//! Transport layer.
//!
//! The connection manager does not know about WebSocket handshakes. It asks
//! a [`Connector`] for a [`Session`] and then only deals with text frames:
//! a sink it writes payloads to and a stream it reads payloads from.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐                        ┌─────────────────┐
//! │  ConnectionManager   │        Session         │  Remote         │
//! │                      │  sink:   String  ────► │  endpoint       │
//! │  Connector::connect  │  stream: String  ◄──── │  (/socket)      │
//! └──────────────────────┘                        └─────────────────┘
//! ```
//!
//! # Session Lifecycle
//!
//! 1. `Connector::connect` - Open a session (errors count as a close)
//! 2. Write payloads to `sink`, read payloads from `stream`
//! 3. Stream yields `Err` or ends - session is closed
//! 4. Session dropped - never reused
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `memory` | Channel-backed connector for tests and embedding |
//! | `websocket` | tokio-tungstenite client connector |

// ============================================================================
// Imports
// ============================================================================

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{Sink, Stream};
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Submodules
// ============================================================================

/// Channel-backed in-process transport.
pub mod memory;

/// WebSocket client transport.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use memory::{MemoryAcceptor, MemoryConnector, MemoryPeer};
pub use websocket::WsConnector;

// ============================================================================
// Types
// ============================================================================

/// Outgoing half of a session: accepts text payloads.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = Error> + Send>>;

/// Incoming half of a session: yields text payloads.
///
/// An `Err` item or the end of the stream means the session is closed.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

// ============================================================================
// Session
// ============================================================================

/// One open transport session.
pub struct Session {
    /// Outgoing text frames.
    pub sink: FrameSink,
    /// Incoming text frames.
    pub stream: FrameStream,
}

impl Session {
    /// Creates a session from its two halves.
    #[inline]
    #[must_use]
    pub fn new(sink: FrameSink, stream: FrameStream) -> Self {
        Self { sink, stream }
    }
}

// ============================================================================
// Connector
// ============================================================================

/// Opens sessions to an endpoint.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Opens a new session.
    ///
    /// # Errors
    ///
    /// Any error; the manager treats it as an immediate close.
    async fn connect(&self, endpoint: &Url) -> Result<Session>;
}

#[async_trait]
impl<C: Connector + ?Sized> Connector for Arc<C> {
    async fn connect(&self, endpoint: &Url) -> Result<Session> {
        (**self).connect(endpoint).await
    }
}
