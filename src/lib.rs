//! socket-feed - Reconnecting WebSocket message feed.
//!
//! This library keeps a single WebSocket connection to a fixed endpoint
//! alive, renders every message the server pushes as one line of an
//! append-only log, and lets the caller submit text values.
//!
//! # Architecture
//!
//! The client follows an actor model:
//!
//! - **Handle ([`ConnectionManager`])**: `connect`, `send`, `shutdown`, state snapshots
//! - **Event loop (tokio task)**: owns the session, retry policy and timer
//! - **Presenter ([`Presenter`])**: two indicators plus the rendered log
//!
//! Key design principles:
//!
//! - At most one live connection; a closed one is never reused
//! - Every close schedules exactly one retry (5s fixed delay by default)
//! - Bad frames are dropped, never fatal
//! - Sends while disconnected are dropped, never queued
//!
//! # Quick Start
//!
//! ```no_run
//! use socket_feed::{ConnectionManager, Result, WriterPresenter};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = ConnectionManager::builder()
//!         .endpoint("ws://127.0.0.1:3000/socket")
//!         .presenter(WriterPresenter::new(std::io::stdout()))
//!         .build()?;
//!
//!     client.connect();
//!     client.send("hello");
//!
//!     tokio::signal::ctrl_c().await?;
//!     client.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`ConnectionManager`] and its builder |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`presenter`] | Presentation hooks |
//! | [`protocol`] | Frame payload types |
//! | [`retry`] | Reconnect policies |
//! | [`server`] | Echo endpoint |
//! | [`transport`] | Connector abstraction and implementations |

// ============================================================================
// Modules
// ============================================================================

/// Reconnecting feed client.
///
/// Use [`ConnectionManager::builder()`] to create a configured client.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Presentation hooks: indicators, rendered log, input control.
pub mod presenter;

/// Frame payload types.
///
/// Inbound record schema, outbound value encoding and echo replies.
pub mod protocol;

/// Reconnect retry policies.
pub mod retry;

/// Echo WebSocket endpoint.
pub mod server;

/// Transport layer.
///
/// Connector trait plus WebSocket and in-memory implementations.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{ClientBuilder, ClientEvent, ConnectionManager, ConnectionState};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::ConnectionId;

// Presentation types
pub use presenter::{
    Indicator, MemoryPresenter, Presenter, TracingPresenter, Visibility, WriterPresenter,
};

// Protocol types
pub use protocol::{EchoReply, InboundMessage, OutboundValue, Received};

// Retry types
pub use retry::{ExponentialBackoff, FixedDelay, RetryPolicy};

// Server types
pub use server::EchoServer;

// Transport types
pub use transport::{Connector, MemoryConnector, Session, WsConnector};
