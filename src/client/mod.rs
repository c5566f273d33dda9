//! Reconnecting feed client.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ConnectionManager`] | Owns the connection, renders messages, reconnects |
//! | [`ClientBuilder`] | Fluent configuration builder |
//! | [`ConnectionState`] | Connect/retry cycle state |
//! | [`ClientEvent`] | Lifecycle notifications |
//!
//! # Example
//!
//! ```no_run
//! use socket_feed::{ClientEvent, ConnectionManager, Result};
//!
//! # async fn example() -> Result<()> {
//! let client = ConnectionManager::builder()
//!     .endpoint("ws://127.0.0.1:3000/socket")
//!     .build()?;
//!
//! let mut events = client.subscribe();
//! client.connect();
//!
//! while let Ok(event) = events.recv().await {
//!     if let ClientEvent::Opened { .. } = event {
//!         client.send("hello");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for client configuration.
pub mod builder;

/// Connection state and lifecycle events.
pub mod event;

/// Connection manager and event loop.
mod manager;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::{ClientBuilder, DEFAULT_ENDPOINT, EVENT_CHANNEL_CAPACITY};
pub use event::{ClientEvent, ConnectionState};
pub use manager::ConnectionManager;
