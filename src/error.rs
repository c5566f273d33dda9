//! Error types for socket-feed.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! Only configuration, [`ConnectionManager::try_send`] and the echo
//! endpoint return errors to the caller. Everything that happens on the
//! live connection is handled inside the manager and observed through
//! events and the presenter.
//!
//! ```ignore
//! use socket_feed::{ConnectionManager, Result};
//!
//! fn example() -> Result<()> {
//!     let client = ConnectionManager::builder()
//!         .endpoint("ws://127.0.0.1:3000/socket")
//!         .build()?;
//!     client.connect();
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`], [`Error::NotConnected`], [`Error::Stopped`] |
//! | Protocol | [`Error::MalformedFrame`], [`Error::Schema`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`] |
//!
//! [`ConnectionManager::try_send`]: crate::ConnectionManager::try_send

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;
use std::time::Duration;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when the client builder is given invalid settings.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Connection attempt failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection attempt did not complete in time.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// The peer closed the connection.
    #[error("Connection closed")]
    ConnectionClosed,

    /// No connection is open.
    ///
    /// Returned by `try_send` while connecting or waiting to reconnect.
    #[error("Not connected")]
    NotConnected,

    /// The manager was shut down or its retry policy gave up.
    #[error("Connection manager stopped")]
    Stopped,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Frame payload is not valid JSON.
    #[error("Malformed frame: {reason}")]
    MalformedFrame {
        /// Parser diagnostic.
        reason: String,
    },

    /// Frame payload is JSON but does not match the message schema.
    #[error("Schema mismatch: {reason}")]
    Schema {
        /// Which part of the schema did not match.
        reason: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    ///
    /// Timeouts too long for `u64` milliseconds saturate.
    #[inline]
    pub fn connection_timeout(timeout: Duration) -> Self {
        Self::ConnectionTimeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Creates a malformed frame error.
    #[inline]
    pub fn malformed_frame(reason: impl Into<String>) -> Self {
        Self::MalformedFrame {
            reason: reason.into(),
        }
    }

    /// Creates a schema mismatch error.
    #[inline]
    pub fn schema(reason: impl Into<String>) -> Self {
        Self::Schema {
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::NotConnected
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if an inbound frame could not be decoded.
    #[inline]
    #[must_use]
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Self::MalformedFrame { .. } | Self::Schema { .. })
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed once the manager reconnects.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::NotConnected
                | Self::WebSocket(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("refused");
        assert_eq!(err.to_string(), "Connection failed: refused");
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("missing endpoint");
        assert_eq!(err.to_string(), "Configuration error: missing endpoint");
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::connection("test").is_connection_error());
        assert!(Error::connection_timeout(Duration::from_secs(1)).is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(Error::NotConnected.is_connection_error());
        assert!(!Error::config("test").is_connection_error());
        assert!(!Error::Stopped.is_connection_error());
    }

    #[test]
    fn test_is_decode_error() {
        assert!(Error::malformed_frame("eof").is_decode_error());
        assert!(Error::schema("missing field").is_decode_error());
        assert!(!Error::ConnectionClosed.is_decode_error());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::NotConnected.is_recoverable());
        assert!(!Error::Stopped.is_recoverable());
        assert!(!Error::config("test").is_recoverable());
    }

    #[test]
    fn test_connection_timeout_saturates() {
        let err = Error::connection_timeout(Duration::from_millis(1500));
        assert!(matches!(err, Error::ConnectionTimeout { timeout_ms: 1500 }));

        let err = Error::connection_timeout(Duration::MAX);
        assert!(matches!(err, Error::ConnectionTimeout { timeout_ms: u64::MAX }));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::ConnectionRefused, "refused");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
