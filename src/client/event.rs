//! Connection state and lifecycle events.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use crate::identifiers::ConnectionId;
use crate::protocol::InboundMessage;

// ============================================================================
// ConnectionState
// ============================================================================

/// Where the manager is in its connect/retry cycle.
///
/// ```text
/// Idle ──connect()──► Connecting ──open──► Open
///                        ▲  │                │
///                  delay │  │ failure        │ close
///                        │  ▼                ▼
///                        └─ Closed ◄─────────┘
///
/// any ──shutdown() / policy gives up──► Stopped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Built, `connect()` not called yet.
    Idle,
    /// A connect attempt is in flight.
    Connecting,
    /// The session is open.
    Open,
    /// The session ended; a retry is scheduled.
    Closed,
    /// No further attempts will be made.
    Stopped,
}

impl ConnectionState {
    /// Returns `true` if the session is open.
    #[inline]
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

// ============================================================================
// ClientEvent
// ============================================================================

/// Lifecycle notification broadcast by the manager.
///
/// Subscribe with [`ConnectionManager::subscribe`](super::ConnectionManager::subscribe).
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// A connect attempt started.
    Connecting {
        /// Session being attempted.
        id: ConnectionId,
    },

    /// The session opened.
    Opened {
        /// Opened session.
        id: ConnectionId,
    },

    /// A message was decoded and rendered.
    Message {
        /// Session it arrived on.
        id: ConnectionId,
        /// Decoded message.
        message: InboundMessage,
    },

    /// A frame could not be decoded and was dropped.
    FrameDropped {
        /// Session it arrived on.
        id: ConnectionId,
        /// Decoder diagnostic.
        reason: String,
    },

    /// The session ended, or the attempt failed.
    Closed {
        /// Closed session.
        id: ConnectionId,
        /// Why, when known.
        reason: Option<String>,
    },

    /// The next attempt is scheduled.
    Reconnecting {
        /// Consecutive closes since the last open.
        attempt: u32,
        /// Delay before the attempt.
        delay: Duration,
    },

    /// The manager stopped for good.
    Stopped,
}

// ============================================================================
// Tests
// ============================================================================
