//! Type-safe identifiers.
//!
//! Newtype wrappers keep connection numbers from being mixed with
//! retry attempt counters and other plain integers.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

// ============================================================================
// ConnectionId
// ============================================================================

/// Process-wide counter backing [`ConnectionId::next`].
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of one transport session.
///
/// Every connect attempt gets a fresh id; ids are never reused, so a
/// prior connection can always be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocates the next connection id.
    #[inline]
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
