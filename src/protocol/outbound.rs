//! Outbound value encoding.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;

use crate::error::Result;

// ============================================================================
// OutboundValue
// ============================================================================

/// A text value submitted by the caller.
///
/// Sent as a JSON string literal, so `hello` travels as `"hello"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OutboundValue(String);

impl OutboundValue {
    /// Wraps a text value. Empty text is allowed.
    #[inline]
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Returns the raw text.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Encodes the value into a frame payload.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<&str> for OutboundValue {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for OutboundValue {
    fn from(text: String) -> Self {
        Self(text)
    }
}

// ============================================================================
// Tests
// ============================================================================
