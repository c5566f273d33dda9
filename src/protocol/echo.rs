//! Echo endpoint reply record.
//!
//! The echo endpoint answers every text frame with the text it got, an
//! upper-cased copy and its receipt time. Clients decode the reply as an
//! [`InboundMessage`](super::InboundMessage).

// ============================================================================
// Imports
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

// ============================================================================
// EchoReply
// ============================================================================

/// A reply produced by the echo endpoint.
///
/// # Format
///
/// ```json
/// {
///   "original": "hello",
///   "formatted": "HELLO",
///   "received": "2026-10-19T12:00:01.123456Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoReply {
    /// Text as received.
    pub original: String,

    /// Upper-cased text.
    pub formatted: String,

    /// Time the endpoint received the frame.
    pub received: DateTime<Utc>,
}

impl EchoReply {
    /// Builds a reply stamped with the current time.
    #[inline]
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::at(text, Utc::now())
    }

    /// Builds a reply for a received frame payload.
    ///
    /// A payload that is a JSON string literal is unwrapped first, so a
    /// client sending `"hello"` gets `HELLO` back rather than `"HELLO"`.
    /// Any other payload is echoed as is.
    ///
    /// This differs from the Go reference server, which uppercases the raw
    /// frame and so replies `"HELLO"` with the quotes.
    #[must_use]
    pub fn from_frame(payload: &str) -> Self {
        let text = serde_json::from_str::<String>(payload).unwrap_or_else(|_| payload.to_owned());
        Self::from_text(text)
    }

    /// Builds a reply stamped with the given time.
    #[must_use]
    pub fn at(text: impl Into<String>, received: DateTime<Utc>) -> Self {
        let original = text.into();
        let formatted = original.to_uppercase();
        Self {
            original,
            formatted,
            received,
        }
    }

    /// Encodes the reply into a frame payload.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::protocol::decode_inbound;

    #[test]
    fn test_upper_cases_text() {
        let reply = EchoReply::from_text("hello, world");
        assert_eq!(reply.original, "hello, world");
        assert_eq!(reply.formatted, "HELLO, WORLD");
    }

    #[test]
    fn test_from_frame_unwraps_json_string() {
        let reply = EchoReply::from_frame(r#""quiet""#);
        assert_eq!(reply.original, "quiet");
        assert_eq!(reply.formatted, "QUIET");

        let reply = EchoReply::from_frame("plain text");
        assert_eq!(reply.original, "plain text");
        assert_eq!(reply.formatted, "PLAIN TEXT");

        let reply = EchoReply::from_frame(r#"{"not":"a string"}"#);
        assert_eq!(reply.formatted, r#"{"NOT":"A STRING"}"#);
    }

    #[test]
    fn test_reply_decodes_as_inbound_message() {
        let at = DateTime::from_timestamp(1_792_411_201, 0).expect("timestamp");
        let payload = EchoReply::at("ping", at).encode().expect("encode");

        let msg = decode_inbound(&payload).expect("decode");
        assert_eq!(msg.formatted, "PING");
        assert_eq!(msg.original.as_deref(), Some("ping"));
        assert_eq!(msg.render(), "PING (2026-10-19T12:00:01Z)");
        assert_eq!(
            msg.received.as_datetime().map(|t| t.timestamp()),
            Some(1_792_411_201)
        );
    }
}
