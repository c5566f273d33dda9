//! Inbound message schema.
//!
//! Every text frame the server pushes carries one JSON record. The client
//! only relies on `formatted` and `received`; anything else is ignored.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Number;
use serde_json::error::Category;

use crate::error::{Error, Result};

// ============================================================================
// InboundMessage
// ============================================================================

/// A decoded inbound record.
///
/// # Format
///
/// ```json
/// {
///   "original": "hello",
///   "formatted": "HELLO",
///   "received": "2026-10-19T12:00:01Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Human-readable text to display.
    pub formatted: String,

    /// Receipt marker, usually a timestamp.
    pub received: Received,

    /// Text the server was echoing, when it says so.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
}

impl InboundMessage {
    /// Creates a message without an `original` field.
    #[inline]
    #[must_use]
    pub fn new(formatted: impl Into<String>, received: impl Into<Received>) -> Self {
        Self {
            formatted: formatted.into(),
            received: received.into(),
            original: None,
        }
    }

    /// Renders the message as one log line: `formatted (received)`.
    #[must_use]
    pub fn render(&self) -> String {
        format!("{} ({})", self.formatted, self.received)
    }
}

/// Decodes one inbound frame payload.
///
/// # Errors
///
/// - [`Error::MalformedFrame`] if the payload is not valid JSON
/// - [`Error::Schema`] if the JSON does not have the expected shape
pub fn decode_inbound(text: &str) -> Result<InboundMessage> {
    serde_json::from_str(text).map_err(|e| match e.classify() {
        Category::Data => Error::schema(e.to_string()),
        Category::Io | Category::Syntax | Category::Eof => Error::malformed_frame(e.to_string()),
    })
}

// ============================================================================
// Received
// ============================================================================

/// The `received` marker: either text or a JSON number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Received {
    /// Textual marker, e.g. `"12:00:01"` or an RFC 3339 timestamp.
    Text(String),
    /// Numeric marker, e.g. a Unix timestamp.
    Number(Number),
}

impl Received {
    /// Interprets the marker as a point in time.
    ///
    /// Text is parsed as RFC 3339; integers are taken as Unix seconds.
    /// Returns `None` for anything else.
    #[must_use]
    pub fn as_datetime(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            Self::Text(text) => DateTime::parse_from_rfc3339(text).ok(),
            Self::Number(number) => number
                .as_i64()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .map(|utc| utc.fixed_offset()),
        }
    }
}

impl fmt::Display for Received {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{number}"),
        }
    }
}

impl From<&str> for Received {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Received {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<i64> for Received {
    fn from(value: i64) -> Self {
        Self::Number(Number::from(value))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_and_render() {
        let msg = decode_inbound(r#"{"formatted":"Message A","received":"12:00:01"}"#)
            .expect("decode");
        assert_eq!(msg.formatted, "Message A");
        assert_eq!(msg.render(), "Message A (12:00:01)");
        assert!(msg.original.is_none());
    }

    #[test]
    fn test_numeric_received() {
        let msg = decode_inbound(r#"{"formatted":"tick","received":1700000000}"#).expect("decode");
        assert_eq!(msg.received, Received::from(1_700_000_000));
        assert_eq!(msg.render(), "tick (1700000000)");

        let at = msg.received.as_datetime().expect("unix seconds");
        assert_eq!(at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let msg = decode_inbound(
            r#"{"original":"hi","formatted":"HI","received":"t","extra":[1,2,3]}"#,
        )
        .expect("decode");
        assert_eq!(msg.original.as_deref(), Some("hi"));
        assert_eq!(msg.formatted, "HI");
    }

    #[test]
    fn test_rfc3339_received() {
        let received = Received::from("2026-10-19T12:00:01Z");
        let at = received.as_datetime().expect("rfc3339");
        assert_eq!(at.timestamp(), 1_792_411_201);

        assert!(Received::from("12:00:01").as_datetime().is_none());
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = decode_inbound("{not json").unwrap_err();
        assert!(matches!(err, Error::MalformedFrame { .. }));

        let err = decode_inbound("").unwrap_err();
        assert!(matches!(err, Error::MalformedFrame { .. }));
    }

    #[test]
    fn test_wrong_shape_is_schema() {
        let err = decode_inbound(r#"{"received":"12:00:01"}"#).unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));

        let err = decode_inbound(r#"{"formatted":42,"received":"x"}"#).unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));

        let err = decode_inbound(r#""just a string""#).unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
    }
}
