//! WebSocket message types.
//!
//! This module defines what travels inside text frames between the
//! client and the server.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Payload |
//! |--------------|-----------|---------|
//! | `OutboundValue` | Client → Server | JSON string literal |
//! | `InboundMessage` | Server → Client | `{"formatted", "received", ...}` |
//! | `EchoReply` | Server → Client | `{"original", "formatted", "received"}` |
//!
//! # Decoding
//!
//! Inbound frames are decoded defensively: invalid JSON and JSON of the
//! wrong shape are reported as different errors ([`crate::Error::MalformedFrame`]
//! and [`crate::Error::Schema`]) so the client can drop either without
//! stopping.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `echo` | Echo endpoint reply |
//! | `inbound` | Inbound record schema and decoder |
//! | `outbound` | Outbound value encoding |

// ============================================================================
// Submodules
// ============================================================================

/// Echo endpoint reply record.
pub mod echo;

/// Inbound message schema.
pub mod inbound;

/// Outbound value encoding.
pub mod outbound;

// ============================================================================
// Re-exports
// ============================================================================

pub use echo::EchoReply;
pub use inbound::{InboundMessage, Received, decode_inbound};
pub use outbound::OutboundValue;
