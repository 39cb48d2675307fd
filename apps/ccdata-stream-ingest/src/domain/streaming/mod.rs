//! Stream Ingestion Types
//!
//! Cross-loop currency of the ingestion pipeline: raw frames read from a
//! stream connection, tagged with the connection they arrived on. Payloads
//! stay opaque bytes until the router classifies them.

// =============================================================================
// Types
// =============================================================================

/// Unique identifier for a stream connection.
///
/// Assigned by the connection manager at registration from a monotonically
/// increasing counter; never reused within a process lifetime.
pub type ClientId = u64;

/// Kind of a transport frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// UTF-8 text frame (the provider's JSON messages).
    Text,
    /// Binary frame.
    Binary,
}

/// A raw message read from a stream connection.
///
/// Produced by a reader loop, consumed exactly once by the message router.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Identifier of the connection the frame arrived on.
    pub client_id: ClientId,
    /// Frame kind as read from the transport.
    pub kind: FrameKind,
    /// Raw payload bytes, untouched by the reader loop.
    pub payload: Vec<u8>,
}

impl InboundMessage {
    /// Create a new inbound message.
    #[must_use]
    pub const fn new(client_id: ClientId, kind: FrameKind, payload: Vec<u8>) -> Self {
        Self {
            client_id,
            kind,
            payload,
        }
    }
}
