//! CCData Stream Adapters
//!
//! The provider-facing layer: wire types and JSON codec for the CCData
//! index streamer, the WebSocket transport adapter, and the connection
//! manager that owns the subscription protocol and reader loops.

pub mod client;
pub mod codec;
pub mod manager;
pub mod messages;

pub use client::WsConnector;
pub use codec::{Classification, CodecError, JsonCodec};
pub use manager::{ConnectionManager, StreamError, StreamErrorKind};
pub use messages::{
    IndexTickMessage, InstrumentPair, MessageClass, ResponseGroup, SubscriptionAction,
    SubscriptionRequest,
};
