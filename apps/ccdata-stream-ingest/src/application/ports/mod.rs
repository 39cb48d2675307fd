//! Port Interfaces
//!
//! Contracts between the ingestion pipeline and the outside world.
//!
//! ## Driven Ports (Outbound)
//!
//! - [`StreamConnector`] / [`StreamWrite`] / [`StreamRead`]: a message-framed
//!   bidirectional connection, split into its write and read halves so one
//!   reader loop can own the inbound side while the connection manager
//!   routes writes. Tests substitute in-memory transports here.
//! - [`BatchSink`]: downstream hand-off for drained tick batches. The
//!   default [`LoggingSink`] only logs; persistence or indexing plug in
//!   here.

use async_trait::async_trait;

use crate::domain::streaming::FrameKind;
use crate::infrastructure::ccdata::messages::IndexTickMessage;

// =============================================================================
// Transport Error
// =============================================================================

/// Transport-level failures surfaced through the stream ports.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Dialing the remote endpoint failed.
    #[error("connection handshake failed: {0}")]
    Connect(String),

    /// The underlying transport failed mid-stream.
    #[error("transport failure: {0}")]
    Io(String),

    /// The connection was closed by the peer or is already closed.
    #[error("connection closed")]
    Closed,
}

// =============================================================================
// Stream Ports
// =============================================================================

/// Read half of a stream connection.
#[async_trait]
pub trait StreamRead: Send {
    /// Read the next data frame, resolving when one arrives or the
    /// connection closes.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the connection fails or closes.
    async fn read(&mut self) -> Result<(FrameKind, Vec<u8>), TransportError>;
}

/// Write half of a stream connection.
#[async_trait]
pub trait StreamWrite: Send {
    /// Write one frame, resolving when it has been flushed.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the write fails.
    async fn write(&mut self, kind: FrameKind, payload: Vec<u8>) -> Result<(), TransportError>;

    /// Send a normal-closure control frame and release the connection.
    ///
    /// A second close may error but must not corrupt state.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the close handshake fails.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Factory for stream connections.
#[async_trait]
pub trait StreamConnector: Send + Sync {
    /// Open a connection to `url` and return its write and read halves.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the dial fails.
    async fn connect(
        &self,
        url: &str,
    ) -> Result<(Box<dyn StreamWrite>, Box<dyn StreamRead>), TransportError>;
}

// =============================================================================
// Batch Sink Port
// =============================================================================

/// Downstream consumer of drained tick batches.
///
/// This is the designated extension point for persistence or indexing;
/// the core only guarantees each buffered record is handed off exactly
/// once, in arrival order.
#[async_trait]
pub trait BatchSink: Send {
    /// Take ownership of one drained batch.
    ///
    /// # Errors
    ///
    /// Implementations may fail; the buffer loop logs the failure and does
    /// not retry the batch.
    async fn publish(&mut self, batch: Vec<IndexTickMessage>) -> anyhow::Result<()>;
}

/// Default sink: logs each handed-off tick at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSink;

impl LoggingSink {
    /// Create a new logging sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BatchSink for LoggingSink {
    async fn publish(&mut self, batch: Vec<IndexTickMessage>) -> anyhow::Result<()> {
        for tick in &batch {
            tracing::debug!(
                market = %tick.market,
                instrument = %tick.instrument,
                sequence = tick.sequence,
                value = %tick.value,
                "tick processed"
            );
        }
        Ok(())
    }
}
