//! Connection Manager
//!
//! Owns the registry of open stream connections (at most one under current
//! policy), encodes and writes subscription requests, and runs one reader
//! loop per connection.
//!
//! # Backpressure
//!
//! Reader loops enqueue inbound frames with a non-blocking attempt. When
//! the inbound channel is full the consumer is not keeping pace: the loop
//! reports a falling-behind error and terminates instead of buffering
//! without bound or blocking the network stack. The transport stays
//! registered (and is closed at shutdown); any recovery policy belongs to
//! a supervisory layer.
//!
//! # Shutdown
//!
//! `stop` is cooperative and drain-based: it cancels the stopping token,
//! waits for every reader loop to exit at its blocking-read boundary,
//! closes every registered client in registration order, and finally drops
//! the inbound and error senders so downstream loops observe closure.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::codec::JsonCodec;
use super::messages::{InstrumentPair, MessageClass, SubscriptionRequest};
use crate::application::ports::{StreamConnector, StreamRead, StreamWrite};
use crate::domain::product::ProductSubscriptions;
use crate::domain::streaming::{ClientId, FrameKind, InboundMessage};
use crate::infrastructure::metrics;

// =============================================================================
// Error Types
// =============================================================================

/// Failure taxonomy for the stream layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamErrorKind {
    /// Initial dial failed; fatal to that subscribe call only.
    #[error("connect failed: {0}")]
    Connect(String),

    /// A read failed; terminates that connection's reader loop.
    #[error("read failed: {0}")]
    Read(String),

    /// A subscription write failed; the product is skipped.
    #[error("write failed: {0}")]
    Write(String),

    /// Closing a connection during shutdown failed.
    #[error("close failed: {0}")]
    Close(String),

    /// The inbound queue was full; the reader loop shed its connection.
    #[error("inbound queue full, consumer falling behind")]
    FallingBehind,

    /// A product name with no registered response groups.
    #[error("no response groups registered for product {0}")]
    UnknownProduct(String),

    /// Serializing a subscription request failed.
    #[error("subscription encoding failed: {0}")]
    Encode(String),
}

impl StreamErrorKind {
    /// Stable label for the error metric.
    #[must_use]
    pub const fn metric_label(&self) -> &'static str {
        match self {
            Self::Connect(_) => "connect",
            Self::Read(_) => "read",
            Self::Write(_) => "write",
            Self::Close(_) => "close",
            Self::FallingBehind => "falling_behind",
            Self::UnknownProduct(_) => "unknown_product",
            Self::Encode(_) => "encode",
        }
    }
}

/// An error together with the connection it originated from.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("client {client_id}: {kind}")]
pub struct StreamError {
    /// Identifier of the originating connection.
    pub client_id: ClientId,
    /// The underlying failure.
    #[source]
    pub kind: StreamErrorKind,
}

impl StreamError {
    /// Create a new stream error.
    #[must_use]
    pub const fn new(client_id: ClientId, kind: StreamErrorKind) -> Self {
        Self { client_id, kind }
    }
}

// =============================================================================
// Connection Manager
// =============================================================================

struct RegisteredClient {
    id: ClientId,
    write: Box<dyn StreamWrite>,
}

/// Manages the stream connection pool and the subscription protocol.
///
/// Current policy pins all subscriptions to the single most recently
/// created connection; a second connection is never opened while one is
/// registered.
pub struct ConnectionManager {
    url: String,
    connector: Arc<dyn StreamConnector>,
    codec: JsonCodec,
    inbound_tx: mpsc::Sender<InboundMessage>,
    error_tx: mpsc::UnboundedSender<StreamError>,
    cancel: CancellationToken,
    tracker: TaskTracker,
    clients: Vec<RegisteredClient>,
    next_client_id: ClientId,
}

impl ConnectionManager {
    /// Create a manager with an empty connection registry.
    #[must_use]
    pub fn new(
        url: String,
        connector: Arc<dyn StreamConnector>,
        inbound_tx: mpsc::Sender<InboundMessage>,
        error_tx: mpsc::UnboundedSender<StreamError>,
    ) -> Self {
        Self {
            url,
            connector,
            codec: JsonCodec::new(),
            inbound_tx,
            error_tx,
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
            clients: Vec::new(),
            next_client_id: 0,
        }
    }

    /// Subscribe the given products on the active connection.
    ///
    /// Dials a connection on first use; the new client's reader loop is
    /// started before any write. Per-product failures (unknown product,
    /// encoding, write) are reported to the error sink and that product is
    /// skipped; the call continues with the remaining products.
    ///
    /// # Errors
    ///
    /// Returns the dial failure when no connection exists and connecting
    /// fails; the same error is also reported to the error sink and no
    /// client is registered.
    pub async fn subscribe(&mut self, products: &ProductSubscriptions) -> Result<(), StreamError> {
        self.ensure_client().await?;

        let Some(client) = self.clients.last_mut() else {
            return Ok(());
        };

        for (name, instruments) in products {
            let Some(class) = MessageClass::for_product(name) else {
                let _ = self.error_tx.send(StreamError::new(
                    client.id,
                    StreamErrorKind::UnknownProduct(name.to_string()),
                ));
                continue;
            };

            let pairs: Vec<InstrumentPair> = instruments.iter().map(InstrumentPair::from).collect();
            let request = SubscriptionRequest::add(class, pairs);

            let json = match self.codec.encode(&request) {
                Ok(json) => json,
                Err(e) => {
                    let _ = self.error_tx.send(StreamError::new(
                        client.id,
                        StreamErrorKind::Encode(e.to_string()),
                    ));
                    continue;
                }
            };

            tracing::debug!(
                client_id = client.id,
                product = %name,
                instruments = instruments.len(),
                "sending subscription request"
            );

            if let Err(e) = client.write.write(FrameKind::Text, json.into_bytes()).await {
                let _ = self.error_tx.send(StreamError::new(
                    client.id,
                    StreamErrorKind::Write(e.to_string()),
                ));
            }
        }

        Ok(())
    }

    /// Stop the manager: wait for reader loops, close clients, close
    /// channels.
    ///
    /// Consuming `self` makes stop at-most-once by construction. Completes
    /// without blocking when zero connections were ever opened.
    pub async fn stop(mut self) {
        tracing::info!(clients = self.clients.len(), "connection manager stopping");

        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;

        for client in &mut self.clients {
            tracing::info!(client_id = client.id, "closing client");
            if let Err(e) = client.write.close().await {
                let _ = self.error_tx.send(StreamError::new(
                    client.id,
                    StreamErrorKind::Close(e.to_string()),
                ));
            }
        }
        metrics::set_open_connections(0.0);

        // Dropping the manager drops its inbound and error senders; the
        // reader-loop clones are already gone, so downstream loops observe
        // channel closure from here.
    }

    /// Dial and register a connection if the registry is empty.
    async fn ensure_client(&mut self) -> Result<(), StreamError> {
        if !self.clients.is_empty() {
            return Ok(());
        }

        let id = self.next_client_id;
        match self.connector.connect(&self.url).await {
            Ok((write, read)) => {
                self.next_client_id += 1;
                self.clients.push(RegisteredClient { id, write });
                metrics::set_open_connections(self.clients.len() as f64);
                tracing::info!(client_id = id, "stream client connected");

                // Reader loop starts before any write is issued.
                self.tracker.spawn(read_from_client(
                    id,
                    read,
                    self.inbound_tx.clone(),
                    self.error_tx.clone(),
                    self.cancel.clone(),
                ));
                Ok(())
            }
            Err(e) => {
                let err = StreamError::new(id, StreamErrorKind::Connect(e.to_string()));
                let _ = self.error_tx.send(err.clone());
                Err(err)
            }
        }
    }
}

// =============================================================================
// Reader Loop
// =============================================================================

/// Read frames from one client until stopped or the read path fails.
async fn read_from_client(
    id: ClientId,
    mut read: Box<dyn StreamRead>,
    inbound_tx: mpsc::Sender<InboundMessage>,
    error_tx: mpsc::UnboundedSender<StreamError>,
    cancel: CancellationToken,
) {
    let failure = loop {
        if cancel.is_cancelled() {
            break None;
        }

        let (kind, payload) = tokio::select! {
            () = cancel.cancelled() => break None,
            result = read.read() => match result {
                Ok(frame) => frame,
                Err(e) => break Some(StreamErrorKind::Read(e.to_string())),
            },
        };

        // Non-blocking enqueue: a full channel means the consumer cannot
        // keep pace, and this loop sheds its connection rather than buffer
        // without bound. The frame in hand is dropped, never retried.
        match inbound_tx.try_send(InboundMessage::new(id, kind, payload)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => break Some(StreamErrorKind::FallingBehind),
            Err(TrySendError::Closed(_)) => break None,
        }
    };

    if let Some(kind) = failure {
        let _ = error_tx.send(StreamError::new(id, kind));
    }
    tracing::debug!(client_id = id, "reader loop exited");
}

// =============================================================================
// Tests
// =============================================================================
