//! Message Router and Error Sink
//!
//! The router consumes raw inbound messages in arrival order, classifies
//! each by its type tag, and forwards recognized classes onto their
//! per-class channel. Unrecognized tags are observed and logged only;
//! per-instrument subscription state tracking is an explicit future
//! extension of this step.
//!
//! The error sink drains the shared error channel for observability. No
//! error triggers reconnection, resubscription, or process termination
//! here; recovery policy belongs to a surrounding supervisory layer.

use tokio::sync::mpsc;

use crate::domain::streaming::InboundMessage;
use crate::infrastructure::ccdata::codec::{Classification, JsonCodec};
use crate::infrastructure::ccdata::manager::StreamError;
use crate::infrastructure::ccdata::messages::MessageClass;
use crate::infrastructure::metrics;

// =============================================================================
// Message Router
// =============================================================================

/// Classifies inbound messages and fans them out by class.
pub struct MessageRouter {
    inbound_rx: mpsc::Receiver<InboundMessage>,
    tick_tx: mpsc::Sender<InboundMessage>,
}

impl MessageRouter {
    /// Create a router reading from the shared inbound channel and
    /// forwarding index ticks onto their class channel.
    #[must_use]
    pub const fn new(
        inbound_rx: mpsc::Receiver<InboundMessage>,
        tick_tx: mpsc::Sender<InboundMessage>,
    ) -> Self {
        Self {
            inbound_rx,
            tick_tx,
        }
    }

    /// Run until the inbound channel closes.
    ///
    /// Returning drops the per-class sender, which signals the buffer loop
    /// to perform its final drain.
    pub async fn run(mut self) {
        let codec = JsonCodec::new();

        while let Some(msg) = self.inbound_rx.recv().await {
            match codec.classify(&msg.payload) {
                Err(e) => {
                    tracing::warn!(
                        client_id = msg.client_id,
                        error = %e,
                        "dropping undecodable message"
                    );
                }
                Ok(Classification::Recognized(class)) => {
                    metrics::record_frame_received(class.as_str());
                    tracing::debug!(
                        client_id = msg.client_id,
                        class = class.as_str(),
                        "message received"
                    );
                    match class {
                        MessageClass::IndexTick => {
                            if self.tick_tx.send(msg).await.is_err() {
                                tracing::warn!("tick channel closed, router exiting");
                                return;
                            }
                        }
                    }
                }
                Ok(Classification::Unrecognized(tag)) => {
                    metrics::record_frame_received("unrecognized");
                    tracing::debug!(
                        client_id = msg.client_id,
                        tag = %tag,
                        "unhandled message type"
                    );
                }
            }
        }

        tracing::debug!("inbound channel closed, router exiting");
    }
}

// =============================================================================
// Error Sink
// =============================================================================

/// Drains the shared error channel until it closes.
pub struct ErrorSink {
    error_rx: mpsc::UnboundedReceiver<StreamError>,
}

impl ErrorSink {
    /// Create an error sink for the given channel.
    #[must_use]
    pub const fn new(error_rx: mpsc::UnboundedReceiver<StreamError>) -> Self {
        Self { error_rx }
    }

    /// Run until the error channel closes, surfacing each error.
    pub async fn run(mut self) {
        while let Some(err) = self.error_rx.recv().await {
            metrics::record_stream_error(err.kind.metric_label());
            tracing::error!(
                client_id = err.client_id,
                error = %err.kind,
                "stream error reported"
            );
        }
        tracing::debug!("error channel closed, sink exiting");
    }
}

// =============================================================================
// Tests
// =============================================================================
