//! Ingest Service
//!
//! The start/stop lifecycle facade the host process drives. Wires the
//! pipeline loops (router, error sink, tick buffer) to the connection
//! manager and shuts everything down in drain order: connection layer
//! first, then the pipeline, so the final buffer drain sees every message
//! that was read.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;

use super::buffer::TickBuffer;
use super::router::{ErrorSink, MessageRouter};
use crate::application::ports::BatchSink;
use crate::domain::product::ProductSubscriptions;
use crate::domain::streaming::InboundMessage;
use crate::infrastructure::ccdata::manager::{ConnectionManager, StreamError};

/// Depth of the per-class tick channel. The buffering stage drains faster
/// than ticks arrive for the one tracked class; tune per class if more are
/// adopted.
const TICK_CHANNEL_DEPTH: usize = 1;

/// Owns the ingestion pipeline and its lifecycle.
pub struct IngestService {
    manager: ConnectionManager,
    tracker: TaskTracker,
    inbound_rx: Option<mpsc::Receiver<InboundMessage>>,
    error_rx: Option<mpsc::UnboundedReceiver<StreamError>>,
    sink: Option<Box<dyn BatchSink>>,
    flush_interval: Duration,
}

impl IngestService {
    /// Create a service over a connection manager and the receiving ends
    /// of its inbound and error channels.
    #[must_use]
    pub fn new(
        manager: ConnectionManager,
        inbound_rx: mpsc::Receiver<InboundMessage>,
        error_rx: mpsc::UnboundedReceiver<StreamError>,
        sink: Box<dyn BatchSink>,
        flush_interval: Duration,
    ) -> Self {
        Self {
            manager,
            tracker: TaskTracker::new(),
            inbound_rx: Some(inbound_rx),
            error_rx: Some(error_rx),
            sink: Some(sink),
            flush_interval,
        }
    }

    /// Start the pipeline loops (first call only) and subscribe the given
    /// products.
    ///
    /// # Errors
    ///
    /// Returns the dial failure when connecting for the first subscription
    /// fails; the pipeline keeps running and a later call may retry.
    pub async fn start(&mut self, products: &ProductSubscriptions) -> Result<(), StreamError> {
        if let (Some(inbound_rx), Some(error_rx), Some(sink)) = (
            self.inbound_rx.take(),
            self.error_rx.take(),
            self.sink.take(),
        ) {
            let (tick_tx, tick_rx) = mpsc::channel(TICK_CHANNEL_DEPTH);
            self.tracker
                .spawn(MessageRouter::new(inbound_rx, tick_tx).run());
            self.tracker.spawn(ErrorSink::new(error_rx).run());
            self.tracker
                .spawn(TickBuffer::new(tick_rx, sink, self.flush_interval).run());
            tracing::info!("ingest pipeline started");
        }

        self.manager.subscribe(products).await
    }

    /// Stop the connection layer, then wait for the pipeline to drain.
    ///
    /// Safe to call at most once (enforced by consuming `self`); completes
    /// without blocking even if zero connections were ever opened.
    pub async fn stop(self) {
        tracing::info!("ingest service stopping");

        // Closes clients and the inbound/error channels; the router and
        // error sink exit on closure, and the buffer performs its final
        // drain when the router drops the tick channel.
        self.manager.stop().await;

        self.tracker.close();
        self.tracker.wait().await;
        tracing::info!("ingest service stopped");
    }
}
