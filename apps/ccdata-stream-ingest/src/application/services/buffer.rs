//! Tick Buffer
//!
//! Accumulates decoded index ticks between flush ticks and drains them on
//! a fixed interval or on shutdown. The buffer has no hard cap: its size
//! is bounded in practice by flush interval times arrival rate, and the
//! tracked class is a low-rate aggregate.
//!
//! On upstream channel closure the loop performs one final unconditional
//! drain, so no buffered data is silently discarded on graceful shutdown.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::application::ports::BatchSink;
use crate::domain::streaming::InboundMessage;
use crate::infrastructure::ccdata::codec::JsonCodec;
use crate::infrastructure::ccdata::messages::IndexTickMessage;
use crate::infrastructure::metrics;

/// Default interval between flush ticks.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);

/// Buffers one message class between periodic drains.
pub struct TickBuffer {
    tick_rx: mpsc::Receiver<InboundMessage>,
    sink: Box<dyn BatchSink>,
    flush_interval: Duration,
    codec: JsonCodec,
    buffered: Vec<IndexTickMessage>,
}

impl TickBuffer {
    /// Create a buffer draining into `sink` every `flush_interval`.
    #[must_use]
    pub fn new(
        tick_rx: mpsc::Receiver<InboundMessage>,
        sink: Box<dyn BatchSink>,
        flush_interval: Duration,
    ) -> Self {
        Self {
            tick_rx,
            sink,
            flush_interval,
            codec: JsonCodec::new(),
            buffered: Vec::new(),
        }
    }

    /// Run until the tick channel closes, then drain any remainder.
    ///
    /// Tick arrival and the flush timer are both valid wake reasons;
    /// neither has priority. The timer lives in this loop and stops with
    /// it.
    pub async fn run(mut self) {
        let mut flush = interval_at(
            Instant::now() + self.flush_interval,
            self.flush_interval,
        );
        flush.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                maybe = self.tick_rx.recv() => match maybe {
                    Some(msg) => self.append(msg),
                    None => break,
                },
                _ = flush.tick() => self.flush().await,
            }
        }

        tracing::info!(
            remaining = self.buffered.len(),
            "tick channel closed, draining remaining buffered ticks"
        );
        self.flush().await;
    }

    /// Decode and append one raw tick; malformed payloads are dropped
    /// without touching buffer state.
    fn append(&mut self, msg: InboundMessage) {
        match self.codec.decode_index_tick(&msg.payload) {
            Ok(tick) => {
                tracing::debug!(
                    client_id = msg.client_id,
                    instrument = %tick.instrument,
                    sequence = tick.sequence,
                    "index tick buffered"
                );
                metrics::record_tick_buffered();
                self.buffered.push(tick);
            }
            Err(e) => {
                tracing::warn!(
                    client_id = msg.client_id,
                    error = %e,
                    "dropping malformed index tick"
                );
            }
        }
    }

    /// Hand the buffered batch to the sink; a no-op on an empty buffer.
    async fn flush(&mut self) {
        if self.buffered.is_empty() {
            tracing::debug!("no buffered ticks to process");
            return;
        }

        let batch = std::mem::take(&mut self.buffered);
        let count = batch.len();
        metrics::record_flush(count);

        if let Err(e) = self.sink.publish(batch).await {
            tracing::error!(error = %e, count, "batch sink failed, batch dropped");
        } else {
            tracing::info!(count, "processed buffered ticks");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
