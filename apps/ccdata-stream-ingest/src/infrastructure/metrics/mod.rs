//! Prometheus Metrics Module
//!
//! Exposes ingestion metrics via the Prometheus exporter's own HTTP
//! listener.
//!
//! # Metrics Categories
//!
//! - **Frames**: counts of classified inbound frames by class
//! - **Ticks**: buffered ticks and flush batches
//! - **Errors**: stream errors by kind
//! - **Connections**: open stream connections

use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

static INSTALLED: OnceLock<()> = OnceLock::new();

/// Install the Prometheus recorder with its HTTP listener on `port`.
///
/// Subsequent calls are no-ops.
///
/// # Panics
///
/// Panics if the recorder cannot be installed.
#[allow(clippy::expect_used)]
pub fn init_metrics(port: u16) {
    INSTALLED.get_or_init(|| {
        PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], port))
            .install()
            .expect("failed to install Prometheus recorder");

        register_metrics();
    });
}

fn register_metrics() {
    describe_counter!(
        "ingest_frames_received_total",
        "Classified inbound frames by message class"
    );
    describe_counter!(
        "ingest_ticks_buffered_total",
        "Index ticks decoded and appended to the buffer"
    );
    describe_counter!(
        "ingest_flush_batches_total",
        "Buffer drains handed to the batch sink"
    );
    describe_counter!(
        "ingest_flushed_ticks_total",
        "Index ticks handed to the batch sink"
    );
    describe_counter!(
        "ingest_stream_errors_total",
        "Stream errors reported to the error sink, by kind"
    );
    describe_gauge!(
        "ingest_open_connections",
        "Open stream connections"
    );
}

/// Record a classified inbound frame.
pub fn record_frame_received(class: &'static str) {
    counter!("ingest_frames_received_total", "class" => class).increment(1);
}

/// Record one tick appended to the buffer.
pub fn record_tick_buffered() {
    counter!("ingest_ticks_buffered_total").increment(1);
}

/// Record one buffer drain of `count` ticks.
pub fn record_flush(count: usize) {
    counter!("ingest_flush_batches_total").increment(1);
    counter!("ingest_flushed_ticks_total").increment(count as u64);
}

/// Record a stream error reaching the error sink.
pub fn record_stream_error(kind: &'static str) {
    counter!("ingest_stream_errors_total", "kind" => kind).increment(1);
}

/// Update the open connection gauge.
pub fn set_open_connections(count: f64) {
    gauge!("ingest_open_connections").set(count);
}
