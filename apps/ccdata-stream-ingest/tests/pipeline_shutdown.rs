//! End-to-End Pipeline and Shutdown Tests
//!
//! Drives the full service - reader loop, router, buffer, sink - over an
//! in-memory transport, and verifies drain-based shutdown semantics.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use ccdata_stream_ingest::{
    ConnectionManager, FrameKind, IngestService, StreamConnector,
};
use common::{FakeConnector, RecordingSink, index_tick_products, tick_payload};

fn service_over(
    connector: Arc<FakeConnector>,
    flush_interval: Duration,
) -> (IngestService, RecordingSink) {
    let (inbound_tx, inbound_rx) = mpsc::channel(64);
    let (error_tx, error_rx) = mpsc::unbounded_channel();
    let manager = ConnectionManager::new(
        "wss://stream.test/?api_key=test-key".to_string(),
        connector as Arc<dyn StreamConnector>,
        inbound_tx,
        error_tx,
    );

    let sink = RecordingSink::default();
    let service = IngestService::new(
        manager,
        inbound_rx,
        error_rx,
        Box::new(sink.clone()),
        flush_interval,
    );
    (service, sink)
}

#[tokio::test]
async fn buffered_ticks_drain_exactly_once_on_stop() {
    let (connector, stream) = FakeConnector::single();
    // Flush interval far beyond the test: only the final drain may fire.
    let (mut service, sink) = service_over(connector, Duration::from_secs(600));

    service
        .start(&index_tick_products(&["BTC-USD"]))
        .await
        .unwrap();

    for sequence in 1..=3 {
        stream
            .frames_tx
            .send(Ok((FrameKind::Text, tick_payload(sequence, "BTC-USD"))))
            .unwrap();
    }

    // Let the frames travel reader -> router -> buffer.
    tokio::time::sleep(Duration::from_millis(200)).await;

    timeout(Duration::from_secs(5), service.stop()).await.unwrap();

    let batches = sink.batches.lock().unwrap();
    assert_eq!(batches.len(), 1, "final drain hands off exactly one batch");
    let sequences: Vec<u64> = batches[0].iter().map(|t| t.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
}

#[tokio::test]
async fn interval_flush_reaches_the_sink_without_shutdown() {
    let (connector, stream) = FakeConnector::single();
    let (mut service, sink) = service_over(connector, Duration::from_millis(200));

    service
        .start(&index_tick_products(&["BTC-USD"]))
        .await
        .unwrap();

    stream
        .frames_tx
        .send(Ok((FrameKind::Text, tick_payload(1, "BTC-USD"))))
        .unwrap();
    stream
        .frames_tx
        .send(Ok((FrameKind::Text, tick_payload(2, "BTC-USD"))))
        .unwrap();

    // Poll until the periodic flush has handed off both ticks.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        {
            let batches = sink.batches.lock().unwrap();
            let flushed: usize = batches.iter().map(Vec::len).sum();
            if flushed == 2 {
                break;
            }
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "periodic flush never reached the sink"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let flushed_before_stop = sink.batches.lock().unwrap().len();
    timeout(Duration::from_secs(5), service.stop()).await.unwrap();

    // Nothing new arrived after the flush, so stopping adds no batch.
    assert_eq!(sink.batches.lock().unwrap().len(), flushed_before_stop);
}

#[tokio::test]
async fn malformed_payloads_do_not_stall_the_pipeline() {
    let (connector, stream) = FakeConnector::single();
    let (mut service, sink) = service_over(connector, Duration::from_secs(600));

    service
        .start(&index_tick_products(&["BTC-USD"]))
        .await
        .unwrap();

    stream
        .frames_tx
        .send(Ok((FrameKind::Text, tick_payload(1, "BTC-USD"))))
        .unwrap();
    // Recognized class but a broken record: dropped at the buffer.
    stream
        .frames_tx
        .send(Ok((FrameKind::Text, br#"{"TYPE":"1101","CCSEQ":"bad"}"#.to_vec())))
        .unwrap();
    // Not JSON at all: dropped at the router.
    stream
        .frames_tx
        .send(Ok((FrameKind::Text, b"garbled".to_vec())))
        .unwrap();
    stream
        .frames_tx
        .send(Ok((FrameKind::Text, tick_payload(2, "BTC-USD"))))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    timeout(Duration::from_secs(5), service.stop()).await.unwrap();

    let batches = sink.batches.lock().unwrap();
    assert_eq!(batches.len(), 1);
    let sequences: Vec<u64> = batches[0].iter().map(|t| t.sequence).collect();
    assert_eq!(sequences, vec![1, 2]);
}

#[tokio::test]
async fn unrecognized_messages_never_reach_the_sink() {
    let (connector, stream) = FakeConnector::single();
    let (mut service, sink) = service_over(connector, Duration::from_secs(600));

    service
        .start(&index_tick_products(&["BTC-USD"]))
        .await
        .unwrap();

    stream
        .frames_tx
        .send(Ok((FrameKind::Text, br#"{"TYPE":"4000","MESSAGE":"HEARTBEAT"}"#.to_vec())))
        .unwrap();
    stream
        .frames_tx
        .send(Ok((FrameKind::Text, br#"{"MESSAGE":"SUBSCRIBE_COMPLETE"}"#.to_vec())))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    timeout(Duration::from_secs(5), service.stop()).await.unwrap();

    assert!(sink.batches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn stop_completes_with_zero_connections() {
    let connector = FakeConnector::failing("connection refused");
    let (mut service, sink) = service_over(connector, Duration::from_secs(600));

    // The dial fails; the pipeline is running but no connection exists.
    assert!(
        service
            .start(&index_tick_products(&["BTC-USD"]))
            .await
            .is_err()
    );

    timeout(Duration::from_secs(5), service.stop()).await.unwrap();
    assert!(sink.batches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn stop_closes_the_registered_connection() {
    let (connector, stream) = FakeConnector::single();
    let (mut service, _sink) = service_over(connector, Duration::from_secs(600));

    service
        .start(&index_tick_products(&["BTC-USD"]))
        .await
        .unwrap();

    timeout(Duration::from_secs(5), service.stop()).await.unwrap();
    assert_eq!(stream.closes.load(std::sync::atomic::Ordering::SeqCst), 1);
}
