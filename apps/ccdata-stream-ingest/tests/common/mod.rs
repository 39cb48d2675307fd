//! Shared test support: in-memory stream transports and a recording sink.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use ccdata_stream_ingest::{
    BatchSink, FrameKind, IndexTickMessage, InstrumentSpec, ProductName, ProductSubscriptions,
    StreamConnector, StreamRead, StreamWrite, TransportError, INDEX_TICK_PRODUCT,
};

pub type FrameResult = Result<(FrameKind, Vec<u8>), TransportError>;

/// Test-side handles for one scripted connection.
pub struct FakeStream {
    /// Feed frames (or read errors) to the connection's reader loop.
    pub frames_tx: mpsc::UnboundedSender<FrameResult>,
    /// Frames the manager wrote to the connection.
    pub written_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    /// Number of close calls on the write half.
    pub closes: Arc<AtomicUsize>,
}

struct FakeWrite {
    written: mpsc::UnboundedSender<Vec<u8>>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl StreamWrite for FakeWrite {
    async fn write(&mut self, _kind: FrameKind, payload: Vec<u8>) -> Result<(), TransportError> {
        let _ = self.written.send(payload);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FakeRead {
    frames: mpsc::UnboundedReceiver<FrameResult>,
}

#[async_trait]
impl StreamRead for FakeRead {
    async fn read(&mut self) -> Result<(FrameKind, Vec<u8>), TransportError> {
        match self.frames.recv().await {
            Some(result) => result,
            None => Err(TransportError::Closed),
        }
    }
}

enum Outcome {
    Connect { write: FakeWrite, read: FakeRead },
    Fail(String),
}

/// Scripted connector: hands out prepared connections in order.
pub struct FakeConnector {
    outcomes: Mutex<VecDeque<Outcome>>,
    dials: AtomicUsize,
}

impl FakeConnector {
    /// One good connection; returns the test-side handles for it.
    pub fn single() -> (Arc<Self>, FakeStream) {
        let (written_tx, written_rx) = mpsc::unbounded_channel();
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let closes = Arc::new(AtomicUsize::new(0));

        let connector = Arc::new(Self {
            outcomes: Mutex::new(VecDeque::from([Outcome::Connect {
                write: FakeWrite {
                    written: written_tx,
                    closes: Arc::clone(&closes),
                },
                read: FakeRead { frames: frames_rx },
            }])),
            dials: AtomicUsize::new(0),
        });

        (
            connector,
            FakeStream {
                frames_tx,
                written_rx,
                closes,
            },
        )
    }

    /// Every dial fails with the given reason.
    pub fn failing(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(VecDeque::from([Outcome::Fail(reason.to_string())])),
            dials: AtomicUsize::new(0),
        })
    }

    /// Number of dial attempts so far.
    pub fn dials(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamConnector for FakeConnector {
    async fn connect(
        &self,
        _url: &str,
    ) -> Result<(Box<dyn StreamWrite>, Box<dyn StreamRead>), TransportError> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        match self.outcomes.lock().unwrap().pop_front() {
            Some(Outcome::Connect { write, read }) => Ok((Box::new(write), Box::new(read))),
            Some(Outcome::Fail(reason)) => Err(TransportError::Connect(reason)),
            None => Err(TransportError::Connect("no scripted connection".to_string())),
        }
    }
}

/// Sink that records every handed-off batch.
#[derive(Default, Clone)]
pub struct RecordingSink {
    pub batches: Arc<Mutex<Vec<Vec<IndexTickMessage>>>>,
}

#[async_trait]
impl BatchSink for RecordingSink {
    async fn publish(&mut self, batch: Vec<IndexTickMessage>) -> anyhow::Result<()> {
        self.batches.lock().unwrap().push(batch);
        Ok(())
    }
}

/// A well-formed index tick payload.
pub fn tick_payload(sequence: u64, instrument: &str) -> Vec<u8> {
    format!(
        r#"{{
            "TYPE": "1101",
            "MARKET": "cadli",
            "INSTRUMENT": "{instrument}",
            "CCSEQ": {sequence},
            "VALUE": 64250.37,
            "VALUE_LAST_UPDATE_TS": 1722470400,
            "VALUE_LAST_UPDATE_TS_NS": 250000000,
            "CURRENT_HOUR_VOLUME": 1845.2,
            "CURRENT_HOUR_OPEN": 64110.0
        }}"#
    )
    .into_bytes()
}

/// A product map subscribing the index tick product to the given instruments.
pub fn index_tick_products(instruments: &[&str]) -> ProductSubscriptions {
    ProductSubscriptions::from([(
        ProductName::from(INDEX_TICK_PRODUCT),
        instruments
            .iter()
            .map(|i| InstrumentSpec {
                market: "cadli".to_string(),
                instrument: (*i).to_string(),
            })
            .collect(),
    )])
}
