#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! CCData Stream Ingest - Index Tick Ingestion Client
//!
//! Maintains a single persistent WebSocket connection to the CCData index
//! streamer, subscribes to configured index products, classifies inbound
//! messages by type tag, and buffers aggregate index ticks for periodic
//! batch processing.
//!
//! # Layers (inside -> outside)
//!
//! - **Domain**: Product catalog and stream ingestion types
//!   - `product`: product name to instrument mapping
//!   - `streaming`: frames, inbound messages, client identifiers
//!
//! - **Application**: Pipeline services and port definitions
//!   - `ports`: transport and batch-sink seams
//!   - `services`: router, error sink, tick buffer, lifecycle facade
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `ccdata`: wire types, JSON codec, WebSocket transport, connections
//!   - `config`: environment-backed configuration
//!   - `metrics`: Prometheus instrumentation
//!   - `telemetry`: tracing subscriber setup
//!
//! # Data Flow
//!
//! ```text
//! CCData WS ──▶ reader loop ──▶ inbound channel ──▶ MessageRouter
//!                                                       │
//!                                          tick channel │ (depth 1)
//!                                                       ▼
//!                                  TickBuffer ──▶ BatchSink (5s drain)
//! ```
//!
//! Errors from every stage funnel into one error channel drained by the
//! `ErrorSink` for observability; recovery policy is left to the host.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Product catalog and core ingestion types.
pub mod domain;

/// Application layer - Pipeline services and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::product::{
    INDEX_TICK_PRODUCT, InstrumentSpec, ProductName, ProductSubscriptions,
};
pub use domain::streaming::{ClientId, FrameKind, InboundMessage};

// Ports
pub use application::ports::{
    BatchSink, LoggingSink, StreamConnector, StreamRead, StreamWrite, TransportError,
};

// Pipeline services
pub use application::services::{
    DEFAULT_FLUSH_INTERVAL, ErrorSink, IngestService, MessageRouter, TickBuffer,
};

// CCData adapters
pub use infrastructure::ccdata::{
    Classification, CodecError, ConnectionManager, IndexTickMessage, InstrumentPair, JsonCodec,
    MessageClass, ResponseGroup, StreamError, StreamErrorKind, SubscriptionAction,
    SubscriptionRequest, WsConnector,
};

// Configuration
pub use infrastructure::config::{ApiKey, ConfigError, IngestConfig};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry;
