//! Pipeline Services
//!
//! One service per long-lived loop:
//!
//! - `MessageRouter`: classification and per-class fan-out
//! - `ErrorSink`: error-channel drain (observability only)
//! - `TickBuffer`: interval batch buffering of index ticks
//! - `IngestService`: start/stop lifecycle facade over all of them

pub mod buffer;
pub mod ingest;
pub mod router;

pub use buffer::{DEFAULT_FLUSH_INTERVAL, TickBuffer};
pub use ingest::IngestService;
pub use router::{ErrorSink, MessageRouter};
