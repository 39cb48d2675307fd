//! Application Layer - Pipeline services and port definitions.
//!
//! This layer contains the ingestion pipeline loops and the port
//! interfaces that decouple them from the concrete transport.

/// Port interfaces for the stream transport and the batch hand-off seam.
pub mod ports;

/// Pipeline services: routing, buffering, error draining, lifecycle.
pub mod services;
