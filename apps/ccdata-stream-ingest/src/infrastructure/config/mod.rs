//! Environment-backed configuration for the ingestion client.

mod settings;

pub use settings::{ApiKey, ConfigError, IngestConfig};
