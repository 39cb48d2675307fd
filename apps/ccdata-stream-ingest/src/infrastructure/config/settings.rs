//! Ingest Configuration Settings
//!
//! Configuration types for the ingestion client, loaded from environment
//! variables.

use std::time::Duration;

use crate::application::services::buffer::DEFAULT_FLUSH_INTERVAL;

/// Default streamer host.
const DEFAULT_STREAM_HOST: &str = "data-streamer.cryptocompare.com";

/// Default capacity of the shared inbound channel.
const DEFAULT_INBOUND_CAPACITY: usize = 100;

/// Default Prometheus exporter port.
const DEFAULT_METRICS_PORT: u16 = 9090;

/// Pre-shared streamer credential.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    /// Create a new API key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key as a string slice, for embedding in the connection URL.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ApiKey").field(&"[REDACTED]").finish()
    }
}

/// Complete ingestion configuration.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Streamer API key.
    pub api_key: ApiKey,
    /// Streamer host name.
    pub stream_host: String,
    /// Interval between buffer flush ticks.
    pub flush_interval: Duration,
    /// Capacity of the shared inbound channel.
    pub inbound_capacity: usize,
    /// Prometheus exporter port.
    pub metrics_port: u16,
}

impl IngestConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `CCDATA_API_KEY` is missing or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("CCDATA_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("CCDATA_API_KEY".to_string()))?;

        if api_key.is_empty() {
            return Err(ConfigError::EmptyValue("CCDATA_API_KEY".to_string()));
        }

        Ok(Self {
            api_key: ApiKey::new(api_key),
            stream_host: std::env::var("CCDATA_STREAM_HOST")
                .unwrap_or_else(|_| DEFAULT_STREAM_HOST.to_string()),
            flush_interval: parse_env_duration_secs(
                "INGEST_FLUSH_INTERVAL_SECS",
                DEFAULT_FLUSH_INTERVAL,
            ),
            inbound_capacity: parse_env_usize("INGEST_INBOUND_CAPACITY", DEFAULT_INBOUND_CAPACITY),
            metrics_port: parse_env_u16("INGEST_METRICS_PORT", DEFAULT_METRICS_PORT),
        })
    }

    /// The streamer WebSocket URL with the credential in the query string.
    #[must_use]
    pub fn stream_url(&self) -> String {
        format!(
            "wss://{}/?api_key={}",
            self.stream_host,
            self.api_key.as_str()
        )
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
}

fn parse_env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}
