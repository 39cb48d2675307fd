//! Stream Codec Module
//!
//! JSON encoding and decoding for the CCData streamer. Inbound payloads are
//! classified by their `"TYPE"` discriminant before any full decode: the
//! router only needs the tag, and the buffer loop decodes the full record
//! for the one class it tracks.

use serde::Deserialize;

use super::messages::{IndexTickMessage, MessageClass};

// =============================================================================
// Error Type
// =============================================================================

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON encoding/decoding failed.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Classification
// =============================================================================

/// Result of classifying an inbound payload by its type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The tag maps to a class this client decodes.
    Recognized(MessageClass),
    /// The tag is valid JSON but not a tracked class; carries the raw tag.
    Unrecognized(String),
}

/// Minimal discriminant probe: only the `"TYPE"` field.
///
/// A missing tag defaults to the empty string and classifies as
/// unrecognized rather than a decode failure.
#[derive(Debug, Deserialize)]
struct TypeTag {
    #[serde(rename = "TYPE", default)]
    tag: String,
}

// =============================================================================
// JSON Codec
// =============================================================================

/// JSON codec for the CCData streamer.
#[derive(Debug, Default, Clone)]
pub struct JsonCodec;

impl JsonCodec {
    /// Create a new JSON codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Classify a raw payload by its `"TYPE"` discriminant.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not a JSON object.
    pub fn classify(&self, payload: &[u8]) -> Result<Classification, CodecError> {
        let probe: TypeTag = serde_json::from_slice(payload)?;
        Ok(match MessageClass::from_type_tag(&probe.tag) {
            Some(class) => Classification::Recognized(class),
            None => Classification::Unrecognized(probe.tag),
        })
    }

    /// Decode a full index tick record.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload does not match the index tick schema.
    pub fn decode_index_tick(&self, payload: &[u8]) -> Result<IndexTickMessage, CodecError> {
        Ok(serde_json::from_slice(payload)?)
    }

    /// Encode a value to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn encode<T: serde::Serialize>(&self, value: &T) -> Result<String, CodecError> {
        Ok(serde_json::to_string(value)?)
    }
}
