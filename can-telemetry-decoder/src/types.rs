//! Core types for the CAN telemetry decoder library
//!
//! This module defines the frame envelope received from the message bus and the
//! error taxonomy shared by the codec, the message decoders and the publisher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type used throughout the decoder
pub type Timestamp = DateTime<Utc>;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// One bus message before identifier-specific interpretation.
///
/// The JSON shape is `{"id": "6B0", "length": 8, "data": "00A1...", "meta": ...}`.
/// `length` is whatever the producer claimed and is never trusted by the decoders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameEnvelope {
    /// Hex message identifier, no `0x` prefix, arbitrary case
    #[serde(rename = "id")]
    pub identifier: String,
    /// Claimed payload length in bytes
    #[serde(default)]
    pub length: usize,
    /// Hex-encoded payload
    #[serde(rename = "data", default)]
    pub payload: String,
    /// Producer-defined metadata (the bus reader stores the inter-frame delay here)
    #[serde(default)]
    pub meta: serde_json::Value,
}

impl FrameEnvelope {
    /// Create an envelope from already formatted parts
    pub fn new(identifier: impl Into<String>, length: usize, payload: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            length,
            payload: payload.into(),
            meta: serde_json::Value::Null,
        }
    }

    /// Build the envelope a bus reader publishes for a captured frame
    pub fn from_frame(can_id: u32, data: &[u8], arrival_delta_ms: u64) -> Self {
        Self {
            identifier: format!("{:X}", can_id),
            length: data.len(),
            payload: hex::encode_upper(data),
            meta: serde_json::Value::from(arrival_delta_ms),
        }
    }

    /// Builder method: attach metadata
    pub fn with_meta(mut self, meta: impl Into<serde_json::Value>) -> Self {
        self.meta = meta.into();
        self
    }

    /// Parse an envelope from raw bus bytes
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| DecoderError::InvalidEnvelope(e.to_string()))
    }

    /// Serialize to a single JSON line (no trailing newline)
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| DecoderError::InvalidEnvelope(e.to_string()))
    }

    /// Milliseconds since the previous frame, if `meta` carries one.
    ///
    /// Accepts a JSON integer or a string holding a decimal integer.
    pub fn arrival_delta_ms(&self) -> Option<u64> {
        match &self.meta {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for FrameEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.identifier, self.length, self.payload)
    }
}

/// Errors that can occur during decoding and publishing
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Invalid hex payload: {0}")]
    InvalidEncoding(String),

    #[error("Invalid payload length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Field at offset {offset} (width {width}) out of range for {len} byte payload")]
    OutOfRange { offset: usize, width: usize, len: usize },

    #[error("Failed to publish {document}: {reason}")]
    PublishFailure { document: String, reason: String },

    #[error("Invalid frame envelope: {0}")]
    InvalidEnvelope(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_from_bus_json() {
        let json = br#"{"id":"6b1","length":8,"data":"0015FF929BF300ED","meta":12}"#;
        let envelope = FrameEnvelope::from_json(json).unwrap();
        assert_eq!(envelope.identifier, "6b1");
        assert_eq!(envelope.length, 8);
        assert_eq!(envelope.payload, "0015FF929BF300ED");
        assert_eq!(envelope.arrival_delta_ms(), Some(12));
    }

    #[test]
    fn test_envelope_meta_shapes() {
        let envelope = FrameEnvelope::new("351", 8, "00");
        assert_eq!(envelope.arrival_delta_ms(), None);
        assert_eq!(envelope.clone().with_meta("  250 ").arrival_delta_ms(), Some(250));
        assert_eq!(envelope.clone().with_meta("t=3").arrival_delta_ms(), None);
        assert_eq!(envelope.with_meta(-4).arrival_delta_ms(), None);
    }

    #[test]
    fn test_envelope_missing_fields() {
        let envelope = FrameEnvelope::from_json(br#"{"id":"35A"}"#).unwrap();
        assert_eq!(envelope.length, 0);
        assert!(envelope.payload.is_empty());

        let err = FrameEnvelope::from_json(b"not json").unwrap_err();
        assert!(matches!(err, DecoderError::InvalidEnvelope(_)));
    }

    #[test]
    fn test_envelope_from_frame() {
        let envelope = FrameEnvelope::from_frame(0x6B0, &[0x00, 0xA1, 0x00, 0x48], 7);
        assert_eq!(envelope.identifier, "6B0");
        assert_eq!(envelope.length, 4);
        assert_eq!(envelope.payload, "00A10048");
        assert_eq!(envelope.arrival_delta_ms(), Some(7));

        let line = envelope.to_json().unwrap();
        assert_eq!(line, r#"{"id":"6B0","length":4,"data":"00A10048","meta":7}"#);
    }

    #[test]
    fn test_error_display() {
        let err = DecoderError::InvalidLength { expected: 8, actual: 6 };
        assert_eq!(err.to_string(), "Invalid payload length: expected 8 bytes, got 6");
    }
}
