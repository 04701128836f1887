//! Frame dispatcher
//!
//! Routes each frame envelope to the decoder registered for its identifier,
//! applies the result to the snapshot and, when a publisher is attached,
//! flushes the affected document. Unknown identifiers are dropped. A failed
//! decode is logged and leaves every document untouched.

use crate::messages::{parse_identifier, MessageKind};
use crate::publisher::SnapshotPublisher;
use crate::snapshot::{DocumentKind, TelemetrySnapshot};
use crate::types::{DecoderError, FrameEnvelope};
use chrono::Utc;
use std::collections::HashMap;

/// Identifier -> decoder lookup table
#[derive(Debug, Clone, Default)]
pub struct MessageRegistry {
    by_id: HashMap<u32, MessageKind>,
}

impl MessageRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in decoder
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for kind in MessageKind::ALL {
            registry.register(kind);
        }
        registry
    }

    pub fn register(&mut self, kind: MessageKind) {
        self.by_id.insert(kind.can_id(), kind);
    }

    pub fn lookup(&self, identifier: &str) -> Option<MessageKind> {
        parse_identifier(identifier).and_then(|id| self.by_id.get(&id).copied())
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// What happened to one frame
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Decoded and applied to the given document
    Decoded { kind: MessageKind, document: DocumentKind },
    /// Known identifier, structurally invalid payload
    Failed { kind: Option<MessageKind>, error: DecoderError },
    /// Identifier not registered
    Ignored,
}

impl DispatchOutcome {
    pub fn is_decoded(&self) -> bool {
        matches!(self, DispatchOutcome::Decoded { .. })
    }
}

/// Running totals kept by the dispatcher
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub frames: u64,
    pub decoded: u64,
    pub failed: u64,
    pub ignored: u64,
    pub publish_failures: u64,
    pub per_message: HashMap<MessageKind, u64>,
}

/// Single writer of the telemetry snapshot
pub struct Dispatcher {
    snapshot: TelemetrySnapshot,
    registry: MessageRegistry,
    publisher: Option<SnapshotPublisher>,
    stats: DispatchStats,
}

impl Dispatcher {
    /// Dispatcher over all built-in decoders, without publishing
    pub fn new(snapshot: TelemetrySnapshot) -> Self {
        Self::with_registry(snapshot, MessageRegistry::standard())
    }

    pub fn with_registry(snapshot: TelemetrySnapshot, registry: MessageRegistry) -> Self {
        Self {
            snapshot,
            registry,
            publisher: None,
            stats: DispatchStats::default(),
        }
    }

    /// Builder method: publish the owning document after every successful decode
    pub fn with_publisher(mut self, publisher: SnapshotPublisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn snapshot(&self) -> &TelemetrySnapshot {
        &self.snapshot
    }

    pub fn registry(&self) -> &MessageRegistry {
        &self.registry
    }

    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    /// Process one envelope
    pub fn dispatch(&mut self, envelope: &FrameEnvelope) -> DispatchOutcome {
        self.stats.frames += 1;

        let Some(kind) = self.registry.lookup(&envelope.identifier) else {
            log::trace!("Unknown identifier {:?}, dropping frame", envelope.identifier);
            self.stats.ignored += 1;
            return DispatchOutcome::Ignored;
        };

        match kind.decode_hex(&envelope.payload) {
            Ok(update) => {
                let document = self.snapshot.apply(update, Utc::now());
                self.stats.decoded += 1;
                *self.stats.per_message.entry(kind).or_insert(0) += 1;
                log::debug!("Decoded {} into {} document", kind, document);

                if let Some(publisher) = &self.publisher {
                    if let Err(e) = publisher.publish(document) {
                        self.stats.publish_failures += 1;
                        log::warn!("Failed to write snapshot: {}", e);
                    }
                }
                DispatchOutcome::Decoded { kind, document }
            }
            Err(error) => {
                self.stats.failed += 1;
                log::warn!("Failed to decode {}: {}", kind, error);
                DispatchOutcome::Failed { kind: Some(kind), error }
            }
        }
    }

    /// Process raw bus bytes holding one JSON envelope
    pub fn dispatch_json(&mut self, bytes: &[u8]) -> DispatchOutcome {
        match FrameEnvelope::from_json(bytes) {
            Ok(envelope) => self.dispatch(&envelope),
            Err(error) => {
                self.stats.frames += 1;
                self.stats.failed += 1;
                log::warn!("Invalid JSON: {}", String::from_utf8_lossy(bytes));
                DispatchOutcome::Failed { kind: None, error }
            }
        }
    }
}
