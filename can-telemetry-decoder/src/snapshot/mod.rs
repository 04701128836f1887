//! Telemetry snapshot
//!
//! Two documents live for the whole process: the cell/pack document and the
//! bus/drive-unit document. Each sits behind its own lock, and every decoded
//! update is written to its record while holding that lock, so a reader never
//! sees half of a field group.

pub mod bus;
pub mod cell_pack;

use crate::messages::DecodedUpdate;
use crate::types::Timestamp;
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub use bus::BusDocument;
pub use cell_pack::CellPackDocument;

/// Which of the two snapshot documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    CellPack,
    Bus,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 2] = [DocumentKind::CellPack, DocumentKind::Bus];
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::CellPack => write!(f, "cell/pack"),
            DocumentKind::Bus => write!(f, "bus"),
        }
    }
}

/// Shared handle to both snapshot documents
///
/// Cloning the handle shares the same documents.
#[derive(Debug, Clone)]
pub struct TelemetrySnapshot {
    cell_pack: Arc<RwLock<CellPackDocument>>,
    bus: Arc<RwLock<BusDocument>>,
}

impl TelemetrySnapshot {
    /// Create both documents zeroed, stamped with the current time
    pub fn new() -> Self {
        Self::created_at(Utc::now())
    }

    pub fn created_at(created: Timestamp) -> Self {
        Self {
            cell_pack: Arc::new(RwLock::new(CellPackDocument::new(created))),
            bus: Arc::new(RwLock::new(BusDocument::new(created))),
        }
    }

    /// Copy of the cell/pack document
    pub fn cell_pack(&self) -> CellPackDocument {
        self.cell_pack.read().clone()
    }

    /// Copy of the bus/drive-unit document
    pub fn bus(&self) -> BusDocument {
        self.bus.read().clone()
    }

    /// Current revision of a document
    pub fn revision(&self, document: DocumentKind) -> u64 {
        match document {
            DocumentKind::CellPack => self.cell_pack.read().revision(),
            DocumentKind::Bus => self.bus.read().revision(),
        }
    }

    /// Serialize a consistent copy of a document as pretty JSON
    pub fn to_json(&self, document: DocumentKind) -> serde_json::Result<Vec<u8>> {
        match document {
            DocumentKind::CellPack => serde_json::to_vec_pretty(&self.cell_pack()),
            DocumentKind::Bus => serde_json::to_vec_pretty(&self.bus()),
        }
    }

    /// Write a decoded field group into its owning record
    pub fn apply(&self, update: DecodedUpdate, at: Timestamp) -> DocumentKind {
        let document = update.document();
        match update {
            DecodedUpdate::PackStatus { status, checksum_ok } => {
                self.cell_pack.write().set_pack_status(status, checksum_ok, at)
            }
            DecodedUpdate::HighCell { cell, pack_current, checksum_ok } => {
                self.cell_pack.write().set_high_cell(cell, pack_current, checksum_ok, at)
            }
            DecodedUpdate::LowCell { cell, aux_voltage, checksum_ok } => {
                self.cell_pack.write().set_low_cell(cell, aux_voltage, checksum_ok, at)
            }
            DecodedUpdate::Temperature { temps, checksum_ok } => {
                self.cell_pack.write().set_temperatures(temps, checksum_ok, at)
            }
            DecodedUpdate::SystemControl { control, checksum_ok } => {
                self.cell_pack.write().set_system_control(control, checksum_ok, at)
            }
            DecodedUpdate::BmsLimits(limits) => self.bus.write().set_bms_limits(limits, at),
            DecodedUpdate::BmsSoc(soc) => self.bus.write().set_bms_soc(soc, at),
            DecodedUpdate::BmsStatus1(status) => self.bus.write().set_bms_status1(status, at),
            DecodedUpdate::BmsErrors(errors) => self.bus.write().set_bms_errors(errors, at),
            DecodedUpdate::BmsStatus2(status) => self.bus.write().set_bms_status2(status, at),
            DecodedUpdate::DriveUnitFeedback(feedback) => {
                self.bus.write().set_du1_feedback(feedback, at)
            }
            DecodedUpdate::DriveUnitStatus(status) => self.bus.write().set_du1_status(status, at),
        }
        document
    }
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::MessageKind;
    use std::thread;

    #[test]
    fn test_apply_routes_to_owning_document() {
        let snapshot = TelemetrySnapshot::new();
        let update = MessageKind::BmsSoc.decode_hex("50006300250300FF").unwrap();
        assert_eq!(snapshot.apply(update, Utc::now()), DocumentKind::Bus);
        assert_eq!(snapshot.revision(DocumentKind::Bus), 1);
        assert_eq!(snapshot.revision(DocumentKind::CellPack), 0);
        assert_eq!(snapshot.bus().message_count.bms_soc, 1);
    }

    #[test]
    fn test_clones_share_state() {
        let snapshot = TelemetrySnapshot::new();
        let reader = snapshot.clone();
        let update = MessageKind::PackStatus.decode_hex("00A100486E50005F").unwrap();
        snapshot.apply(update, Utc::now());
        assert_eq!(reader.cell_pack().pack_data.cell_count, 72);
    }

    #[test]
    fn test_reader_never_sees_partial_group() {
        let snapshot = TelemetrySnapshot::new();
        let a = MessageKind::BmsLimits.decode_hex("0A000A000A000A00").unwrap();
        let b = MessageKind::BmsLimits.decode_hex("1400140014001400").unwrap();

        let reader = snapshot.clone();
        let handle = thread::spawn(move || {
            for _ in 0..2000 {
                let limits = reader.bus().bms_limits;
                assert_eq!(limits.charge_voltage_limit, limits.charge_current_limit);
                assert_eq!(limits.charge_current_limit, limits.discharge_current_limit);
                assert_eq!(limits.discharge_current_limit, limits.discharge_voltage_limit);
            }
        });

        for i in 0..2000 {
            let update = if i % 2 == 0 { a.clone() } else { b.clone() };
            snapshot.apply(update, Utc::now());
        }
        handle.join().unwrap();
        assert_eq!(snapshot.bus().message_count.bms_limits, 2000);
    }

    #[test]
    fn test_json_is_pretty() {
        let snapshot = TelemetrySnapshot::new();
        let json = String::from_utf8(snapshot.to_json(DocumentKind::CellPack).unwrap()).unwrap();
        assert!(json.starts_with("{\n  \"timestamp\""));
    }
}
