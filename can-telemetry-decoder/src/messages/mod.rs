//! Message decoders
//!
//! One decoder per known identifier. Each decoder is a pure function from a
//! payload of fixed length to a [`DecodedUpdate`]; applying the update to the
//! snapshot is the dispatcher's job. Layouts are hard-coded, never data-driven.

mod bms;
mod drive_unit;
mod legacy;

use crate::codec;
use crate::snapshot::bus::{
    BmsErrors, BmsLimits, BmsSoc, BmsStatus1, BmsStatus2, DriveUnitFeedback, DriveUnitStatus,
};
use crate::snapshot::cell_pack::{CellReading, PackStatus, SystemControl, TemperatureData};
use crate::snapshot::DocumentKind;
use crate::types::Result;
use std::fmt;

/// Every message type this decoder understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    PackStatus,
    HighCell,
    LowCell,
    Temperature,
    SystemControl,
    BmsLimits,
    BmsSoc,
    BmsStatus1,
    BmsErrors,
    BmsStatus2,
    DriveUnitFeedback,
    DriveUnitStatus,
}

impl MessageKind {
    pub const ALL: [MessageKind; 12] = [
        MessageKind::PackStatus,
        MessageKind::HighCell,
        MessageKind::LowCell,
        MessageKind::Temperature,
        MessageKind::SystemControl,
        MessageKind::BmsLimits,
        MessageKind::BmsSoc,
        MessageKind::BmsStatus1,
        MessageKind::BmsErrors,
        MessageKind::BmsStatus2,
        MessageKind::DriveUnitFeedback,
        MessageKind::DriveUnitStatus,
    ];

    /// CAN identifier of this message
    pub fn can_id(self) -> u32 {
        match self {
            MessageKind::PackStatus => 0x6B0,
            MessageKind::HighCell => 0x6B1,
            MessageKind::LowCell => 0x6B2,
            MessageKind::Temperature => 0x6B3,
            MessageKind::SystemControl => 0x6B4,
            MessageKind::BmsLimits => 0x351,
            MessageKind::BmsSoc => 0x355,
            MessageKind::BmsStatus1 => 0x356,
            MessageKind::BmsErrors => 0x35A,
            MessageKind::BmsStatus2 => 0x35B,
            MessageKind::DriveUnitFeedback => 0x125,
            MessageKind::DriveUnitStatus => 0x126,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MessageKind::PackStatus => "PackStatus",
            MessageKind::HighCell => "HighCell",
            MessageKind::LowCell => "LowCell",
            MessageKind::Temperature => "Temperature",
            MessageKind::SystemControl => "SystemControl",
            MessageKind::BmsLimits => "BmsLimits",
            MessageKind::BmsSoc => "BmsSOC",
            MessageKind::BmsStatus1 => "BmsStatus1",
            MessageKind::BmsErrors => "BmsErrors",
            MessageKind::BmsStatus2 => "BmsStatus2",
            MessageKind::DriveUnitFeedback => "DU1Feedback",
            MessageKind::DriveUnitStatus => "DU1Status",
        }
    }

    /// Human readable description for reports
    pub fn description(self) -> &'static str {
        match self {
            MessageKind::PackStatus => "Battery Pack Status",
            MessageKind::HighCell => "High Cell Information",
            MessageKind::LowCell => "Low Cell Information",
            MessageKind::Temperature => "Temperature Information",
            MessageKind::SystemControl => "System Control Information",
            MessageKind::BmsLimits => "BmsLimits (charge/discharge ceilings)",
            MessageKind::BmsSoc => "BmsSOC (state-of-charge metrics)",
            MessageKind::BmsStatus1 => "BmsStatus1 (pack V/I/temp)",
            MessageKind::BmsErrors => "BmsErrors (fault bitfield)",
            MessageKind::BmsStatus2 => "BmsStatus2 (relay states + isolation)",
            MessageKind::DriveUnitFeedback => "DU1Feedback (drive unit telemetry)",
            MessageKind::DriveUnitStatus => "DU1Status (drive unit state)",
        }
    }

    /// Exact payload length in bytes
    pub fn payload_len(self) -> usize {
        match self {
            MessageKind::BmsStatus1 => 6,
            MessageKind::BmsErrors | MessageKind::BmsStatus2 => 4,
            _ => 8,
        }
    }

    /// Snapshot document this message writes to
    pub fn document(self) -> DocumentKind {
        match self {
            MessageKind::PackStatus
            | MessageKind::HighCell
            | MessageKind::LowCell
            | MessageKind::Temperature
            | MessageKind::SystemControl => DocumentKind::CellPack,
            _ => DocumentKind::Bus,
        }
    }

    pub fn from_can_id(can_id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.can_id() == can_id)
    }

    /// Decode a hex payload as received in the envelope
    pub fn decode_hex(self, payload: &str) -> Result<DecodedUpdate> {
        let bytes = codec::decode_payload(payload, self.payload_len())?;
        self.decode(&bytes)
    }

    /// Decode an already hex-decoded payload
    pub fn decode(self, payload: &[u8]) -> Result<DecodedUpdate> {
        codec::expect_len(payload, self.payload_len())?;
        match self {
            MessageKind::PackStatus => legacy::decode_pack_status(payload),
            MessageKind::HighCell => legacy::decode_high_cell(payload),
            MessageKind::LowCell => legacy::decode_low_cell(payload),
            MessageKind::Temperature => legacy::decode_temperature(payload),
            MessageKind::SystemControl => legacy::decode_system_control(payload),
            MessageKind::BmsLimits => bms::decode_limits(payload),
            MessageKind::BmsSoc => bms::decode_soc(payload),
            MessageKind::BmsStatus1 => bms::decode_status1(payload),
            MessageKind::BmsErrors => bms::decode_errors(payload),
            MessageKind::BmsStatus2 => bms::decode_status2(payload),
            MessageKind::DriveUnitFeedback => drive_unit::decode_feedback(payload),
            MessageKind::DriveUnitStatus => drive_unit::decode_status(payload),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:03X})", self.name(), self.can_id())
    }
}

/// Parse an envelope identifier (`"6b0"`, `"0x6B0"`, `"06B0"`) into a CAN id
pub fn parse_identifier(identifier: &str) -> Option<u32> {
    let trimmed = identifier.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

/// Field group produced by one successful decode
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedUpdate {
    PackStatus { status: PackStatus, checksum_ok: bool },
    HighCell { cell: CellReading, pack_current: f64, checksum_ok: bool },
    LowCell { cell: CellReading, aux_voltage: f64, checksum_ok: bool },
    Temperature { temps: TemperatureData, checksum_ok: bool },
    SystemControl { control: SystemControl, checksum_ok: bool },
    BmsLimits(BmsLimits),
    BmsSoc(BmsSoc),
    BmsStatus1(BmsStatus1),
    BmsErrors(BmsErrors),
    BmsStatus2(BmsStatus2),
    DriveUnitFeedback(DriveUnitFeedback),
    DriveUnitStatus(DriveUnitStatus),
}

impl DecodedUpdate {
    pub fn document(&self) -> DocumentKind {
        match self {
            DecodedUpdate::PackStatus { .. }
            | DecodedUpdate::HighCell { .. }
            | DecodedUpdate::LowCell { .. }
            | DecodedUpdate::Temperature { .. }
            | DecodedUpdate::SystemControl { .. } => DocumentKind::CellPack,
            _ => DocumentKind::Bus,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DecoderError;

    #[test]
    fn test_identifier_parsing() {
        assert_eq!(parse_identifier("6B0"), Some(0x6B0));
        assert_eq!(parse_identifier("6b0"), Some(0x6B0));
        assert_eq!(parse_identifier(" 0x35a "), Some(0x35A));
        assert_eq!(parse_identifier("06B0"), Some(0x6B0));
        assert_eq!(parse_identifier(""), None);
        assert_eq!(parse_identifier("0x"), None);
        assert_eq!(parse_identifier("XYZ"), None);
        assert_eq!(parse_identifier("+6B0"), None);
        assert_eq!(parse_identifier("0x+6b0"), None);
        assert_eq!(parse_identifier("-6B0"), None);
        assert_eq!(parse_identifier("6B 0"), None);
        assert_eq!(parse_identifier("0x0x6B0"), None);
    }

    #[test]
    fn test_catalogue_is_consistent() {
        for kind in MessageKind::ALL {
            assert_eq!(MessageKind::from_can_id(kind.can_id()), Some(kind));
            let update = kind.decode(&vec![0u8; kind.payload_len()]).unwrap();
            assert_eq!(update.document(), kind.document(), "{}", kind);
        }
        assert_eq!(MessageKind::from_can_id(0x036), None);
    }

    #[test]
    fn test_wrong_length_rejected_for_every_kind() {
        for kind in MessageKind::ALL {
            let short = "00".repeat(kind.payload_len() - 1);
            let long = "00".repeat(kind.payload_len() + 1);
            for payload in [short, long, String::new()] {
                match kind.decode_hex(&payload) {
                    Err(DecoderError::InvalidLength { expected, actual }) => {
                        assert_eq!(expected, kind.payload_len());
                        assert_eq!(actual, payload.len() / 2);
                    }
                    other => panic!("{}: unexpected {:?}", kind, other),
                }
            }
        }
    }

    #[test]
    fn test_bad_hex_rejected_for_every_kind() {
        for kind in MessageKind::ALL {
            let payload = format!("G{}", "0".repeat(kind.payload_len() * 2 - 1));
            assert!(matches!(kind.decode_hex(&payload), Err(DecoderError::InvalidEncoding(_))));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(MessageKind::BmsErrors.to_string(), "BmsErrors (0x35A)");
        assert_eq!(MessageKind::DriveUnitFeedback.to_string(), "DU1Feedback (0x125)");
    }
}
