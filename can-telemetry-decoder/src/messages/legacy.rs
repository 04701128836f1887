//! Legacy broadcast group 0x6B0-0x6B4
//!
//! All values are 4-digit big-endian groups at bytes 0-1, 2-3 and 4-5.
//! Byte 7 carries a checksum (see [`legacy_checksum`]); a mismatch is reported
//! on the update but the values are applied anyway.
//!
//! [`legacy_checksum`]: crate::codec::legacy_checksum

use super::{DecodedUpdate, MessageKind};
use crate::codec::{legacy_checksum_ok, read_group16};
use crate::snapshot::cell_pack::{
    CellReading, PackStatus, RelayState, SystemControl, TemperatureData,
};
use crate::types::Result;

fn checksum(kind: MessageKind, payload: &[u8]) -> Result<bool> {
    let ok = legacy_checksum_ok(kind.can_id(), payload)?;
    if !ok {
        log::debug!("{}: checksum mismatch", kind);
    }
    Ok(ok)
}

/// 0x6B0 `00A1 0048 6E50 005F`
/// - SOC: 0x00A1 = 161 -> 80.5 % (0.5 % per bit)
/// - cell count: 0x0048 = 72
/// - pack voltage: 0x6E50 = 28240 -> 282.4 V
pub(super) fn decode_pack_status(payload: &[u8]) -> Result<DecodedUpdate> {
    let soc_raw = read_group16(payload, 0)?;
    let cell_count = read_group16(payload, 2)?;
    let voltage_raw = read_group16(payload, 4)?;

    Ok(DecodedUpdate::PackStatus {
        status: PackStatus {
            soc: soc_raw as f64 / 2.0,
            cell_count,
            pack_voltage: voltage_raw as f64 / 100.0,
        },
        checksum_ok: checksum(MessageKind::PackStatus, payload)?,
    })
}

/// 0x6B1 `0015 FF92 9BF3 00ED`
/// - high cell id: 21
/// - pack current: 0xFF92 = -110 -> -11.0 A (signed)
/// - high cell voltage: 0x9BF3 = 39923 -> 3.9923 V
pub(super) fn decode_high_cell(payload: &[u8]) -> Result<DecodedUpdate> {
    let id = read_group16(payload, 0)?;
    let current_raw = read_group16(payload, 2)? as i16;
    let voltage_raw = read_group16(payload, 4)?;

    Ok(DecodedUpdate::HighCell {
        cell: CellReading { id, voltage: voltage_raw as f64 / 10000.0 },
        pack_current: current_raw as f64 / 10.0,
        checksum_ok: checksum(MessageKind::HighCell, payload)?,
    })
}

/// 0x6B2 `0046 0085 9BAA 0010`
/// - low cell id: 70
/// - 12V system voltage: 0x0085 = 133 -> 13.3 V
/// - low cell voltage: 0x9BAA = 39850 -> 3.985 V
pub(super) fn decode_low_cell(payload: &[u8]) -> Result<DecodedUpdate> {
    let id = read_group16(payload, 0)?;
    let aux_raw = read_group16(payload, 2)?;
    let voltage_raw = read_group16(payload, 4)?;

    Ok(DecodedUpdate::LowCell {
        cell: CellReading { id, voltage: voltage_raw as f64 / 10000.0 },
        aux_voltage: aux_raw as f64 / 10.0,
        checksum_ok: checksum(MessageKind::LowCell, payload)?,
    })
}

/// 0x6B3 `0013 0000 0010 0000`: high 19 °C at bytes 0-1, low 16 °C at bytes 4-5
pub(super) fn decode_temperature(payload: &[u8]) -> Result<DecodedUpdate> {
    Ok(DecodedUpdate::Temperature {
        temps: TemperatureData {
            high_temp: read_group16(payload, 0)?,
            low_temp: read_group16(payload, 4)?,
        },
        checksum_ok: checksum(MessageKind::Temperature, payload)?,
    })
}

/// 0x6B4 `0162 0004 1200 0000`
/// - relay state: 16-bit flag word
/// - CCL / DCL: 0.1 A resolution
pub(super) fn decode_system_control(payload: &[u8]) -> Result<DecodedUpdate> {
    let relay_raw = read_group16(payload, 0)?;
    let ccl_raw = read_group16(payload, 2)?;
    let dcl_raw = read_group16(payload, 4)?;

    Ok(DecodedUpdate::SystemControl {
        control: SystemControl {
            relay_state: RelayState::from_raw(relay_raw),
            pack_ccl: ccl_raw as f64 / 10.0,
            pack_dcl: dcl_raw as f64 / 10.0,
        },
        checksum_ok: checksum(MessageKind::SystemControl, payload)?,
    })
}
