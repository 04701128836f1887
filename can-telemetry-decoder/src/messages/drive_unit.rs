//! Drive unit 1 messages 0x125/0x126 (little-endian)

use super::DecodedUpdate;
use crate::codec::{read_i16_le, read_u16_le, read_u8};
use crate::snapshot::bus::{DriveUnitFeedback, DriveUnitStatus};
use crate::types::Result;

/// 0x125: DC current, bus voltage, torque request, AC current
pub(super) fn decode_feedback(payload: &[u8]) -> Result<DecodedUpdate> {
    Ok(DecodedUpdate::DriveUnitFeedback(DriveUnitFeedback {
        dc_current: read_i16_le(payload, 0)? as f64 / 10.0,
        bus_voltage: read_u16_le(payload, 2)? as f64 / 10.0,
        throttle_torque_request: read_i16_le(payload, 4)? as f64,
        ac_current: read_i16_le(payload, 6)? as f64 / 10.0,
    }))
}

/// 0x126
/// - byte 0 low nibble: op mode
/// - byte 1 low nibble: gear, high nibble: mode / power limited / error / brake light
/// - bytes 2-7: motor speed, inverter temp, motor temp (i16le, unscaled)
pub(super) fn decode_status(payload: &[u8]) -> Result<DecodedUpdate> {
    let flags = read_u8(payload, 1)?;
    Ok(DecodedUpdate::DriveUnitStatus(DriveUnitStatus {
        op_mode: read_u8(payload, 0)? & 0x0F,
        gear: flags & 0x0F,
        mode: flags & 0x10 != 0,
        drive_power_limited: flags & 0x20 != 0,
        error: flags & 0x40 != 0,
        brake_regen_light_request: flags & 0x80 != 0,
        motor_speed: read_i16_le(payload, 2)? as f64,
        inverter_temp: read_i16_le(payload, 4)? as f64,
        motor_temp: read_i16_le(payload, 6)? as f64,
    }))
}
