//! BMS broadcast group 0x351-0x35B (little-endian)

use super::DecodedUpdate;
use crate::codec::{bit, read_i16_le, read_u16_le, read_u32_le};
use crate::snapshot::bus::{BmsErrors, BmsLimits, BmsSoc, BmsStatus1, BmsStatus2};
use crate::types::Result;

/// 0x351: four u16le limits, 0.1 V / 0.1 A resolution
pub(super) fn decode_limits(payload: &[u8]) -> Result<DecodedUpdate> {
    Ok(DecodedUpdate::BmsLimits(BmsLimits {
        charge_voltage_limit: read_u16_le(payload, 0)? as f64 / 10.0,
        charge_current_limit: read_u16_le(payload, 2)? as f64 / 10.0,
        discharge_current_limit: read_u16_le(payload, 4)? as f64 / 10.0,
        discharge_voltage_limit: read_u16_le(payload, 6)? as f64 / 10.0,
    }))
}

/// 0x355: SOC and SOH in whole percent, high-definition SOC in 0.1 %
pub(super) fn decode_soc(payload: &[u8]) -> Result<DecodedUpdate> {
    Ok(DecodedUpdate::BmsSoc(BmsSoc {
        state_of_charge: read_u16_le(payload, 0)? as f64,
        state_of_health: read_u16_le(payload, 2)? as f64,
        state_of_charge_high_def: read_u16_le(payload, 4)? as f64 / 10.0,
    }))
}

/// 0x356: 6-byte frame, current and temperature are signed
pub(super) fn decode_status1(payload: &[u8]) -> Result<DecodedUpdate> {
    Ok(DecodedUpdate::BmsStatus1(BmsStatus1 {
        pack_voltage: read_u16_le(payload, 0)? as f64 / 10.0,
        pack_current: read_i16_le(payload, 2)? as f64 / 10.0,
        pack_temperature: read_i16_le(payload, 4)? as f64 / 10.0,
    }))
}

/// 0x35A: 32-bit fault word
pub(super) fn decode_errors(payload: &[u8]) -> Result<DecodedUpdate> {
    let raw = read_u32_le(payload, 0)?;
    Ok(DecodedUpdate::BmsErrors(BmsErrors::from_raw(raw)))
}

/// 0x35B: isolation in the low 16 bits (×0.001), relay/output flags in bits 16-23
pub(super) fn decode_status2(payload: &[u8]) -> Result<DecodedUpdate> {
    let raw = read_u32_le(payload, 0)?;
    Ok(DecodedUpdate::BmsStatus2(BmsStatus2 {
        isolation_adc: (raw & 0xFFFF) as f64 * 0.001,
        ready_power: bit(raw, 16),
        charge_power: bit(raw, 17),
        discharge_relay: bit(raw, 18),
        charge_interlock: bit(raw, 19),
        mpo1: bit(raw, 20),
        mpo2: bit(raw, 21),
        mpo3: bit(raw, 22),
        mpo4: bit(raw, 23),
    }))
}

#[cfg(test)]
mod tests {
    use crate::messages::{DecodedUpdate, MessageKind};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_limits() {
        // 403.2 V, 120.0 A, 250.5 A, 280.0 V
        let update = MessageKind::BmsLimits.decode_hex("C00FB004C909F00A").unwrap();
        let DecodedUpdate::BmsLimits(limits) = update else {
            panic!("unexpected update variant");
        };
        assert!(close(limits.charge_voltage_limit, 403.2));
        assert!(close(limits.charge_current_limit, 120.0));
        assert!(close(limits.discharge_current_limit, 250.5));
        assert!(close(limits.discharge_voltage_limit, 280.0));
    }

    #[test]
    fn test_soc() {
        let update = MessageKind::BmsSoc.decode_hex("50006300250300FF").unwrap();
        let DecodedUpdate::BmsSoc(soc) = update else {
            panic!("unexpected update variant");
        };
        assert!(close(soc.state_of_charge, 80.0));
        assert!(close(soc.state_of_health, 99.0));
        assert!(close(soc.state_of_charge_high_def, 80.5));
    }

    #[test]
    fn test_status1_signed_fields() {
        // 350.1 V, -11.0 A, -5.5 °C
        let update = MessageKind::BmsStatus1.decode_hex("AD0D92FFC9FF").unwrap();
        let DecodedUpdate::BmsStatus1(status) = update else {
            panic!("unexpected update variant");
        };
        assert!(close(status.pack_voltage, 350.1));
        assert!(close(status.pack_current, -11.0));
        assert!(close(status.pack_temperature, -5.5));
    }

    #[test]
    fn test_errors_word_is_little_endian() {
        // raw = 0x80010001
        let update = MessageKind::BmsErrors.decode_hex("01000180").unwrap();
        let DecodedUpdate::BmsErrors(errors) = update else {
            panic!("unexpected update variant");
        };
        assert!(errors.p0a07_dischg_limit_enforce);
        assert!(errors.p0a1f_internal_comms_fault);
        assert!(errors.p0a06_chg_limit_enforce_fault);
        assert!(!errors.p0a08_chg_safety_relay);
        assert!(!errors.p0a05_input_psu_fault);
    }

    #[test]
    fn test_status2() {
        // raw = 0x00A51388: isolation 5000 -> 5.0, bits 16, 18, 21, 23
        let update = MessageKind::BmsStatus2.decode_hex("8813A500").unwrap();
        let DecodedUpdate::BmsStatus2(status) = update else {
            panic!("unexpected update variant");
        };
        assert!(close(status.isolation_adc, 5.0));
        assert!(status.ready_power);
        assert!(!status.charge_power);
        assert!(status.discharge_relay);
        assert!(!status.charge_interlock);
        assert!(!status.mpo1);
        assert!(status.mpo2);
        assert!(!status.mpo3);
        assert!(status.mpo4);
    }
}
