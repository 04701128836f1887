//! Field codec
//!
//! Stateless extraction primitives shared by every message decoder. Two layout
//! conventions exist on this bus:
//! - the legacy group (0x6B0-0x6B4) packs values as big-endian hex-digit groups,
//!   i.e. `"00A1"` at the start of the payload string is the value 0x00A1;
//! - the newer group packs little-endian integers at byte offsets.
//!
//! Extraction never scales. Callers divide or multiply the returned raw value.

use crate::types::{DecoderError, Result};
use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// How a raw integer is laid out in the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpretation {
    /// Single unsigned byte
    U8,
    /// Unsigned 16-bit, little-endian
    U16Le,
    /// Signed 16-bit, little-endian
    I16Le,
    /// Unsigned 32-bit, little-endian
    U32Le,
    /// Legacy big-endian digit group spanning `bytes` bytes (2 hex digits each)
    HexGroup { bytes: usize },
}

impl Interpretation {
    /// Number of payload bytes consumed
    pub fn width(self) -> usize {
        match self {
            Interpretation::U8 => 1,
            Interpretation::U16Le | Interpretation::I16Le => 2,
            Interpretation::U32Le => 4,
            Interpretation::HexGroup { bytes } => bytes,
        }
    }
}

/// Extract a raw integer at `offset` according to `interpretation`
pub fn extract(buf: &[u8], offset: usize, interpretation: Interpretation) -> Result<i64> {
    let field = field(buf, offset, interpretation.width())?;
    let raw = match interpretation {
        Interpretation::U8 => field[0] as i64,
        Interpretation::U16Le => LittleEndian::read_u16(field) as i64,
        Interpretation::I16Le => LittleEndian::read_i16(field) as i64,
        Interpretation::U32Le => LittleEndian::read_u32(field) as i64,
        Interpretation::HexGroup { bytes } => {
            if bytes == 0 || bytes > 8 {
                return Err(DecoderError::OutOfRange { offset, width: bytes, len: buf.len() });
            }
            BigEndian::read_uint(field, bytes) as i64
        }
    };
    Ok(raw)
}

/// Read a single byte
pub fn read_u8(buf: &[u8], offset: usize) -> Result<u8> {
    Ok(extract(buf, offset, Interpretation::U8)? as u8)
}

/// Read an unsigned little-endian 16-bit value
pub fn read_u16_le(buf: &[u8], offset: usize) -> Result<u16> {
    Ok(extract(buf, offset, Interpretation::U16Le)? as u16)
}

/// Read a signed little-endian 16-bit value
pub fn read_i16_le(buf: &[u8], offset: usize) -> Result<i16> {
    Ok(extract(buf, offset, Interpretation::I16Le)? as i16)
}

/// Read an unsigned little-endian 32-bit value
pub fn read_u32_le(buf: &[u8], offset: usize) -> Result<u32> {
    Ok(extract(buf, offset, Interpretation::U32Le)? as u32)
}

/// Read a legacy 4-digit group (two bytes, big-endian)
pub fn read_group16(buf: &[u8], offset: usize) -> Result<u16> {
    Ok(extract(buf, offset, Interpretation::HexGroup { bytes: 2 })? as u16)
}

/// State of bit `index` in `raw`, bit 0 being the least significant
pub fn bit(raw: u32, index: u8) -> bool {
    index < 32 && (raw >> index) & 1 == 1
}

/// Hex-decode a payload and check it has exactly `expected` bytes
pub fn decode_payload(payload: &str, expected: usize) -> Result<Vec<u8>> {
    let bytes = hex::decode(payload)
        .map_err(|e| DecoderError::InvalidEncoding(e.to_string()))?;
    expect_len(&bytes, expected)?;
    Ok(bytes)
}

/// Fail with `InvalidLength` unless `buf` has exactly `expected` bytes
pub fn expect_len(buf: &[u8], expected: usize) -> Result<()> {
    if buf.len() != expected {
        return Err(DecoderError::InvalidLength { expected, actual: buf.len() });
    }
    Ok(())
}

/// Trailing checksum of a legacy 8-byte frame: the low byte of the sum of
/// bytes 0-6, the CAN identifier and the frame length
pub fn legacy_checksum(can_id: u32, payload: &[u8]) -> Result<u8> {
    let body = field(payload, 0, 7)?;
    let sum = body
        .iter()
        .fold(can_id.wrapping_add(payload.len() as u32), |acc, b| acc.wrapping_add(*b as u32));
    Ok((sum & 0xFF) as u8)
}

/// Whether byte 7 of a legacy frame matches [`legacy_checksum`]
pub fn legacy_checksum_ok(can_id: u32, payload: &[u8]) -> Result<bool> {
    let expected = legacy_checksum(can_id, payload)?;
    Ok(read_u8(payload, 7)? == expected)
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn field(buf: &[u8], offset: usize, width: usize) -> Result<&[u8]> {
    match offset.checked_add(width) {
        Some(end) if end <= buf.len() => Ok(&buf[offset..end]),
        _ => Err(DecoderError::OutOfRange { offset, width, len: buf.len() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_reads() {
        let data = [0xAB, 0xCD, 0x92, 0xFF, 0x01, 0x00, 0x00, 0x80];
        assert_eq!(read_u16_le(&data, 0).unwrap(), 0xCDAB);
        assert_eq!(read_i16_le(&data, 2).unwrap(), -110);
        assert_eq!(read_u32_le(&data, 4).unwrap(), 0x8000_0001);
        assert_eq!(read_u8(&data, 7).unwrap(), 0x80);
        assert!(read_u8(&data, 8).is_err());
    }

    #[test]
    fn test_legacy_group_is_big_endian() {
        let data = decode_payload("0015FF929BF300ED", 8).unwrap();
        assert_eq!(read_group16(&data, 0).unwrap(), 21);
        assert_eq!(read_group16(&data, 2).unwrap() as i16, -110);
        assert_eq!(read_group16(&data, 4).unwrap(), 0x9BF3);
    }

    #[test]
    fn test_readers_agree_with_extract() {
        let data = [0x92, 0xFF, 0x34, 0x12, 0x9B, 0xF3, 0x00, 0x80];
        for offset in 0..6 {
            assert_eq!(read_u16_le(&data, offset).unwrap() as i64, extract(&data, offset, Interpretation::U16Le).unwrap());
            assert_eq!(read_i16_le(&data, offset).unwrap() as i64, extract(&data, offset, Interpretation::I16Le).unwrap());
            assert_eq!(
                read_group16(&data, offset).unwrap() as i64,
                extract(&data, offset, Interpretation::HexGroup { bytes: 2 }).unwrap()
            );
        }
        assert_eq!(read_u8(&data, 7).unwrap() as i64, extract(&data, 7, Interpretation::U8).unwrap());
        assert_eq!(read_u32_le(&data, 4).unwrap(), 0x8000_F39B);
        assert!(matches!(read_group16(&data, 7), Err(DecoderError::OutOfRange { offset: 7, width: 2, len: 8 })));
    }

    #[test]
    fn test_padded_payload_is_invalid_encoding() {
        for payload in ["  00A100486E50005F\n", " 00A100486E50005F ", "00A100486E50005F\n "] {
            assert!(matches!(decode_payload(payload, 8), Err(DecoderError::InvalidEncoding(_))), "{:?}", payload);
        }
    }

    #[test]
    fn test_legacy_checksum() {
        let pack = decode_payload("00A100486E50005F", 8).unwrap();
        assert_eq!(legacy_checksum(0x6B0, &pack).unwrap(), 0x5F);
        assert!(legacy_checksum_ok(0x6B0, &pack).unwrap());

        let high = decode_payload("0015FF929BF300ED", 8).unwrap();
        assert!(legacy_checksum_ok(0x6B1, &high).unwrap());
        // same body under another identifier
        assert!(!legacy_checksum_ok(0x6B2, &high).unwrap());

        let mut corrupted = pack.clone();
        corrupted[3] ^= 0x01;
        assert!(!legacy_checksum_ok(0x6B0, &corrupted).unwrap());
        assert!(legacy_checksum(0x6B0, &pack[..6]).is_err());
    }

    #[test]
    fn test_extract_interpretations() {
        let data = [0x92, 0xFF, 0x34, 0x12, 0x00, 0x00];
        assert_eq!(extract(&data, 0, Interpretation::U16Le).unwrap(), 0xFF92);
        assert_eq!(extract(&data, 0, Interpretation::I16Le).unwrap(), -110);
        assert_eq!(extract(&data, 2, Interpretation::U32Le).unwrap(), 0x1234);
        assert_eq!(extract(&data, 2, Interpretation::HexGroup { bytes: 2 }).unwrap(), 0x3412);
        assert_eq!(extract(&data, 0, Interpretation::HexGroup { bytes: 3 }).unwrap(), 0x92FF34);
    }

    #[test]
    fn test_out_of_range() {
        let data = [0u8; 4];
        let err = read_u32_le(&data, 1).unwrap_err();
        assert!(matches!(err, DecoderError::OutOfRange { offset: 1, width: 4, len: 4 }));
        assert!(read_u16_le(&data, usize::MAX).is_err());
        assert!(extract(&data, 3, Interpretation::I16Le).is_err());
        assert!(extract(&[0u8; 12], 0, Interpretation::HexGroup { bytes: 9 }).is_err());
    }

    #[test]
    fn test_bit_extraction() {
        assert!(bit(0x0162, 1));
        assert!(!bit(0x0162, 0));
        assert!(bit(0x8000_0000, 31));
        assert!(!bit(u32::MAX, 32));
    }

    #[test]
    fn test_decode_payload_errors() {
        assert!(matches!(
            decode_payload("00A1", 8).unwrap_err(),
            DecoderError::InvalidLength { expected: 8, actual: 2 }
        ));
        assert!(matches!(
            decode_payload("00ZZ00000000000000", 8).unwrap_err(),
            DecoderError::InvalidEncoding(_)
        ));
        assert!(matches!(decode_payload("ABC", 2).unwrap_err(), DecoderError::InvalidEncoding(_)));
        assert_eq!(decode_payload("9bf3", 2).unwrap(), vec![0x9B, 0xF3]);
    }

    #[test]
    fn test_scaled_round_trip() {
        let data = decode_payload("9BF3", 2).unwrap();
        let volts = read_group16(&data, 0).unwrap() as f64 / 10000.0;
        assert!((volts - 3.9923).abs() < 1e-9);
        assert_eq!(round_to(3.99231, 4), 3.9923);
        assert_eq!(round_to(0.075349, 4), 0.0753);
    }
}
