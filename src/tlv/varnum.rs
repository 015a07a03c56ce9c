//! VAR-NUMBER and NonNegativeInteger encodings.
//!
//! NDN encodes both TLV-TYPE and TLV-LENGTH as VAR-NUMBER: values below 253
//! occupy one octet, larger values are introduced by a marker octet (253, 254
//! or 255) followed by a 2, 4 or 8 octet big-endian integer.

use bytes::{Buf, BufMut};

use super::TlvError;

const MARKER_U16: u8 = 253;
const MARKER_U32: u8 = 254;
const MARKER_U64: u8 = 255;

/// Decoded TLV-TYPE and TLV-LENGTH of an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypeLength {
    /// TLV-TYPE number.
    pub typ: u32,
    /// TLV-LENGTH (size of the value).
    pub length: usize,
    /// Octets occupied by the TYPE and LENGTH fields.
    pub header_len: usize,
}

impl TypeLength {
    /// Total size of the element including its header.
    ///
    /// Saturates instead of overflowing so oversized declarations are still
    /// comparable against a packet ceiling.
    #[must_use]
    pub fn total_len(&self) -> usize { self.header_len.saturating_add(self.length) }
}

/// Number of octets needed to encode `value` as a VAR-NUMBER.
#[must_use]
pub fn var_number_len(value: u64) -> usize {
    match value {
        0..253 => 1,
        253..=0xFFFF => 3,
        0x1_0000..=0xFFFF_FFFF => 5,
        _ => 9,
    }
}

/// Append `value` to `dst` as a VAR-NUMBER.
#[expect(
    clippy::cast_possible_truncation,
    reason = "each arm only truncates values already bounded by its range"
)]
pub fn put_var_number(dst: &mut impl BufMut, value: u64) {
    match value {
        0..253 => dst.put_u8(value as u8),
        253..=0xFFFF => {
            dst.put_u8(MARKER_U16);
            dst.put_u16(value as u16);
        }
        0x1_0000..=0xFFFF_FFFF => {
            dst.put_u8(MARKER_U32);
            dst.put_u32(value as u32);
        }
        _ => {
            dst.put_u8(MARKER_U64);
            dst.put_u64(value);
        }
    }
}

/// Read a VAR-NUMBER from the front of `src`.
///
/// Returns the value and the number of octets consumed.
///
/// # Errors
///
/// Returns [`TlvError::Truncated`] when `src` ends inside the number.
pub fn read_var_number(src: &[u8]) -> Result<(u64, usize), TlvError> {
    let Some(&first) = src.first() else {
        return Err(TlvError::Truncated {
            needed: 1,
            available: 0,
        });
    };
    let width = match first {
        MARKER_U16 => 2,
        MARKER_U32 => 4,
        MARKER_U64 => 8,
        small => return Ok((u64::from(small), 1)),
    };
    let Some(mut rest) = src.get(1..=width) else {
        return Err(TlvError::Truncated {
            needed: width + 1,
            available: src.len(),
        });
    };
    let value = match width {
        2 => u64::from(rest.get_u16()),
        4 => u64::from(rest.get_u32()),
        _ => rest.get_u64(),
    };
    Ok((value, width + 1))
}

/// Decode the TYPE and LENGTH fields of the element at the front of `src`.
///
/// The value itself is not required to be present.
///
/// # Errors
///
/// Returns [`TlvError::Truncated`] if the header is incomplete,
/// [`TlvError::InvalidType`] for TLV-TYPE zero or a type wider than 32 bits,
/// and [`TlvError::LengthOverflow`] if the length exceeds `usize`.
pub fn decode_type_length(src: &[u8]) -> Result<TypeLength, TlvError> {
    let (raw_type, type_len) = read_var_number(src)?;
    let typ = match u32::try_from(raw_type) {
        Ok(0) | Err(_) => return Err(TlvError::InvalidType(raw_type)),
        Ok(typ) => typ,
    };
    let (raw_length, length_len) = read_var_number(&src[type_len..])?;
    let length = usize::try_from(raw_length).map_err(|_| TlvError::LengthOverflow(raw_length))?;
    Ok(TypeLength {
        typ,
        length,
        header_len: type_len + length_len,
    })
}

/// Number of octets used by the shortest NonNegativeInteger encoding.
#[must_use]
pub fn nni_len(value: u64) -> usize {
    match value {
        0..=0xFF => 1,
        0x100..=0xFFFF => 2,
        0x1_0000..=0xFFFF_FFFF => 4,
        _ => 8,
    }
}

/// Append `value` as a NonNegativeInteger using the shortest encoding.
#[expect(
    clippy::cast_possible_truncation,
    reason = "each arm only truncates values already bounded by its range"
)]
pub fn put_nni(dst: &mut impl BufMut, value: u64) {
    match nni_len(value) {
        1 => dst.put_u8(value as u8),
        2 => dst.put_u16(value as u16),
        4 => dst.put_u32(value as u32),
        _ => dst.put_u64(value),
    }
}

/// Parse a complete TLV-VALUE as a NonNegativeInteger.
///
/// # Errors
///
/// Returns [`TlvError::InvalidNonNegativeInteger`] unless the value is 1, 2,
/// 4 or 8 octets long.
pub fn read_nni(mut value: &[u8]) -> Result<u64, TlvError> {
    match value.len() {
        1 => Ok(u64::from(value.get_u8())),
        2 => Ok(u64::from(value.get_u16())),
        4 => Ok(u64::from(value.get_u32())),
        8 => Ok(value.get_u64()),
        other => Err(TlvError::InvalidNonNegativeInteger(other)),
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, &[0x00])]
    #[case(252, &[0xFC])]
    #[case(253, &[0xFD, 0x00, 0xFD])]
    #[case(0x1_0000, &[0xFE, 0x00, 0x01, 0x00, 0x00])]
    #[case(0x1_0000_0000, &[0xFF, 0, 0, 0, 1, 0, 0, 0, 0])]
    fn var_number_uses_shortest_form(#[case] value: u64, #[case] wire: &[u8]) {
        let mut buf = BytesMut::new();
        put_var_number(&mut buf, value);
        assert_eq!(buf.as_ref(), wire);
        assert_eq!(var_number_len(value), wire.len());
        assert_eq!(read_var_number(wire), Ok((value, wire.len())));
    }

    #[test]
    fn truncated_var_number_reports_needed_bytes() {
        assert_eq!(
            read_var_number(&[0xFE, 0x00]),
            Err(TlvError::Truncated {
                needed: 5,
                available: 2,
            })
        );
    }

    #[test]
    fn type_zero_is_invalid() {
        assert_eq!(decode_type_length(&[0x00, 0x01]), Err(TlvError::InvalidType(0)));
    }

    #[test]
    fn header_without_value_decodes() {
        let header = decode_type_length(&[0x05, 0xFD, 0x01, 0x00]).expect("header decodes");
        assert_eq!(header.typ, 5);
        assert_eq!(header.length, 256);
        assert_eq!(header.header_len, 4);
        assert_eq!(header.total_len(), 260);
    }

    #[rstest]
    #[case(7, 1)]
    #[case(300, 2)]
    #[case(70_000, 4)]
    #[case(u64::MAX, 8)]
    fn nni_round_trips(#[case] value: u64, #[case] len: usize) {
        let mut buf = BytesMut::new();
        put_nni(&mut buf, value);
        assert_eq!(buf.len(), len);
        assert_eq!(read_nni(&buf), Ok(value));
    }

    #[test]
    fn nni_rejects_odd_lengths() {
        assert_eq!(read_nni(&[1, 2, 3]), Err(TlvError::InvalidNonNegativeInteger(3)));
    }
}
