//! Variable-length integer encoding.
//!
//! Unsigned LEB128: seven payload bits per byte, least significant group
//! first, high bit set on every byte except the last. A u64 therefore
//! occupies at most ten bytes. The frame length prefix and every embedded
//! length on the wire use this encoding.

use bytes::{Buf, BufMut, Bytes};

use crate::error::ProtocolError;

/// Maximum encoded size of a u64 varint.
pub const MAX_VARINT_LEN: usize = 10;

/// Encode `value` onto `buf`.
pub fn encode_varint(mut value: u64, buf: &mut impl BufMut) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf.put_u8(byte);
            return;
        }
        buf.put_u8(byte | 0x80);
    }
}

/// Number of bytes [`encode_varint`] will produce for `value`.
#[must_use]
pub fn varint_len(value: u64) -> usize {
    // 1 + floor(bits/7), with zero occupying one byte
    let bits = 64 - value.max(1).leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

/// Try to decode a varint from the front of `data` without consuming it.
///
/// Returns `Ok(None)` when `data` ends before the varint terminates, so
/// callers accumulating a partial read can fetch more bytes and try again.
/// On success returns the value and the number of bytes it occupied.
pub fn peek_varint(data: &[u8]) -> Result<Option<(u64, usize)>, ProtocolError> {
    let mut value = 0u64;
    let mut shift = 0u32;

    for (i, &byte) in data.iter().enumerate() {
        if i >= MAX_VARINT_LEN || (shift == 63 && (byte & 0x7F) > 1) {
            return Err(ProtocolError::VarintOverflow);
        }
        value |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok(Some((value, i + 1)));
        }
        shift += 7;
    }

    Ok(None)
}

/// Decode a varint from `buf`, consuming its bytes.
pub fn decode_varint(buf: &mut Bytes) -> Result<u64, ProtocolError> {
    match peek_varint(buf.as_ref())? {
        Some((value, len)) => {
            buf.advance(len);
            Ok(value)
        }
        None => Err(ProtocolError::UnexpectedEof),
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use proptest::prelude::*;

    use super::*;

    fn roundtrip(value: u64) -> (u64, usize) {
        let mut buf = BytesMut::new();
        encode_varint(value, &mut buf);
        let encoded_len = buf.len();
        let mut bytes = buf.freeze();
        #[allow(clippy::unwrap_used)]
        let decoded = decode_varint(&mut bytes).unwrap();
        assert!(bytes.is_empty());
        (decoded, encoded_len)
    }

    #[test]
    fn test_single_byte_values() {
        assert_eq!(roundtrip(0), (0, 1));
        assert_eq!(roundtrip(1), (1, 1));
        assert_eq!(roundtrip(127), (127, 1));
    }

    #[test]
    fn test_multi_byte_values() {
        assert_eq!(roundtrip(128), (128, 2));
        assert_eq!(roundtrip(300), (300, 2));
        assert_eq!(roundtrip(16_384), (16_384, 3));
        assert_eq!(roundtrip(u64::MAX), (u64::MAX, 10));
    }

    #[test]
    fn test_truncated_varint_is_incomplete() {
        // High bit set on the only byte: more bytes expected
        assert_eq!(peek_varint(&[0x80]).ok(), Some(None));
        let mut bytes = Bytes::from_static(&[0x80]);
        assert!(matches!(
            decode_varint(&mut bytes),
            Err(ProtocolError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_overlong_varint_rejected() {
        let data = [0xFF; 11];
        assert!(matches!(
            peek_varint(&data),
            Err(ProtocolError::VarintOverflow)
        ));
    }

    #[test]
    fn test_varint_len_matches_encoding() {
        for value in [0, 1, 127, 128, 16_383, 16_384, u64::from(u32::MAX), u64::MAX] {
            let (_, len) = roundtrip(value);
            assert_eq!(varint_len(value), len, "value {value}");
        }
    }

    proptest! {
        #[test]
        fn prop_roundtrip(value: u64) {
            let (decoded, len) = roundtrip(value);
            prop_assert_eq!(decoded, value);
            prop_assert!(len <= MAX_VARINT_LEN);
        }
    }
}
