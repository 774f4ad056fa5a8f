//! Shared primitives for schema encode/decode.
//!
//! All strings and blobs are varint-length-prefixed; sequences are a varint
//! count followed by the items; booleans are a single 0/1 byte. Reads are
//! bounds-checked so malformed input surfaces as [`ProtocolError`] instead
//! of panicking.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::ProtocolError;
use crate::varint::{decode_varint, encode_varint};

pub(crate) fn ensure(buf: &Bytes, needed: usize) -> Result<(), ProtocolError> {
    if buf.remaining() < needed {
        return Err(ProtocolError::UnexpectedEof);
    }
    Ok(())
}

/// Decode a varint and validate it as an in-buffer length.
pub(crate) fn get_len(buf: &mut Bytes) -> Result<usize, ProtocolError> {
    let raw = decode_varint(buf)?;
    let len = usize::try_from(raw).map_err(|_| ProtocolError::LengthOverflow(raw))?;
    ensure(buf, len)?;
    Ok(len)
}

pub(crate) fn put_bool(buf: &mut BytesMut, value: bool) {
    buf.put_u8(u8::from(value));
}

pub(crate) fn get_bool(buf: &mut Bytes) -> Result<bool, ProtocolError> {
    ensure(buf, 1)?;
    match buf.get_u8() {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(ProtocolError::InvalidBool(other)),
    }
}

pub(crate) fn put_string(buf: &mut BytesMut, value: &str) {
    encode_varint(value.len() as u64, buf);
    buf.put_slice(value.as_bytes());
}

pub(crate) fn get_string(buf: &mut Bytes) -> Result<String, ProtocolError> {
    let len = get_len(buf)?;
    let raw = buf.copy_to_bytes(len);
    Ok(String::from_utf8(raw.to_vec())?)
}

pub(crate) fn put_bytes(buf: &mut BytesMut, value: &[u8]) {
    encode_varint(value.len() as u64, buf);
    buf.put_slice(value);
}

pub(crate) fn get_bytes(buf: &mut Bytes) -> Result<Bytes, ProtocolError> {
    let len = get_len(buf)?;
    Ok(buf.copy_to_bytes(len))
}

pub(crate) fn put_seq<T>(buf: &mut BytesMut, items: &[T], encode: impl Fn(&T, &mut BytesMut)) {
    encode_varint(items.len() as u64, buf);
    for item in items {
        encode(item, buf);
    }
}

pub(crate) fn get_seq<T>(
    buf: &mut Bytes,
    decode: impl Fn(&mut Bytes) -> Result<T, ProtocolError>,
) -> Result<Vec<T>, ProtocolError> {
    let raw = decode_varint(buf)?;
    let count = usize::try_from(raw).map_err(|_| ProtocolError::LengthOverflow(raw))?;
    // Cap the pre-allocation; a hostile count must not trigger a huge alloc
    // before the items have actually arrived.
    let mut items = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        items.push(decode(buf)?);
    }
    Ok(items)
}

pub(crate) fn get_u32(buf: &mut Bytes) -> Result<u32, ProtocolError> {
    ensure(buf, 4)?;
    Ok(buf.get_u32())
}

pub(crate) fn get_i32(buf: &mut Bytes) -> Result<i32, ProtocolError> {
    ensure(buf, 4)?;
    Ok(buf.get_i32())
}
