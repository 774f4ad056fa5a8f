//! The `EncodedValue` tagged union and compound wire structures.
//!
//! Application values travel on the wire as a one-byte tag followed by a
//! tag-specific payload. Exactly one tag is present per value; the null tag
//! has no payload. Composite application types are carried as UTF-8 text of
//! a self-describing structured encoding under the json tag.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::ProtocolError;
use crate::wire;

/// Value tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueTag {
    /// Absence of a value.
    Null = 0x00,
    /// Unsigned 8-bit integer.
    Byte = 0x01,
    /// Signed 16-bit integer.
    Short = 0x02,
    /// Signed 32-bit integer.
    Int = 0x03,
    /// Signed 64-bit integer.
    Long = 0x04,
    /// Boolean.
    Bool = 0x05,
    /// 32-bit IEEE 754 float.
    Float = 0x06,
    /// 64-bit IEEE 754 float.
    Double = 0x07,
    /// Raw byte blob.
    Binary = 0x08,
    /// UTF-8 text.
    String = 0x09,
    /// Structured object as self-describing UTF-8 text.
    Json = 0x0A,
}

impl ValueTag {
    /// Create a value tag from a raw byte.
    pub fn from_u8(value: u8) -> Result<Self, ProtocolError> {
        match value {
            0x00 => Ok(Self::Null),
            0x01 => Ok(Self::Byte),
            0x02 => Ok(Self::Short),
            0x03 => Ok(Self::Int),
            0x04 => Ok(Self::Long),
            0x05 => Ok(Self::Bool),
            0x06 => Ok(Self::Float),
            0x07 => Ok(Self::Double),
            0x08 => Ok(Self::Binary),
            0x09 => Ok(Self::String),
            0x0A => Ok(Self::Json),
            other => Err(ProtocolError::InvalidValueTag(other)),
        }
    }
}

/// A wire-encoded application value.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedValue {
    /// Absence of a value.
    Null,
    /// Unsigned 8-bit integer.
    Byte(u8),
    /// Signed 16-bit integer.
    Short(i16),
    /// Signed 32-bit integer.
    Int(i32),
    /// Signed 64-bit integer.
    Long(i64),
    /// Boolean.
    Bool(bool),
    /// 32-bit IEEE 754 float.
    Float(f32),
    /// 64-bit IEEE 754 float.
    Double(f64),
    /// Raw byte blob.
    Binary(Bytes),
    /// UTF-8 text.
    String(String),
    /// Structured object as self-describing UTF-8 text.
    Json(String),
}

impl EncodedValue {
    /// The wire tag for this value.
    #[must_use]
    pub fn tag(&self) -> ValueTag {
        match self {
            Self::Null => ValueTag::Null,
            Self::Byte(_) => ValueTag::Byte,
            Self::Short(_) => ValueTag::Short,
            Self::Int(_) => ValueTag::Int,
            Self::Long(_) => ValueTag::Long,
            Self::Bool(_) => ValueTag::Bool,
            Self::Float(_) => ValueTag::Float,
            Self::Double(_) => ValueTag::Double,
            Self::Binary(_) => ValueTag::Binary,
            Self::String(_) => ValueTag::String,
            Self::Json(_) => ValueTag::Json,
        }
    }

    /// Encode tag and payload onto `buf`.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.tag() as u8);
        match self {
            Self::Null => {}
            Self::Byte(v) => buf.put_u8(*v),
            Self::Short(v) => buf.put_i16(*v),
            Self::Int(v) => buf.put_i32(*v),
            Self::Long(v) => buf.put_i64(*v),
            Self::Bool(v) => wire::put_bool(buf, *v),
            Self::Float(v) => buf.put_f32(*v),
            Self::Double(v) => buf.put_f64(*v),
            Self::Binary(v) => wire::put_bytes(buf, v),
            Self::String(v) | Self::Json(v) => wire::put_string(buf, v),
        }
    }

    /// Decode one value from `buf`.
    pub fn decode(buf: &mut Bytes) -> Result<Self, ProtocolError> {
        wire::ensure(buf, 1)?;
        let tag = ValueTag::from_u8(buf.get_u8())?;
        match tag {
            ValueTag::Null => Ok(Self::Null),
            ValueTag::Byte => {
                wire::ensure(buf, 1)?;
                Ok(Self::Byte(buf.get_u8()))
            }
            ValueTag::Short => {
                wire::ensure(buf, 2)?;
                Ok(Self::Short(buf.get_i16()))
            }
            ValueTag::Int => Ok(Self::Int(wire::get_i32(buf)?)),
            ValueTag::Long => {
                wire::ensure(buf, 8)?;
                Ok(Self::Long(buf.get_i64()))
            }
            ValueTag::Bool => Ok(Self::Bool(wire::get_bool(buf)?)),
            ValueTag::Float => {
                wire::ensure(buf, 4)?;
                Ok(Self::Float(buf.get_f32()))
            }
            ValueTag::Double => {
                wire::ensure(buf, 8)?;
                Ok(Self::Double(buf.get_f64()))
            }
            ValueTag::Binary => Ok(Self::Binary(wire::get_bytes(buf)?)),
            ValueTag::String => Ok(Self::String(wire::get_string(buf)?)),
            ValueTag::Json => Ok(Self::Json(wire::get_string(buf)?)),
        }
    }
}

/// Homogeneous sequence of encoded values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EncodedValueList {
    /// The sequence elements, in order.
    pub elements: Vec<EncodedValue>,
}

impl EncodedValueList {
    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        wire::put_seq(buf, &self.elements, EncodedValue::encode);
    }

    pub(crate) fn decode(buf: &mut Bytes) -> Result<Self, ProtocolError> {
        Ok(Self {
            elements: wire::get_seq(buf, EncodedValue::decode)?,
        })
    }
}

/// A key/value pair inside batch requests and responses.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Entry key.
    pub key: EncodedValue,
    /// Entry value.
    pub value: EncodedValue,
}

impl Entry {
    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        self.key.encode(buf);
        self.value.encode(buf);
    }

    pub(crate) fn decode(buf: &mut Bytes) -> Result<Self, ProtocolError> {
        Ok(Self {
            key: EncodedValue::decode(buf)?,
            value: EncodedValue::decode(buf)?,
        })
    }
}

/// Server-reported failure detail: message text plus numeric code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    /// Numeric error code.
    pub code: i32,
    /// Human-readable message.
    pub message: String,
}

impl ErrorDetail {
    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        buf.put_i32(self.code);
        wire::put_string(buf, &self.message);
    }

    pub(crate) fn decode(buf: &mut Bytes) -> Result<Self, ProtocolError> {
        Ok(Self {
            code: wire::get_i32(buf)?,
            message: wire::get_string(buf)?,
        })
    }
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

/// A per-key failure inside a batch response.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedError {
    /// The key the failure applies to.
    pub key: EncodedValue,
    /// The failure detail.
    pub error: ErrorDetail,
}

impl KeyedError {
    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        self.key.encode(buf);
        self.error.encode(buf);
    }

    pub(crate) fn decode(buf: &mut Bytes) -> Result<Self, ProtocolError> {
        Ok(Self {
            key: EncodedValue::decode(buf)?,
            error: ErrorDetail::decode(buf)?,
        })
    }
}

/// Tabular query result: parallel arrays of column names and per-column
/// value sequences.
///
/// Row order within each column is preserved; the order of the columns
/// themselves is not guaranteed by the protocol.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    /// Column names.
    pub columns: Vec<String>,
    /// Per-column value sequences, parallel to `columns`.
    pub values: Vec<EncodedValueList>,
}

impl Table {
    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        wire::put_seq(buf, &self.columns, |name, buf| wire::put_string(buf, name));
        wire::put_seq(buf, &self.values, EncodedValueList::encode);
    }

    pub(crate) fn decode(buf: &mut Bytes) -> Result<Self, ProtocolError> {
        Ok(Self {
            columns: wire::get_seq(buf, wire::get_string)?,
            values: wire::get_seq(buf, EncodedValueList::decode)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: &EncodedValue) -> EncodedValue {
        let mut buf = BytesMut::new();
        value.encode(&mut buf);
        let mut bytes = buf.freeze();
        #[allow(clippy::unwrap_used)]
        let decoded = EncodedValue::decode(&mut bytes).unwrap();
        assert!(bytes.is_empty(), "decode consumed the full encoding");
        decoded
    }

    #[test]
    fn test_scalar_roundtrips() {
        for value in [
            EncodedValue::Null,
            EncodedValue::Byte(0xAB),
            EncodedValue::Short(-12),
            EncodedValue::Int(42),
            EncodedValue::Long(i64::MIN),
            EncodedValue::Bool(true),
            EncodedValue::Float(1.5),
            EncodedValue::Double(-2.25),
            EncodedValue::Binary(Bytes::from_static(b"\x00\x01\x02")),
            EncodedValue::String("hello".to_string()),
            EncodedValue::Json(r#"{"a":1}"#.to_string()),
        ] {
            assert_eq!(roundtrip(&value), value);
        }
    }

    #[test]
    fn test_null_has_no_payload() {
        let mut buf = BytesMut::new();
        EncodedValue::Null.encode(&mut buf);
        assert_eq!(buf.as_ref(), &[ValueTag::Null as u8]);
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let mut bytes = Bytes::from_static(&[0x7E, 0x00]);
        assert!(matches!(
            EncodedValue::decode(&mut bytes),
            Err(ProtocolError::InvalidValueTag(0x7E))
        ));
    }

    #[test]
    fn test_truncated_payload_rejected() {
        // Int tag followed by only two of four bytes
        let mut bytes = Bytes::from_static(&[ValueTag::Int as u8, 0x00, 0x01]);
        assert!(matches!(
            EncodedValue::decode(&mut bytes),
            Err(ProtocolError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_table_roundtrip() {
        let table = Table {
            columns: vec!["a".to_string(), "b".to_string()],
            values: vec![
                EncodedValueList {
                    elements: vec![EncodedValue::Int(1), EncodedValue::Int(2)],
                },
                EncodedValueList {
                    elements: vec![EncodedValue::Int(3), EncodedValue::Int(4)],
                },
            ],
        };
        let mut buf = BytesMut::new();
        table.encode(&mut buf);
        let mut bytes = buf.freeze();
        #[allow(clippy::unwrap_used)]
        let decoded = Table::decode(&mut bytes).unwrap();
        assert_eq!(decoded, table);
    }
}
