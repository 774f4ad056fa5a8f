//! Protocol-level error types.

use thiserror::Error;

/// Errors that can occur during wire-schema parsing or encoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Message data ended before the declared content was read.
    #[error("unexpected end of message")]
    UnexpectedEof,

    /// Invalid message kind byte.
    #[error("invalid message kind: {0:#x}")]
    InvalidMessageKind(u8),

    /// Invalid value tag byte.
    #[error("invalid value tag: {0:#x}")]
    InvalidValueTag(u8),

    /// Invalid query result kind byte.
    #[error("invalid query result kind: {0:#x}")]
    InvalidQueryResultKind(u8),

    /// Invalid boolean byte (anything other than 0 or 1).
    #[error("invalid boolean value: {0:#x}")]
    InvalidBool(u8),

    /// Varint did not terminate within the 10-byte limit or overflowed u64.
    #[error("varint overflow")]
    VarintOverflow,

    /// A declared length does not fit in this platform's address space.
    #[error("declared length too large: {0}")]
    LengthOverflow(u64),

    /// String data is not valid UTF-8.
    #[error("invalid UTF-8 in string: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// Trailing bytes remained after a complete message was decoded.
    #[error("trailing garbage after message: {0} bytes")]
    TrailingBytes(usize),
}
