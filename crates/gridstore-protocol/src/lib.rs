//! # gridstore-protocol
//!
//! Wire schema for the GridStore binary client protocol.
//!
//! Every message on the wire is a varint byte count followed by exactly that
//! many bytes of schema-encoded payload. This crate defines the payload
//! schema: the message envelopes, the [`EncodedValue`] tagged union that
//! carries application values, and the varint primitives used for the
//! length prefix and all embedded lengths.
//!
//! This crate is pure encode/decode over [`bytes`] buffers; it performs no
//! I/O. Framing and transport concerns live in `gridstore-codec`.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod handshake;
pub mod message;
pub mod value;
pub mod varint;

mod wire;

pub use error::ProtocolError;
pub use handshake::{
    AuthenticationRequest, AuthenticationResponse, HandshakeRequest, HandshakeResponse,
    PROTOCOL_MAJOR_VERSION, PROTOCOL_MINOR_VERSION,
};
pub use message::{Message, MessageKind, QueryResult};
pub use value::{EncodedValue, EncodedValueList, Entry, ErrorDetail, KeyedError, Table, ValueTag};
