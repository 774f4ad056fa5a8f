//! Message envelopes.
//!
//! A message payload is a one-byte kind followed by the kind-specific body.
//! Requests and responses are distinct kinds; an [`Message::ErrorResponse`]
//! may arrive in place of any success response.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::ProtocolError;
use crate::handshake::{
    AuthenticationRequest, AuthenticationResponse, HandshakeRequest, HandshakeResponse,
};
use crate::value::{EncodedValue, EncodedValueList, Entry, ErrorDetail, KeyedError, Table};
use crate::wire;

/// Message kind byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    /// Client version declaration.
    HandshakeRequest = 0x01,
    /// Server version verdict.
    HandshakeResponse = 0x02,
    /// Credential presentation.
    AuthenticationRequest = 0x03,
    /// Credential verdict.
    AuthenticationResponse = 0x04,
    /// Store one entry.
    PutRequest = 0x10,
    /// Put acknowledgement.
    PutResponse = 0x11,
    /// Store one entry unless the key exists.
    PutIfAbsentRequest = 0x12,
    /// PutIfAbsent acknowledgement.
    PutIfAbsentResponse = 0x13,
    /// Fetch one entry.
    GetRequest = 0x14,
    /// Fetched value (null when absent).
    GetResponse = 0x15,
    /// Fetch many entries.
    GetAllRequest = 0x16,
    /// Fetched entries plus per-key failures.
    GetAllResponse = 0x17,
    /// Store many entries.
    PutAllRequest = 0x18,
    /// Per-key failures for a bulk store.
    PutAllResponse = 0x19,
    /// Delete one entry.
    RemoveRequest = 0x1A,
    /// Remove acknowledgement.
    RemoveResponse = 0x1B,
    /// Count entries in a region.
    GetSizeRequest = 0x1C,
    /// Region entry count.
    GetSizeResponse = 0x1D,
    /// Invoke a server-side function against a region.
    ExecuteFunctionOnRegionRequest = 0x20,
    /// Function results (region-targeted).
    ExecuteFunctionOnRegionResponse = 0x21,
    /// Invoke a server-side function on named members.
    ExecuteFunctionOnMemberRequest = 0x22,
    /// Function results (member-targeted).
    ExecuteFunctionOnMemberResponse = 0x23,
    /// Invoke a server-side function on named groups.
    ExecuteFunctionOnGroupRequest = 0x24,
    /// Function results (group-targeted).
    ExecuteFunctionOnGroupResponse = 0x25,
    /// OQL query with bound parameters.
    OqlQueryRequest = 0x26,
    /// OQL query result (single, list or table shaped).
    OqlQueryResponse = 0x27,
    /// Server-reported failure in place of a success response.
    ErrorResponse = 0xFF,
}

impl MessageKind {
    /// Create a message kind from a raw byte.
    pub fn from_u8(value: u8) -> Result<Self, ProtocolError> {
        match value {
            0x01 => Ok(Self::HandshakeRequest),
            0x02 => Ok(Self::HandshakeResponse),
            0x03 => Ok(Self::AuthenticationRequest),
            0x04 => Ok(Self::AuthenticationResponse),
            0x10 => Ok(Self::PutRequest),
            0x11 => Ok(Self::PutResponse),
            0x12 => Ok(Self::PutIfAbsentRequest),
            0x13 => Ok(Self::PutIfAbsentResponse),
            0x14 => Ok(Self::GetRequest),
            0x15 => Ok(Self::GetResponse),
            0x16 => Ok(Self::GetAllRequest),
            0x17 => Ok(Self::GetAllResponse),
            0x18 => Ok(Self::PutAllRequest),
            0x19 => Ok(Self::PutAllResponse),
            0x1A => Ok(Self::RemoveRequest),
            0x1B => Ok(Self::RemoveResponse),
            0x1C => Ok(Self::GetSizeRequest),
            0x1D => Ok(Self::GetSizeResponse),
            0x20 => Ok(Self::ExecuteFunctionOnRegionRequest),
            0x21 => Ok(Self::ExecuteFunctionOnRegionResponse),
            0x22 => Ok(Self::ExecuteFunctionOnMemberRequest),
            0x23 => Ok(Self::ExecuteFunctionOnMemberResponse),
            0x24 => Ok(Self::ExecuteFunctionOnGroupRequest),
            0x25 => Ok(Self::ExecuteFunctionOnGroupResponse),
            0x26 => Ok(Self::OqlQueryRequest),
            0x27 => Ok(Self::OqlQueryResponse),
            0xFF => Ok(Self::ErrorResponse),
            other => Err(ProtocolError::InvalidMessageKind(other)),
        }
    }
}

/// One of the three OQL result shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// A single value.
    Single(EncodedValue),
    /// A flat sequence of values.
    List(EncodedValueList),
    /// A tabular result.
    Table(Table),
}

impl QueryResult {
    const KIND_SINGLE: u8 = 0;
    const KIND_LIST: u8 = 1;
    const KIND_TABLE: u8 = 2;

    fn encode(&self, buf: &mut BytesMut) {
        match self {
            Self::Single(value) => {
                buf.put_u8(Self::KIND_SINGLE);
                value.encode(buf);
            }
            Self::List(list) => {
                buf.put_u8(Self::KIND_LIST);
                list.encode(buf);
            }
            Self::Table(table) => {
                buf.put_u8(Self::KIND_TABLE);
                table.encode(buf);
            }
        }
    }

    fn decode(buf: &mut Bytes) -> Result<Self, ProtocolError> {
        wire::ensure(buf, 1)?;
        match buf.get_u8() {
            Self::KIND_SINGLE => Ok(Self::Single(EncodedValue::decode(buf)?)),
            Self::KIND_LIST => Ok(Self::List(EncodedValueList::decode(buf)?)),
            Self::KIND_TABLE => Ok(Self::Table(Table::decode(buf)?)),
            other => Err(ProtocolError::InvalidQueryResultKind(other)),
        }
    }
}

/// A complete protocol message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Client version declaration.
    HandshakeRequest(HandshakeRequest),
    /// Server version verdict.
    HandshakeResponse(HandshakeResponse),
    /// Credential presentation.
    AuthenticationRequest(AuthenticationRequest),
    /// Credential verdict.
    AuthenticationResponse(AuthenticationResponse),
    /// Store one entry.
    PutRequest {
        /// Target region.
        region: String,
        /// Entry key.
        key: EncodedValue,
        /// Entry value.
        value: EncodedValue,
    },
    /// Put acknowledgement.
    PutResponse,
    /// Store one entry unless the key already exists.
    PutIfAbsentRequest {
        /// Target region.
        region: String,
        /// Entry key.
        key: EncodedValue,
        /// Entry value.
        value: EncodedValue,
    },
    /// PutIfAbsent acknowledgement.
    PutIfAbsentResponse,
    /// Fetch one entry.
    GetRequest {
        /// Target region.
        region: String,
        /// Entry key.
        key: EncodedValue,
    },
    /// Fetched value; null tag when the key is absent.
    GetResponse {
        /// The stored value.
        result: EncodedValue,
    },
    /// Fetch many entries.
    GetAllRequest {
        /// Target region.
        region: String,
        /// Keys to fetch.
        keys: Vec<EncodedValue>,
    },
    /// Fetched entries plus per-key failures.
    GetAllResponse {
        /// Successfully fetched entries.
        entries: Vec<Entry>,
        /// Per-key failures.
        failures: Vec<KeyedError>,
    },
    /// Store many entries.
    PutAllRequest {
        /// Target region.
        region: String,
        /// Entries to store.
        entries: Vec<Entry>,
    },
    /// Per-key failures for a bulk store.
    PutAllResponse {
        /// Keys that failed to store.
        failed_keys: Vec<KeyedError>,
    },
    /// Delete one entry.
    RemoveRequest {
        /// Target region.
        region: String,
        /// Entry key.
        key: EncodedValue,
    },
    /// Remove acknowledgement.
    RemoveResponse,
    /// Count entries in a region.
    GetSizeRequest {
        /// Target region.
        region: String,
    },
    /// Region entry count.
    GetSizeResponse {
        /// Number of entries.
        size: i32,
    },
    /// Invoke a server-side function against a region.
    ExecuteFunctionOnRegionRequest {
        /// Function identifier.
        function_id: String,
        /// Target region.
        region: String,
        /// Function arguments.
        arguments: EncodedValue,
    },
    /// Function results (region-targeted).
    ExecuteFunctionOnRegionResponse {
        /// Per-invocation results.
        results: Vec<EncodedValue>,
    },
    /// Invoke a server-side function on named members.
    ExecuteFunctionOnMemberRequest {
        /// Function identifier.
        function_id: String,
        /// Target member names.
        members: Vec<String>,
        /// Function arguments.
        arguments: EncodedValue,
    },
    /// Function results (member-targeted).
    ExecuteFunctionOnMemberResponse {
        /// Per-invocation results.
        results: Vec<EncodedValue>,
    },
    /// Invoke a server-side function on named groups.
    ExecuteFunctionOnGroupRequest {
        /// Function identifier.
        function_id: String,
        /// Target group names.
        groups: Vec<String>,
        /// Function arguments.
        arguments: EncodedValue,
    },
    /// Function results (group-targeted).
    ExecuteFunctionOnGroupResponse {
        /// Per-invocation results.
        results: Vec<EncodedValue>,
    },
    /// OQL query with bound parameters.
    OqlQueryRequest {
        /// Query text.
        query: String,
        /// Positional bind parameters.
        bind_parameters: Vec<EncodedValue>,
    },
    /// OQL query result.
    OqlQueryResponse {
        /// The result in one of its three shapes.
        result: QueryResult,
    },
    /// Server-reported failure in place of a success response.
    ErrorResponse {
        /// The failure detail.
        error: ErrorDetail,
    },
}

impl Message {
    /// The wire kind of this message.
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::HandshakeRequest(_) => MessageKind::HandshakeRequest,
            Self::HandshakeResponse(_) => MessageKind::HandshakeResponse,
            Self::AuthenticationRequest(_) => MessageKind::AuthenticationRequest,
            Self::AuthenticationResponse(_) => MessageKind::AuthenticationResponse,
            Self::PutRequest { .. } => MessageKind::PutRequest,
            Self::PutResponse => MessageKind::PutResponse,
            Self::PutIfAbsentRequest { .. } => MessageKind::PutIfAbsentRequest,
            Self::PutIfAbsentResponse => MessageKind::PutIfAbsentResponse,
            Self::GetRequest { .. } => MessageKind::GetRequest,
            Self::GetResponse { .. } => MessageKind::GetResponse,
            Self::GetAllRequest { .. } => MessageKind::GetAllRequest,
            Self::GetAllResponse { .. } => MessageKind::GetAllResponse,
            Self::PutAllRequest { .. } => MessageKind::PutAllRequest,
            Self::PutAllResponse { .. } => MessageKind::PutAllResponse,
            Self::RemoveRequest { .. } => MessageKind::RemoveRequest,
            Self::RemoveResponse => MessageKind::RemoveResponse,
            Self::GetSizeRequest { .. } => MessageKind::GetSizeRequest,
            Self::GetSizeResponse { .. } => MessageKind::GetSizeResponse,
            Self::ExecuteFunctionOnRegionRequest { .. } => {
                MessageKind::ExecuteFunctionOnRegionRequest
            }
            Self::ExecuteFunctionOnRegionResponse { .. } => {
                MessageKind::ExecuteFunctionOnRegionResponse
            }
            Self::ExecuteFunctionOnMemberRequest { .. } => {
                MessageKind::ExecuteFunctionOnMemberRequest
            }
            Self::ExecuteFunctionOnMemberResponse { .. } => {
                MessageKind::ExecuteFunctionOnMemberResponse
            }
            Self::ExecuteFunctionOnGroupRequest { .. } => {
                MessageKind::ExecuteFunctionOnGroupRequest
            }
            Self::ExecuteFunctionOnGroupResponse { .. } => {
                MessageKind::ExecuteFunctionOnGroupResponse
            }
            Self::OqlQueryRequest { .. } => MessageKind::OqlQueryRequest,
            Self::OqlQueryResponse { .. } => MessageKind::OqlQueryResponse,
            Self::ErrorResponse { .. } => MessageKind::ErrorResponse,
        }
    }

    /// Encode the message payload: kind byte plus body.
    ///
    /// The frame length prefix is not included; that is the framing layer's
    /// concern.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(64);
        buf.put_u8(self.kind() as u8);
        match self {
            Self::HandshakeRequest(body) => body.encode(&mut buf),
            Self::HandshakeResponse(body) => body.encode(&mut buf),
            Self::AuthenticationRequest(body) => body.encode(&mut buf),
            Self::AuthenticationResponse(body) => body.encode(&mut buf),
            Self::PutRequest { region, key, value }
            | Self::PutIfAbsentRequest { region, key, value } => {
                wire::put_string(&mut buf, region);
                key.encode(&mut buf);
                value.encode(&mut buf);
            }
            Self::PutResponse
            | Self::PutIfAbsentResponse
            | Self::RemoveResponse => {}
            Self::GetRequest { region, key } | Self::RemoveRequest { region, key } => {
                wire::put_string(&mut buf, region);
                key.encode(&mut buf);
            }
            Self::GetResponse { result } => result.encode(&mut buf),
            Self::GetAllRequest { region, keys } => {
                wire::put_string(&mut buf, region);
                wire::put_seq(&mut buf, keys, EncodedValue::encode);
            }
            Self::GetAllResponse { entries, failures } => {
                wire::put_seq(&mut buf, entries, Entry::encode);
                wire::put_seq(&mut buf, failures, KeyedError::encode);
            }
            Self::PutAllRequest { region, entries } => {
                wire::put_string(&mut buf, region);
                wire::put_seq(&mut buf, entries, Entry::encode);
            }
            Self::PutAllResponse { failed_keys } => {
                wire::put_seq(&mut buf, failed_keys, KeyedError::encode);
            }
            Self::GetSizeRequest { region } => wire::put_string(&mut buf, region),
            Self::GetSizeResponse { size } => buf.put_i32(*size),
            Self::ExecuteFunctionOnRegionRequest {
                function_id,
                region,
                arguments,
            } => {
                wire::put_string(&mut buf, function_id);
                wire::put_string(&mut buf, region);
                arguments.encode(&mut buf);
            }
            Self::ExecuteFunctionOnMemberRequest {
                function_id,
                members,
                arguments,
            } => {
                wire::put_string(&mut buf, function_id);
                wire::put_seq(&mut buf, members, |name, buf| wire::put_string(buf, name));
                arguments.encode(&mut buf);
            }
            Self::ExecuteFunctionOnGroupRequest {
                function_id,
                groups,
                arguments,
            } => {
                wire::put_string(&mut buf, function_id);
                wire::put_seq(&mut buf, groups, |name, buf| wire::put_string(buf, name));
                arguments.encode(&mut buf);
            }
            Self::ExecuteFunctionOnRegionResponse { results }
            | Self::ExecuteFunctionOnMemberResponse { results }
            | Self::ExecuteFunctionOnGroupResponse { results } => {
                wire::put_seq(&mut buf, results, EncodedValue::encode);
            }
            Self::OqlQueryRequest {
                query,
                bind_parameters,
            } => {
                wire::put_string(&mut buf, query);
                wire::put_seq(&mut buf, bind_parameters, EncodedValue::encode);
            }
            Self::OqlQueryResponse { result } => result.encode(&mut buf),
            Self::ErrorResponse { error } => error.encode(&mut buf),
        }
        buf.freeze()
    }

    /// Decode a complete message payload.
    ///
    /// The payload must contain exactly one message; trailing bytes are a
    /// protocol error.
    pub fn decode(payload: Bytes) -> Result<Self, ProtocolError> {
        let mut buf = payload;
        wire::ensure(&buf, 1)?;
        let kind = MessageKind::from_u8(buf.get_u8())?;

        let message = match kind {
            MessageKind::HandshakeRequest => {
                Self::HandshakeRequest(HandshakeRequest::decode(&mut buf)?)
            }
            MessageKind::HandshakeResponse => {
                Self::HandshakeResponse(HandshakeResponse::decode(&mut buf)?)
            }
            MessageKind::AuthenticationRequest => {
                Self::AuthenticationRequest(AuthenticationRequest::decode(&mut buf)?)
            }
            MessageKind::AuthenticationResponse => {
                Self::AuthenticationResponse(AuthenticationResponse::decode(&mut buf)?)
            }
            MessageKind::PutRequest => Self::PutRequest {
                region: wire::get_string(&mut buf)?,
                key: EncodedValue::decode(&mut buf)?,
                value: EncodedValue::decode(&mut buf)?,
            },
            MessageKind::PutResponse => Self::PutResponse,
            MessageKind::PutIfAbsentRequest => Self::PutIfAbsentRequest {
                region: wire::get_string(&mut buf)?,
                key: EncodedValue::decode(&mut buf)?,
                value: EncodedValue::decode(&mut buf)?,
            },
            MessageKind::PutIfAbsentResponse => Self::PutIfAbsentResponse,
            MessageKind::GetRequest => Self::GetRequest {
                region: wire::get_string(&mut buf)?,
                key: EncodedValue::decode(&mut buf)?,
            },
            MessageKind::GetResponse => Self::GetResponse {
                result: EncodedValue::decode(&mut buf)?,
            },
            MessageKind::GetAllRequest => Self::GetAllRequest {
                region: wire::get_string(&mut buf)?,
                keys: wire::get_seq(&mut buf, EncodedValue::decode)?,
            },
            MessageKind::GetAllResponse => Self::GetAllResponse {
                entries: wire::get_seq(&mut buf, Entry::decode)?,
                failures: wire::get_seq(&mut buf, KeyedError::decode)?,
            },
            MessageKind::PutAllRequest => Self::PutAllRequest {
                region: wire::get_string(&mut buf)?,
                entries: wire::get_seq(&mut buf, Entry::decode)?,
            },
            MessageKind::PutAllResponse => Self::PutAllResponse {
                failed_keys: wire::get_seq(&mut buf, KeyedError::decode)?,
            },
            MessageKind::RemoveRequest => Self::RemoveRequest {
                region: wire::get_string(&mut buf)?,
                key: EncodedValue::decode(&mut buf)?,
            },
            MessageKind::RemoveResponse => Self::RemoveResponse,
            MessageKind::GetSizeRequest => Self::GetSizeRequest {
                region: wire::get_string(&mut buf)?,
            },
            MessageKind::GetSizeResponse => Self::GetSizeResponse {
                size: wire::get_i32(&mut buf)?,
            },
            MessageKind::ExecuteFunctionOnRegionRequest => Self::ExecuteFunctionOnRegionRequest {
                function_id: wire::get_string(&mut buf)?,
                region: wire::get_string(&mut buf)?,
                arguments: EncodedValue::decode(&mut buf)?,
            },
            MessageKind::ExecuteFunctionOnRegionResponse => {
                Self::ExecuteFunctionOnRegionResponse {
                    results: wire::get_seq(&mut buf, EncodedValue::decode)?,
                }
            }
            MessageKind::ExecuteFunctionOnMemberRequest => Self::ExecuteFunctionOnMemberRequest {
                function_id: wire::get_string(&mut buf)?,
                members: wire::get_seq(&mut buf, wire::get_string)?,
                arguments: EncodedValue::decode(&mut buf)?,
            },
            MessageKind::ExecuteFunctionOnMemberResponse => {
                Self::ExecuteFunctionOnMemberResponse {
                    results: wire::get_seq(&mut buf, EncodedValue::decode)?,
                }
            }
            MessageKind::ExecuteFunctionOnGroupRequest => Self::ExecuteFunctionOnGroupRequest {
                function_id: wire::get_string(&mut buf)?,
                groups: wire::get_seq(&mut buf, wire::get_string)?,
                arguments: EncodedValue::decode(&mut buf)?,
            },
            MessageKind::ExecuteFunctionOnGroupResponse => Self::ExecuteFunctionOnGroupResponse {
                results: wire::get_seq(&mut buf, EncodedValue::decode)?,
            },
            MessageKind::OqlQueryRequest => Self::OqlQueryRequest {
                query: wire::get_string(&mut buf)?,
                bind_parameters: wire::get_seq(&mut buf, EncodedValue::decode)?,
            },
            MessageKind::OqlQueryResponse => Self::OqlQueryResponse {
                result: QueryResult::decode(&mut buf)?,
            },
            MessageKind::ErrorResponse => Self::ErrorResponse {
                error: ErrorDetail::decode(&mut buf)?,
            },
        };

        if !buf.is_empty() {
            return Err(ProtocolError::TrailingBytes(buf.len()));
        }
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(message: Message) {
        let payload = message.encode();
        #[allow(clippy::unwrap_used)]
        let decoded = Message::decode(payload).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_put_request_roundtrip() {
        roundtrip(Message::PutRequest {
            region: "orders".to_string(),
            key: EncodedValue::String("k1".to_string()),
            value: EncodedValue::Int(42),
        });
    }

    #[test]
    fn test_empty_response_roundtrips() {
        roundtrip(Message::PutResponse);
        roundtrip(Message::PutIfAbsentResponse);
        roundtrip(Message::RemoveResponse);
    }

    #[test]
    fn test_get_all_response_roundtrip() {
        roundtrip(Message::GetAllResponse {
            entries: vec![Entry {
                key: EncodedValue::String("k1".to_string()),
                value: EncodedValue::Long(7),
            }],
            failures: vec![KeyedError {
                key: EncodedValue::String("k2".to_string()),
                error: ErrorDetail {
                    code: 13,
                    message: "region fault".to_string(),
                },
            }],
        });
    }

    #[test]
    fn test_query_response_shapes_roundtrip() {
        roundtrip(Message::OqlQueryResponse {
            result: QueryResult::Single(EncodedValue::Double(3.5)),
        });
        roundtrip(Message::OqlQueryResponse {
            result: QueryResult::List(EncodedValueList {
                elements: vec![EncodedValue::Int(1), EncodedValue::Null],
            }),
        });
        roundtrip(Message::OqlQueryResponse {
            result: QueryResult::Table(Table {
                columns: vec!["a".to_string()],
                values: vec![EncodedValueList {
                    elements: vec![EncodedValue::Int(1)],
                }],
            }),
        });
    }

    #[test]
    fn test_error_response_roundtrip() {
        roundtrip(Message::ErrorResponse {
            error: ErrorDetail {
                code: 401,
                message: "not authorized".to_string(),
            },
        });
    }

    #[test]
    fn test_function_requests_roundtrip() {
        roundtrip(Message::ExecuteFunctionOnMemberRequest {
            function_id: "reindex".to_string(),
            members: vec!["node-a".to_string(), "node-b".to_string()],
            arguments: EncodedValue::Null,
        });
        roundtrip(Message::ExecuteFunctionOnGroupRequest {
            function_id: "compact".to_string(),
            groups: vec!["rack-1".to_string()],
            arguments: EncodedValue::Json(r#"{"level":2}"#.to_string()),
        });
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let payload = Bytes::from_static(&[0x6E]);
        assert!(matches!(
            Message::decode(payload),
            Err(ProtocolError::InvalidMessageKind(0x6E))
        ));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut payload = Message::PutResponse.encode().to_vec();
        payload.push(0x00);
        assert!(matches!(
            Message::decode(Bytes::from(payload)),
            Err(ProtocolError::TrailingBytes(1))
        ));
    }

    #[test]
    fn test_handshake_message_roundtrip() {
        roundtrip(Message::HandshakeRequest(HandshakeRequest::default()));
        roundtrip(Message::HandshakeResponse(HandshakeResponse {
            accepted: false,
            server_major: 2,
            server_minor: 0,
        }));
    }
}
