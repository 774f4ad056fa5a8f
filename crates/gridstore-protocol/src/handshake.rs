//! Connection setup envelopes.
//!
//! The handshake is the first exchange on every new connection: the client
//! declares the protocol version it speaks and the server either accepts or
//! rejects it, reporting its own version. When the pool has credentials
//! configured, an authentication exchange follows before the connection
//! carries any data operation.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::ProtocolError;
use crate::wire;

/// Protocol major version sent in the handshake.
pub const PROTOCOL_MAJOR_VERSION: u32 = 1;
/// Protocol minor version sent in the handshake.
pub const PROTOCOL_MINOR_VERSION: u32 = 1;

/// Client-to-server version declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeRequest {
    /// Major protocol version.
    pub major_version: u32,
    /// Minor protocol version.
    pub minor_version: u32,
}

impl Default for HandshakeRequest {
    fn default() -> Self {
        Self {
            major_version: PROTOCOL_MAJOR_VERSION,
            minor_version: PROTOCOL_MINOR_VERSION,
        }
    }
}

impl HandshakeRequest {
    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.major_version);
        buf.put_u32(self.minor_version);
    }

    pub(crate) fn decode(buf: &mut Bytes) -> Result<Self, ProtocolError> {
        Ok(Self {
            major_version: wire::get_u32(buf)?,
            minor_version: wire::get_u32(buf)?,
        })
    }
}

/// Server verdict on the declared protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeResponse {
    /// Whether the server accepted the client's version.
    pub accepted: bool,
    /// Server major protocol version.
    pub server_major: u32,
    /// Server minor protocol version.
    pub server_minor: u32,
}

impl HandshakeResponse {
    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        wire::put_bool(buf, self.accepted);
        buf.put_u32(self.server_major);
        buf.put_u32(self.server_minor);
    }

    pub(crate) fn decode(buf: &mut Bytes) -> Result<Self, ProtocolError> {
        Ok(Self {
            accepted: wire::get_bool(buf)?,
            server_major: wire::get_u32(buf)?,
            server_minor: wire::get_u32(buf)?,
        })
    }
}

/// Credential presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationRequest {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}

impl AuthenticationRequest {
    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        wire::put_string(buf, &self.username);
        wire::put_string(buf, &self.password);
    }

    pub(crate) fn decode(buf: &mut Bytes) -> Result<Self, ProtocolError> {
        Ok(Self {
            username: wire::get_string(buf)?,
            password: wire::get_string(buf)?,
        })
    }
}

/// Server verdict on presented credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticationResponse {
    /// Whether the credentials were accepted.
    pub authenticated: bool,
}

impl AuthenticationResponse {
    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        wire::put_bool(buf, self.authenticated);
    }

    pub(crate) fn decode(buf: &mut Bytes) -> Result<Self, ProtocolError> {
        Ok(Self {
            authenticated: wire::get_bool(buf)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_request_defaults_to_supported_version() {
        let request = HandshakeRequest::default();
        assert_eq!(request.major_version, PROTOCOL_MAJOR_VERSION);
        assert_eq!(request.minor_version, PROTOCOL_MINOR_VERSION);
    }

    #[test]
    fn test_handshake_response_roundtrip() {
        let response = HandshakeResponse {
            accepted: true,
            server_major: 1,
            server_minor: 3,
        };
        let mut buf = BytesMut::new();
        response.encode(&mut buf);
        let mut bytes = buf.freeze();
        #[allow(clippy::unwrap_used)]
        let decoded = HandshakeResponse::decode(&mut bytes).unwrap();
        assert_eq!(decoded, response);
    }
}
