//! Pool error types.

use gridstore_protocol::MessageKind;
use thiserror::Error;

/// Errors that can occur while acquiring or managing pooled connections.
#[derive(Debug, Error)]
pub enum PoolError {
    /// No idle connection exists and no provider could create one.
    #[error("no connections available")]
    ConnectionUnavailable,

    /// Credentials were rejected during per-acquisition authentication.
    ///
    /// Never retried: a different connection will not fix bad credentials.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The server rejected the declared protocol version.
    #[error("handshake rejected: server speaks protocol {server_major}.{server_minor}")]
    HandshakeRejected {
        /// Server major protocol version.
        server_major: u32,
        /// Server minor protocol version.
        server_minor: u32,
    },

    /// Transport failure during handshake or authentication.
    #[error("connection setup failed: {0}")]
    Setup(#[from] gridstore_codec::CodecError),

    /// Malformed message during handshake or authentication.
    #[error("protocol error during connection setup: {0}")]
    Protocol(#[from] gridstore_protocol::ProtocolError),

    /// The server answered a setup message with an error envelope.
    #[error("server refused connection setup: {0}")]
    SetupRefused(gridstore_protocol::ErrorDetail),

    /// The server answered a setup message with an unrelated message kind.
    #[error("unexpected {0:?} during connection setup")]
    UnexpectedSetupResponse(MessageKind),

    /// Locator-based discovery is an unimplemented extension point.
    #[error("locators are not supported; use add_server or a custom provider")]
    LocatorsUnsupported,
}
