//! Client error types.

use gridstore_protocol::{ErrorDetail, MessageKind};
use gridstore_types::ValueError;
use thiserror::Error;

/// Errors surfaced by client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Connection acquisition or management failed.
    #[error(transparent)]
    Pool(#[from] gridstore_pool::PoolError),

    /// Transport failure during an exchange.
    #[error("transport error: {0}")]
    Transport(#[from] gridstore_codec::CodecError),

    /// Malformed message on the wire.
    #[error("protocol error: {0}")]
    Protocol(#[from] gridstore_protocol::ProtocolError),

    /// Value conversion failed.
    #[error(transparent)]
    Value(#[from] ValueError),

    /// The server reported a failure envelope for a well-formed exchange.
    ///
    /// Never retried: the exchange itself succeeded.
    #[error("server error: {0}")]
    Server(ErrorDetail),

    /// A value conversion failed, wrapped with operation context.
    #[error("{context}: {source}")]
    Decode {
        /// What was being decoded.
        context: String,
        /// The underlying conversion failure.
        source: ValueError,
    },

    /// The server answered with a response kind unrelated to the request.
    #[error("unexpected {actual:?} response (expected {expected:?})")]
    UnexpectedResponse {
        /// The response kind the request calls for.
        expected: MessageKind,
        /// The kind actually received.
        actual: MessageKind,
    },

    /// The query returned a different result shape than the caller asked
    /// for.
    #[error("unexpected {actual} query result shape (expected {expected})")]
    UnexpectedQueryShape {
        /// The shape the call expects.
        expected: &'static str,
        /// The shape actually received.
        actual: &'static str,
    },
}

impl Error {
    /// Whether this failure warrants a whole-operation retry on a fresh
    /// connection.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(err) if err.is_retryable())
    }

    /// The server's numeric error code, when the server reported one.
    #[must_use]
    pub fn server_code(&self) -> Option<i32> {
        match self {
            Self::Server(detail) => Some(detail.code),
            _ => None,
        }
    }

    pub(crate) fn unexpected(expected: MessageKind, actual: MessageKind) -> Self {
        Self::UnexpectedResponse { expected, actual }
    }

    pub(crate) fn decode_context(context: impl Into<String>) -> impl FnOnce(ValueError) -> Self {
        let context = context.into();
        move |source| Self::Decode { context, source }
    }
}
