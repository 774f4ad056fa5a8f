//! Codec error types.

use thiserror::Error;

/// Errors that can occur while framing messages over a transport.
#[derive(Debug, Error)]
pub enum CodecError {
    /// IO error during the write phase of an exchange.
    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),

    /// IO error during the read phase of an exchange.
    #[error("read failed: {0}")]
    Read(#[source] std::io::Error),

    /// Frame length prefix or payload is malformed.
    #[error("protocol error: {0}")]
    Protocol(#[from] gridstore_protocol::ProtocolError),

    /// Declared frame length exceeds the maximum allowed.
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge {
        /// Declared frame size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },
}

impl CodecError {
    /// Whether this failure warrants a whole-operation retry on a fresh
    /// connection.
    ///
    /// A write-phase socket failure means the peer went away under us; an
    /// end-of-stream while reading is the expected symptom of a server that
    /// closed the connection (idle timeout) after the write appeared to
    /// succeed. Both are transient. Every other failure is fatal.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Write(_) => true,
            Self::Read(err) => err.kind() == std::io::ErrorKind::UnexpectedEof,
            Self::Protocol(_) | Self::FrameTooLarge { .. } => false,
        }
    }
}
