//! Transport trait alias.

use tokio::io::{AsyncRead, AsyncWrite};

/// A bidirectional byte stream a connection can run over.
///
/// Blanket-implemented for every async stream type, so a `TcpStream`, a
/// TLS-wrapped stream or an in-memory test double all qualify.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> Transport for T where T: AsyncRead + AsyncWrite + Unpin + Send {}
