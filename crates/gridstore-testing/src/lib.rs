//! # gridstore-testing
//!
//! Test infrastructure for GridStore driver development.
//!
//! [`ScriptedTransport`] is an in-memory transport serving pre-queued
//! response frames and recording everything written to it; running off the
//! end of the script reads as a clean end-of-stream, which is exactly how
//! a server-side idle-timeout close presents. [`ScriptedProvider`] hands
//! out pre-built connections until its queue empties, then signals
//! exhaustion. Together they drive the pool and the exchange engine
//! through success, failure and retry paths without a live server.

#![warn(missing_docs)]
#![deny(unsafe_code)]

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::BytesMut;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use gridstore_pool::{Connection, ConnectionProvider};
use gridstore_protocol::Message;
use gridstore_protocol::varint::encode_varint;

/// Frame a message the way a server would put it on the wire.
#[must_use]
pub fn frame_message(message: &Message) -> Vec<u8> {
    let payload = message.encode();
    let mut buf = BytesMut::with_capacity(payload.len() + 10);
    encode_varint(payload.len() as u64, &mut buf);
    buf.extend_from_slice(&payload);
    buf.to_vec()
}

/// Shared handle to the bytes a [`ScriptedTransport`] has received.
pub type WriteLog = Arc<Mutex<Vec<u8>>>;

/// In-memory transport with scripted reads and recorded writes.
///
/// Reads serve the queued chunks in order, one chunk per read call, so a
/// response split across several chunks exercises partial-read handling.
/// When the script is exhausted further reads yield end-of-stream. Writes
/// always succeed and append to the write log.
pub struct ScriptedTransport {
    reads: VecDeque<Vec<u8>>,
    written: WriteLog,
}

impl ScriptedTransport {
    /// A transport with an empty script: every read is end-of-stream.
    ///
    /// This is the shape of a connection the server has already closed:
    /// writes still appear to succeed, the failure only shows on read.
    #[must_use]
    pub fn closed_by_server() -> Self {
        Self {
            reads: VecDeque::new(),
            written: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A transport scripted to answer with the given messages, one framed
    /// response per read.
    #[must_use]
    pub fn replying(responses: &[Message]) -> Self {
        let mut transport = Self::closed_by_server();
        for response in responses {
            transport.reads.push_back(frame_message(response));
        }
        transport
    }

    /// Queue one raw chunk, bypassing framing.
    #[must_use]
    pub fn with_chunk(mut self, chunk: &[u8]) -> Self {
        self.reads.push_back(chunk.to_vec());
        self
    }

    /// Handle to everything written to this transport.
    #[must_use]
    pub fn write_log(&self) -> WriteLog {
        self.written.clone()
    }
}

impl AsyncRead for ScriptedTransport {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        if let Some(mut chunk) = self.reads.pop_front() {
            let n = chunk.len().min(buf.remaining());
            buf.put_slice(&chunk[..n]);
            if n < chunk.len() {
                self.reads.push_front(chunk.split_off(n));
            }
        }
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for ScriptedTransport {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        self.written.lock().extend_from_slice(data);
        Poll::Ready(Ok(data.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Provider handing out pre-built connections until its queue empties.
pub struct ScriptedProvider {
    name: String,
    queue: Mutex<VecDeque<Connection>>,
}

impl ScriptedProvider {
    /// A provider that will yield the given connections in order, then
    /// signal exhaustion.
    #[must_use]
    pub fn new(name: impl Into<String>, connections: Vec<Connection>) -> Self {
        Self {
            name: name.into(),
            queue: Mutex::new(connections.into()),
        }
    }

    /// A provider that is exhausted from the start.
    #[must_use]
    pub fn exhausted(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    /// Wrap scripted transports into ready connections (handshake already
    /// done) and queue them.
    #[must_use]
    pub fn with_transports(name: impl Into<String>, transports: Vec<ScriptedTransport>) -> Self {
        let connections = transports
            .into_iter()
            .map(|transport| Connection::new(Box::new(transport), true))
            .collect();
        Self::new(name, connections)
    }
}

#[async_trait]
impl ConnectionProvider for ScriptedProvider {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn connect(&self) -> Option<Connection> {
        self.queue.lock().pop_front()
    }
}
