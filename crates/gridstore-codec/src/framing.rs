//! Frame write and read over an async transport.

use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use gridstore_protocol::varint::{encode_varint, peek_varint};

use crate::error::CodecError;

/// Maximum accepted frame payload size.
///
/// A peer declaring more than this is treated as a fatal protocol
/// violation rather than an allocation request.
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Size of the initial bounded read when receiving a frame.
const INITIAL_READ_SIZE: usize = 4096;

/// Write one frame: varint length prefix plus payload, as a single buffer
/// in one write call.
pub async fn write_frame<S>(stream: &mut S, payload: &[u8]) -> Result<(), CodecError>
where
    S: AsyncWrite + Unpin,
{
    let mut buf = BytesMut::with_capacity(payload.len() + 10);
    encode_varint(payload.len() as u64, &mut buf);
    buf.extend_from_slice(payload);

    stream.write_all(&buf).await.map_err(CodecError::Write)?;
    stream.flush().await.map_err(CodecError::Write)?;

    tracing::trace!(len = payload.len(), "frame written");
    Ok(())
}

/// Read one frame, returning its payload.
///
/// Performs a bounded initial read, decodes the length prefix from the
/// bytes received so far, grows the buffer to the declared size and loops
/// until the full payload has accumulated. End-of-stream at any point
/// before the frame completes surfaces as a read error of kind
/// [`std::io::ErrorKind::UnexpectedEof`].
pub async fn read_frame<S>(stream: &mut S) -> Result<Bytes, CodecError>
where
    S: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(INITIAL_READ_SIZE);

    // Accumulate until the length prefix is decodable.
    let (payload_len, prefix_len) = loop {
        match peek_varint(buf.as_ref())? {
            Some((declared, prefix_len)) => {
                let payload_len = usize::try_from(declared)
                    .map_err(|_| CodecError::FrameTooLarge {
                        size: usize::MAX,
                        max: MAX_FRAME_SIZE,
                    })?;
                if payload_len > MAX_FRAME_SIZE {
                    return Err(CodecError::FrameTooLarge {
                        size: payload_len,
                        max: MAX_FRAME_SIZE,
                    });
                }
                break (payload_len, prefix_len);
            }
            None => fill(stream, &mut buf).await?,
        }
    };

    let total = prefix_len + payload_len;
    if total > buf.capacity() {
        buf.reserve(total - buf.len());
    }
    while buf.len() < total {
        fill(stream, &mut buf).await?;
    }

    buf.advance(prefix_len);
    let payload = buf.split_to(payload_len).freeze();
    tracing::trace!(len = payload.len(), "frame read");
    Ok(payload)
}

/// One read into `buf`'s spare capacity; zero bytes means the peer closed
/// the stream mid-frame.
async fn fill<S>(stream: &mut S, buf: &mut BytesMut) -> Result<(), CodecError>
where
    S: AsyncRead + Unpin,
{
    let n = stream.read_buf(buf).await.map_err(CodecError::Read)?;
    if n == 0 {
        return Err(CodecError::Read(std::io::Error::from(
            std::io::ErrorKind::UnexpectedEof,
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use tokio::io::ReadBuf;

    use super::*;

    /// Serves queued chunks one per poll; end of queue is a clean EOF.
    struct ChunkedReader {
        chunks: VecDeque<Vec<u8>>,
    }

    impl ChunkedReader {
        fn new(chunks: Vec<Vec<u8>>) -> Self {
            Self {
                chunks: chunks.into(),
            }
        }
    }

    impl AsyncRead for ChunkedReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            if let Some(mut chunk) = self.chunks.pop_front() {
                let n = chunk.len().min(buf.remaining());
                buf.put_slice(&chunk[..n]);
                if n < chunk.len() {
                    self.chunks.push_front(chunk.split_off(n));
                }
            }
            Poll::Ready(Ok(()))
        }
    }

    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_varint(payload.len() as u64, &mut buf);
        buf.extend_from_slice(payload);
        buf.to_vec()
    }

    #[tokio::test]
    async fn test_write_frame_prefixes_length() {
        let mut out = Vec::new();
        write_frame(&mut out, b"hello").await.expect("write");
        assert_eq!(out, frame(b"hello"));
    }

    #[tokio::test]
    async fn test_read_frame_single_chunk() {
        let data = frame(b"response");
        let mut stream = &data[..];
        let payload = read_frame(&mut stream).await.expect("read");
        assert_eq!(payload.as_ref(), b"response");
    }

    #[tokio::test]
    async fn test_read_frame_fragmented() {
        let data = frame(&vec![0x5A; 10_000]);
        // Split into awkward fragments, including one that cuts the prefix
        let chunks = vec![
            data[..1].to_vec(),
            data[1..5].to_vec(),
            data[5..4096].to_vec(),
            data[4096..].to_vec(),
        ];
        let mut stream = ChunkedReader::new(chunks);
        let payload = read_frame(&mut stream).await.expect("read");
        assert_eq!(payload.len(), 10_000);
        assert!(payload.iter().all(|&b| b == 0x5A));
    }

    #[tokio::test]
    async fn test_read_frame_immediate_eof_is_retryable() {
        let mut stream: &[u8] = &[];
        let err = read_frame(&mut stream).await.expect_err("eof");
        assert!(matches!(&err, CodecError::Read(e) if e.kind() == std::io::ErrorKind::UnexpectedEof));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_read_frame_truncated_payload() {
        let data = frame(b"full payload");
        let mut stream = &data[..data.len() - 3];
        let err = read_frame(&mut stream).await.expect_err("truncated");
        assert!(matches!(&err, CodecError::Read(e) if e.kind() == std::io::ErrorKind::UnexpectedEof));
    }

    #[tokio::test]
    async fn test_read_frame_rejects_oversize_declaration() {
        let mut data = BytesMut::new();
        encode_varint((MAX_FRAME_SIZE + 1) as u64, &mut data);
        let owned = data.to_vec();
        let mut stream = &owned[..];
        let err = read_frame(&mut stream).await.expect_err("oversize");
        assert!(matches!(err, CodecError::FrameTooLarge { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_write_then_read_roundtrip() {
        let mut wire = Vec::new();
        write_frame(&mut wire, b"ping").await.expect("write");
        let mut stream = &wire[..];
        let payload = read_frame(&mut stream).await.expect("read");
        assert_eq!(payload.as_ref(), b"ping");
    }
}
