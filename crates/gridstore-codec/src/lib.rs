//! # gridstore-codec
//!
//! Async frame layer for the GridStore wire protocol.
//!
//! A frame is a varint byte count followed by exactly that many payload
//! bytes. This crate writes a frame as one buffer in a single call and
//! reads one by performing a bounded initial read, decoding the length
//! prefix, growing the receive buffer to the declared size and looping
//! until the full payload has accumulated, so fragmented reads from the
//! transport are handled transparently.
//!
//! Errors carry the transport phase they occurred in ([`CodecError::Write`]
//! vs [`CodecError::Read`]) because the exchange engine's retry policy
//! classifies the two phases differently.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod framing;
pub mod transport;

pub use error::CodecError;
pub use framing::{MAX_FRAME_SIZE, read_frame, write_frame};
pub use transport::Transport;
