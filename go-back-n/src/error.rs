//! Error types shared by every layer of the crate.
//!
//! Per-event problems (duplicate acks, out-of-order packets, a retransmit
//! timeout, a frame that fails to encode or decode) are *not* errors: they
//! are reported through [`crate::event`] and handled locally.  Only setup
//! and storage failures surface as [`GbnError`].

use thiserror::Error;

/// Errors that can arise when encoding or decoding a wire frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketError {
    /// Frame shorter than the trailing sequence-number field.
    #[error("frame of {len} bytes is shorter than the {width}-byte sequence field")]
    TooShort { len: usize, width: usize },
    /// Sequence number does not fit in the configured field width.
    #[error("sequence number {seq} does not fit in {width} byte(s)")]
    SequenceOverflow { seq: u64, width: usize },
}

/// The peer end of a conduit has been dropped.
///
/// Readers treat this as end-of-stream; writers stop using the conduit.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("conduit closed by peer")]
pub struct ConduitClosed;

/// Fatal errors for a sender or receiver endpoint.
#[derive(Debug, Error)]
pub enum GbnError {
    /// Rejected at setup; nothing was transmitted.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The byte source could not be read during priming.
    #[error("failed to read byte source: {0}")]
    SourceRead(#[source] std::io::Error),

    /// The reassembled stream could not be written to the byte sink.
    #[error("failed to write byte sink: {0}")]
    SinkWrite(#[source] std::io::Error),
}

impl GbnError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
