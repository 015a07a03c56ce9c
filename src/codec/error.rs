//! Error types for the frame layer.
//!
//! - [`FramingError`]: the front of the receive buffer does not hold a usable TLV header, or the
//!   record it announces is too large.
//! - [`EofError`]: the stream ended inside a record.
//! - [`CodecError`]: top-level enum wrapping both plus I/O errors.
//!
//! Framing errors are recoverable: the decoder resynchronises on its own and
//! reports them only through logs and metrics. Everything else ends the
//! stream.

use std::io;

use thiserror::Error;

use crate::tlv::TlvError;

/// Failures detected while locating record boundaries.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// The TLV header at the front of the buffer is structurally invalid.
    #[error("invalid TLV header: {0}")]
    InvalidHeader(#[source] TlvError),

    /// The record announced by the header exceeds the packet ceiling.
    #[error("record exceeds max packet size: {size} > {max}")]
    OversizedRecord {
        /// Declared total size including the header.
        size: usize,
        /// Configured maximum packet size.
        max: usize,
    },
}

/// Premature end-of-stream conditions.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum EofError {
    /// The peer closed the stream inside a record body.
    #[error("premature EOF: {bytes_received} bytes of {expected} byte record received")]
    MidRecord {
        /// Bytes of the record received before EOF.
        bytes_received: usize,
        /// Declared record size.
        expected: usize,
    },

    /// The peer closed the stream inside a TLV header.
    #[error("premature EOF inside TLV header after {bytes_received} bytes")]
    MidHeader {
        /// Header bytes received before EOF.
        bytes_received: usize,
    },
}

/// Top-level frame codec error.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Record boundary could not be determined.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// Transport I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// End-of-stream handling.
    #[error("EOF: {0}")]
    Eof(#[from] EofError),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
