//! Reassembly of TLV records from a byte stream.
//!
//! The forwarder socket carries back-to-back TLV elements with no extra
//! framing, so record boundaries come from the TLV header itself.
//! [`TlvFrameCodec`] is a `tokio_util` codec that yields one complete element
//! per item, whatever the read boundaries were.
//!
//! # Error Handling
//!
//! Framing problems never surface as decoder errors. A structurally invalid
//! header discards everything buffered so far; an element larger than the
//! packet ceiling is skipped byte-for-byte, including bytes that have not yet
//! been read, and decoding resumes on the following element. A declared
//! length beyond [`MAX_PACKET_SIZE`] is treated as an invalid header. Every
//! case is logged and counted. See the [`error`] module for the taxonomy.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::tlv::decode_type_length;

pub mod error;

pub use error::{CodecError, EofError, FramingError};

/// Smallest accepted packet ceiling.
pub const MIN_PACKET_SIZE: usize = 64;

/// Largest accepted packet ceiling.
pub const MAX_PACKET_SIZE: usize = 65_535;

/// Default packet ceiling used by NFD-compatible forwarders.
pub const DEFAULT_MAX_PACKET_SIZE: usize = 8800;

pub(crate) fn clamp_packet_size(value: usize) -> usize {
    value.clamp(MIN_PACKET_SIZE, MAX_PACKET_SIZE)
}

/// Frame codec for concatenated NDN TLV elements.
///
/// Decoding yields the complete wire encoding of each top-level element.
/// Encoding writes pre-encoded elements verbatim after checking the packet
/// ceiling.
#[derive(Clone, Debug)]
pub struct TlvFrameCodec {
    max_packet_size: usize,
    /// Bytes of an oversized element still to be discarded.
    skip_remaining: usize,
}

impl TlvFrameCodec {
    /// Construct a codec with the given packet ceiling.
    #[must_use]
    pub fn new(max_packet_size: usize) -> Self {
        Self {
            max_packet_size: clamp_packet_size(max_packet_size),
            skip_remaining: 0,
        }
    }

    /// Return the packet ceiling enforced by this codec.
    #[must_use]
    pub fn max_packet_size(&self) -> usize { self.max_packet_size }

    /// Whether the codec is part-way through discarding an oversized element.
    #[must_use]
    pub fn is_skipping(&self) -> bool { self.skip_remaining > 0 }

    fn discard_skipped(&mut self, src: &mut BytesMut) {
        let n = self.skip_remaining.min(src.len());
        src.advance(n);
        self.skip_remaining -= n;
    }

    fn report(err: &FramingError) {
        crate::metrics::inc_dropped(match err {
            FramingError::InvalidHeader(_) => "invalid_header",
            FramingError::OversizedRecord { .. } => "oversized",
        });
        tracing::warn!(error = %err, "discarding undecodable input");
    }
}

impl Default for TlvFrameCodec {
    fn default() -> Self { Self::new(DEFAULT_MAX_PACKET_SIZE) }
}

impl Decoder for TlvFrameCodec {
    type Item = Bytes;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if self.is_skipping() {
                self.discard_skipped(src);
                if self.is_skipping() {
                    return Ok(None);
                }
            }
            if src.is_empty() {
                return Ok(None);
            }

            let header = match decode_type_length(src) {
                Ok(header) => header,
                Err(err) if err.is_truncated() => return Ok(None),
                Err(err) => {
                    Self::report(&FramingError::InvalidHeader(err));
                    src.clear();
                    return Ok(None);
                }
            };

            let total = header.total_len();
            if total > self.max_packet_size {
                Self::report(&FramingError::OversizedRecord {
                    size: total,
                    max: self.max_packet_size,
                });
                if total > MAX_PACKET_SIZE {
                    // No link carries a record this large; the length is garbage.
                    src.clear();
                    return Ok(None);
                }
                self.skip_remaining = total;
                continue;
            }
            if src.len() < total {
                src.reserve(total - src.len());
                return Ok(None);
            }
            return Ok(Some(src.split_to(total).freeze()));
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if self.is_skipping() {
            // The oversized element was already reported; nothing else is pending.
            src.clear();
            self.skip_remaining = 0;
            return Ok(None);
        }
        if src.is_empty() {
            return Ok(None);
        }
        Err(build_eof_error(src))
    }
}

/// Describe why the stream ended inside an element.
fn build_eof_error(src: &BytesMut) -> CodecError {
    let bytes_received = src.len();
    match decode_type_length(src) {
        Ok(header) => CodecError::Eof(EofError::MidRecord {
            bytes_received,
            expected: header.total_len(),
        }),
        Err(_) => CodecError::Eof(EofError::MidHeader { bytes_received }),
    }
}

impl Encoder<Bytes> for TlvFrameCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.len() > self.max_packet_size {
            return Err(CodecError::Framing(FramingError::OversizedRecord {
                size: item.len(),
                max: self.max_packet_size,
            }));
        }
        dst.reserve(item.len());
        dst.put_slice(&item);
        Ok(())
    }
}
