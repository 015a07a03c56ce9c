//! Error types emitted by the link layer.

use thiserror::Error;

use crate::tlv::TlvError;

/// Failures decoding or encoding an `LpPacket`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    /// The frame is not valid TLV.
    #[error(transparent)]
    Tlv(#[from] TlvError),
    /// The outer element is neither an `LpPacket` nor a bare network packet.
    #[error("unexpected link-layer TLV-TYPE {0}")]
    UnexpectedType(u32),
    /// A header field outside the ignorable range was not recognised.
    #[error("unrecognised non-ignorable LpPacket field {0}")]
    UnknownField(u32),
    /// The frame carries no fragment (an IDLE packet or an empty payload).
    #[error("LpPacket has no fragment")]
    EmptyFragment,
    /// FragIndex is not below FragCount.
    #[error("fragment index {index} out of range for count {count}")]
    InvalidFragmentation {
        /// Declared FragIndex.
        index: u64,
        /// Declared FragCount.
        count: u64,
    },
    /// A fragmented frame is missing its Sequence field.
    #[error("fragmented LpPacket has no Sequence")]
    MissingSequence,
}

/// Failures raised while collecting fragments of one network packet.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ReassemblyError {
    /// FragCount exceeds the configured ceiling.
    #[error("fragment count {count} exceeds limit {limit}")]
    TooManyFragments {
        /// Declared FragCount.
        count: u64,
        /// Configured maximum.
        limit: u64,
    },
    /// FragIndex is not below FragCount.
    #[error("fragment index {index} out of range for count {count}")]
    IndexOutOfRange {
        /// Declared FragIndex.
        index: u64,
        /// Declared FragCount.
        count: u64,
    },
    /// A fragment disagreed with the FragCount of its sequence.
    #[error("fragment count mismatch for base sequence {base_sequence}: expected {expected}, found {found}")]
    CountMismatch {
        /// Base sequence of the partial packet.
        base_sequence: u64,
        /// FragCount recorded from the first fragment.
        expected: u64,
        /// FragCount carried by the rejected fragment.
        found: u64,
    },
    /// The reassembled packet would exceed the packet ceiling.
    #[error("reassembled packet for base sequence {base_sequence} would be {attempted} bytes (limit {limit})")]
    PacketTooLarge {
        /// Base sequence of the partial packet.
        base_sequence: u64,
        /// Size the packet would have reached.
        attempted: usize,
        /// Configured maximum packet size.
        limit: usize,
    },
}
