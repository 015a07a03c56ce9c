//! Error type for TLV decoding.

use thiserror::Error;

/// Failures raised while parsing NDN TLV structures.
///
/// `Truncated` is special: the frame reassembler treats it as "wait for more
/// bytes" rather than as corruption.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TlvError {
    /// The input ended before the element was complete.
    #[error("truncated TLV: need {needed} bytes, have {available}")]
    Truncated {
        /// Bytes required to finish the element.
        needed: usize,
        /// Bytes available in the input.
        available: usize,
    },
    /// TLV-TYPE zero or beyond the 32-bit range.
    #[error("invalid TLV-TYPE {0}")]
    InvalidType(u64),
    /// TLV-LENGTH does not fit in memory on this platform.
    #[error("TLV-LENGTH {0} cannot be represented")]
    LengthOverflow(u64),
    /// A NonNegativeInteger had a length other than 1, 2, 4 or 8.
    #[error("invalid NonNegativeInteger length {0}")]
    InvalidNonNegativeInteger(usize),
    /// The outer element had an unexpected type.
    #[error("unexpected TLV-TYPE: expected {expected}, found {found}")]
    UnexpectedType {
        /// Type the caller asked for.
        expected: u32,
        /// Type found on the wire.
        found: u32,
    },
    /// A required sub-element was absent.
    #[error("missing required element {0}")]
    MissingElement(&'static str),
    /// An unrecognised critical element was present.
    #[error("unrecognised critical element {0}")]
    UnknownCritical(u32),
    /// Bytes follow an element that should have ended the input.
    #[error("{0} trailing bytes after element")]
    TrailingBytes(usize),
}

impl TlvError {
    /// Whether more input could turn this failure into a successful decode.
    #[must_use]
    pub fn is_truncated(&self) -> bool { matches!(self, Self::Truncated { .. }) }
}
