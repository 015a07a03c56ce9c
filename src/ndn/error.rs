//! Errors raised while decoding or encoding network-layer packets.

use thiserror::Error;

use crate::tlv::TlvError;

/// Network-layer packet failures.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PacketError {
    /// Underlying TLV structure is malformed.
    #[error(transparent)]
    Tlv(#[from] TlvError),
    /// The element was not the expected packet type.
    #[error("expected TLV-TYPE {expected}, found {found}")]
    UnexpectedType {
        /// Type the caller asked for.
        expected: u32,
        /// Type found on the wire.
        found: u32,
    },
    /// A mandatory field was absent.
    #[error("packet is missing {0}")]
    MissingField(&'static str),
    /// A field had an invalid value.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable detail.
        reason: String,
    },
    /// A name or component string could not be parsed.
    #[error("invalid NDN URI: {0}")]
    InvalidUri(String),
}
