//! Errors raised while decoding management payloads.

use thiserror::Error;

use crate::{ndn::PacketError, tlv::TlvError};

/// Failures decoding ControlParameters, ControlResponse or a FaceQueryFilter.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ControlError {
    /// The TLV structure is malformed.
    #[error(transparent)]
    Tlv(#[from] TlvError),
    /// An embedded Name is malformed.
    #[error(transparent)]
    Packet(#[from] PacketError),
    /// A string field is not valid UTF-8.
    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(&'static str),
}
