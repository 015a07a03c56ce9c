//! NDN network-layer packets.
//!
//! The bridge only needs enough of the packet format to read command
//! Interests and to produce signed Data replies, so decoding here is
//! deliberately narrow.

mod component;
mod data;
mod error;
mod interest;
mod name;

pub use component::Component;
pub use data::{CONTENT_TYPE_BLOB, Data, SIGNATURE_DIGEST_SHA256};
pub use error::PacketError;
pub use interest::{DEFAULT_INTEREST_LIFETIME, Interest};
pub use name::Name;

use crate::tlv::{Block, types};

/// A classified network-layer packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NetPacket {
    /// An Interest.
    Interest(Interest),
    /// A Data packet.
    Data(Data),
}

impl NetPacket {
    /// Classify and decode a network-layer element.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError::UnexpectedType`] for anything other than an
    /// Interest or Data, or the decode error of the matching packet type.
    pub fn decode(block: &Block) -> Result<Self, PacketError> {
        match block.typ() {
            types::INTEREST => Interest::decode(block).map(Self::Interest),
            types::DATA => Data::decode(block).map(Self::Data),
            found => Err(PacketError::UnexpectedType {
                expected: types::INTEREST,
                found,
            }),
        }
    }

    /// Packet name.
    #[must_use]
    pub fn name(&self) -> &Name {
        match self {
            Self::Interest(interest) => interest.name(),
            Self::Data(data) => data.name(),
        }
    }
}
