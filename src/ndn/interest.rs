//! Interest packets.

use std::time::Duration;

use bytes::Bytes;

use super::{Name, PacketError};
use crate::tlv::{Block, TlvWriter, types};

/// Interest lifetime assumed when the field is absent.
pub const DEFAULT_INTEREST_LIFETIME: Duration = Duration::from_secs(4);

/// A decoded Interest.
///
/// Only the fields the management plane looks at are kept; signed-Interest
/// fields are accepted but not verified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interest {
    name: Name,
    can_be_prefix: bool,
    must_be_fresh: bool,
    nonce: Option<u32>,
    lifetime: Option<Duration>,
    hop_limit: Option<u8>,
    application_parameters: Option<Bytes>,
}

impl Interest {
    /// Create an Interest for `name` with every optional field unset.
    #[must_use]
    pub fn new(name: Name) -> Self {
        Self {
            name,
            can_be_prefix: false,
            must_be_fresh: false,
            nonce: None,
            lifetime: None,
            hop_limit: None,
            application_parameters: None,
        }
    }

    /// Set the CanBePrefix flag.
    #[must_use]
    pub fn with_can_be_prefix(mut self, can_be_prefix: bool) -> Self {
        self.can_be_prefix = can_be_prefix;
        self
    }

    /// Set the MustBeFresh flag.
    #[must_use]
    pub fn with_must_be_fresh(mut self, must_be_fresh: bool) -> Self {
        self.must_be_fresh = must_be_fresh;
        self
    }

    /// Set the Nonce.
    #[must_use]
    pub fn with_nonce(mut self, nonce: u32) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Set the InterestLifetime.
    #[must_use]
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = Some(lifetime);
        self
    }

    /// Interest name.
    #[must_use]
    pub fn name(&self) -> &Name { &self.name }

    /// CanBePrefix flag.
    #[must_use]
    pub fn can_be_prefix(&self) -> bool { self.can_be_prefix }

    /// MustBeFresh flag.
    #[must_use]
    pub fn must_be_fresh(&self) -> bool { self.must_be_fresh }

    /// Nonce, when present.
    #[must_use]
    pub fn nonce(&self) -> Option<u32> { self.nonce }

    /// Effective lifetime.
    #[must_use]
    pub fn lifetime(&self) -> Duration { self.lifetime.unwrap_or(DEFAULT_INTEREST_LIFETIME) }

    /// HopLimit, when present.
    #[must_use]
    pub fn hop_limit(&self) -> Option<u8> { self.hop_limit }

    /// ApplicationParameters, when present.
    #[must_use]
    pub fn application_parameters(&self) -> Option<&Bytes> { self.application_parameters.as_ref() }

    /// Decode an Interest element.
    ///
    /// # Errors
    ///
    /// Returns a [`PacketError`] when the element is not an Interest, the Name
    /// is missing, or a field is malformed.
    pub fn decode(block: &Block) -> Result<Self, PacketError> {
        if block.typ() != types::INTEREST {
            return Err(PacketError::UnexpectedType {
                expected: types::INTEREST,
                found: block.typ(),
            });
        }
        let mut children = block.children()?.into_iter();
        let name = match children.next() {
            Some(first) if first.typ() == types::NAME => Name::from_block(&first)?,
            _ => return Err(PacketError::MissingField("Name")),
        };
        let mut interest = Self::new(name);
        for child in children {
            match child.typ() {
                types::CAN_BE_PREFIX => interest.can_be_prefix = true,
                types::MUST_BE_FRESH => interest.must_be_fresh = true,
                types::NONCE => {
                    let bytes: [u8; 4] = child.value().as_ref().try_into().map_err(|_| {
                        PacketError::InvalidField {
                            field: "Nonce",
                            reason: format!("length {} is not 4", child.value().len()),
                        }
                    })?;
                    interest.nonce = Some(u32::from_be_bytes(bytes));
                }
                types::INTEREST_LIFETIME => {
                    interest.lifetime = Some(Duration::from_millis(child.as_nni()?));
                }
                types::HOP_LIMIT => {
                    let [limit] = child.value().as_ref() else {
                        return Err(PacketError::InvalidField {
                            field: "HopLimit",
                            reason: format!("length {} is not 1", child.value().len()),
                        });
                    };
                    interest.hop_limit = Some(*limit);
                }
                types::APPLICATION_PARAMETERS => {
                    interest.application_parameters = Some(child.value().clone());
                }
                types::FORWARDING_HINT
                | types::INTEREST_SIGNATURE_INFO
                | types::INTEREST_SIGNATURE_VALUE => {}
                other if child.is_critical() => {
                    return Err(PacketError::Tlv(crate::tlv::TlvError::UnknownCritical(other)));
                }
                _ => {}
            }
        }
        Ok(interest)
    }

    /// Encode as an Interest element.
    #[must_use]
    pub fn encode(&self) -> Block {
        let mut writer = TlvWriter::new();
        writer.put_block(&self.name.to_block());
        if self.can_be_prefix {
            writer.put(types::CAN_BE_PREFIX, &[]);
        }
        if self.must_be_fresh {
            writer.put(types::MUST_BE_FRESH, &[]);
        }
        if let Some(nonce) = self.nonce {
            writer.put(types::NONCE, &nonce.to_be_bytes());
        }
        if let Some(lifetime) = self.lifetime {
            let millis = u64::try_from(lifetime.as_millis()).unwrap_or(u64::MAX);
            writer.put_nni(types::INTEREST_LIFETIME, millis);
        }
        if let Some(limit) = self.hop_limit {
            writer.put(types::HOP_LIMIT, &[limit]);
        }
        if let Some(parameters) = &self.application_parameters {
            writer.put(types::APPLICATION_PARAMETERS, parameters);
        }
        writer.into_block(types::INTEREST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_decode_preserves_fields() {
        let name: Name = "/localhost/nfd/faces/events".parse().expect("name");
        let interest = Interest::new(name.clone())
            .with_can_be_prefix(true)
            .with_must_be_fresh(true)
            .with_nonce(0xDEAD_BEEF)
            .with_lifetime(Duration::from_millis(1500));

        let decoded = Interest::decode(&interest.encode()).expect("decode");
        assert_eq!(decoded.name(), &name);
        assert!(decoded.can_be_prefix());
        assert!(decoded.must_be_fresh());
        assert_eq!(decoded.nonce(), Some(0xDEAD_BEEF));
        assert_eq!(decoded.lifetime(), Duration::from_millis(1500));
    }

    #[test]
    fn missing_name_is_rejected() {
        let block = Block::new(types::INTEREST, Bytes::new());
        assert_eq!(Interest::decode(&block), Err(PacketError::MissingField("Name")));
    }

    #[test]
    fn unknown_critical_field_is_rejected() {
        let mut writer = TlvWriter::new();
        writer.put_block(&Name::root().to_block()).put(0x2F, b"x");
        let block = writer.into_block(types::INTEREST);
        assert!(Interest::decode(&block).is_err());
    }

    #[test]
    fn unknown_non_critical_field_is_ignored() {
        let mut writer = TlvWriter::new();
        writer.put_block(&Name::root().to_block()).put(0x30, b"x");
        let block = writer.into_block(types::INTEREST);
        assert!(Interest::decode(&block).is_ok());
    }
}
