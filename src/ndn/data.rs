//! Data packets signed with `DigestSha256`.

use std::time::Duration;

use bytes::Bytes;
use sha2::{Digest, Sha256};

use super::{Component, Name, PacketError};
use crate::tlv::{Block, TlvWriter, types};

/// SignatureType value for `DigestSha256`.
pub const SIGNATURE_DIGEST_SHA256: u64 = 0;

/// ContentType value for ordinary payloads.
pub const CONTENT_TYPE_BLOB: u64 = 0;

/// A Data packet.
///
/// Responses produced by the bridge are always signed with `DigestSha256`;
/// decoding accepts any signature and keeps only the fields needed to inspect
/// a response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Data {
    name: Name,
    content_type: u64,
    freshness_period: Option<Duration>,
    final_block_id: Option<Component>,
    content: Bytes,
}

impl Data {
    /// Create a Data packet with `content` and no MetaInfo fields.
    #[must_use]
    pub fn new(name: Name, content: impl Into<Bytes>) -> Self {
        Self {
            name,
            content_type: CONTENT_TYPE_BLOB,
            freshness_period: None,
            final_block_id: None,
            content: content.into(),
        }
    }

    /// Set the FreshnessPeriod.
    #[must_use]
    pub fn with_freshness_period(mut self, freshness: Duration) -> Self {
        self.freshness_period = Some(freshness);
        self
    }

    /// Set the FinalBlockId.
    #[must_use]
    pub fn with_final_block_id(mut self, component: Component) -> Self {
        self.final_block_id = Some(component);
        self
    }

    /// Data name.
    #[must_use]
    pub fn name(&self) -> &Name { &self.name }

    /// ContentType.
    #[must_use]
    pub fn content_type(&self) -> u64 { self.content_type }

    /// FreshnessPeriod, when present.
    #[must_use]
    pub fn freshness_period(&self) -> Option<Duration> { self.freshness_period }

    /// FinalBlockId, when present.
    #[must_use]
    pub fn final_block_id(&self) -> Option<&Component> { self.final_block_id.as_ref() }

    /// Payload.
    #[must_use]
    pub fn content(&self) -> &Bytes { &self.content }

    /// Encode and sign with `DigestSha256`.
    ///
    /// The digest covers the Name, MetaInfo, Content and SignatureInfo
    /// elements in wire order.
    #[must_use]
    pub fn encode(&self) -> Block {
        let mut signed = TlvWriter::new();
        signed.put_block(&self.name.to_block());
        signed.put_nested(types::META_INFO, |meta| {
            if self.content_type != CONTENT_TYPE_BLOB {
                meta.put_nni(types::CONTENT_TYPE, self.content_type);
            }
            if let Some(freshness) = self.freshness_period {
                let millis = u64::try_from(freshness.as_millis()).unwrap_or(u64::MAX);
                meta.put_nni(types::FRESHNESS_PERIOD, millis);
            }
            if let Some(final_block) = &self.final_block_id {
                meta.put_nested(types::FINAL_BLOCK_ID, |inner| {
                    inner.put_block(&final_block.to_block());
                });
            }
        });
        signed.put(types::CONTENT, &self.content);
        signed.put_nested(types::SIGNATURE_INFO, |info| {
            info.put_nni(types::SIGNATURE_TYPE, SIGNATURE_DIGEST_SHA256);
        });
        let signed = signed.into_bytes();
        let digest = Sha256::digest(&signed);

        let mut writer = TlvWriter::new();
        writer.put_raw(&signed);
        writer.put(types::SIGNATURE_VALUE, &digest);
        writer.into_block(types::DATA)
    }

    /// Wire encoding of the signed packet.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes { self.encode().to_bytes() }

    /// Decode a Data element.
    ///
    /// # Errors
    ///
    /// Returns a [`PacketError`] when the element is not Data, the Name is
    /// missing, or MetaInfo is malformed.
    pub fn decode(block: &Block) -> Result<Self, PacketError> {
        if block.typ() != types::DATA {
            return Err(PacketError::UnexpectedType {
                expected: types::DATA,
                found: block.typ(),
            });
        }
        let mut children = block.children()?.into_iter();
        let name = match children.next() {
            Some(first) if first.typ() == types::NAME => Name::from_block(&first)?,
            _ => return Err(PacketError::MissingField("Name")),
        };
        let mut data = Self::new(name, Bytes::new());
        for child in children {
            match child.typ() {
                types::META_INFO => data.read_meta_info(&child)?,
                types::CONTENT => data.content = child.value().clone(),
                _ => {}
            }
        }
        Ok(data)
    }

    fn read_meta_info(&mut self, meta: &Block) -> Result<(), PacketError> {
        for field in meta.children()? {
            match field.typ() {
                types::CONTENT_TYPE => self.content_type = field.as_nni()?,
                types::FRESHNESS_PERIOD => {
                    self.freshness_period = Some(Duration::from_millis(field.as_nni()?));
                }
                types::FINAL_BLOCK_ID => {
                    self.final_block_id = field.children()?.first().map(Component::from_block);
                }
                _ => {}
            }
        }
        Ok(())
    }
}
