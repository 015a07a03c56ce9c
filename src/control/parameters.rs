//! ControlParameters: the sparse argument record of management commands.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::ControlError;
use crate::{
    ndn::{Component, Name},
    tlv::{Block, TlvError, TlvWriter, types},
};

/// Arguments of a management command.
///
/// Every field is optional; each verb decides which it requires and which it
/// defaults. The JSON form is what the backend receives.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Name>,
    #[serde(rename = "faceid", skip_serializing_if = "Option::is_none")]
    pub face_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(rename = "localuri", skip_serializing_if = "Option::is_none")]
    pub local_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Name>,
    /// Milliseconds.
    #[serde(rename = "expirationperiod", skip_serializing_if = "Option::is_none")]
    pub expiration_period: Option<u64>,
    #[serde(rename = "facepersistency", skip_serializing_if = "Option::is_none")]
    pub face_persistency: Option<u64>,
    #[serde(
        rename = "basecongestionmarkinginterval",
        skip_serializing_if = "Option::is_none"
    )]
    pub base_congestion_marking_interval: Option<u64>,
    #[serde(
        rename = "defaultcongestionthreshold",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_congestion_threshold: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u64>,
}

pub(crate) fn utf8(field: &'static str, value: &Bytes) -> Result<String, ControlError> {
    String::from_utf8(value.to_vec()).map_err(|_| ControlError::InvalidUtf8(field))
}

impl ControlParameters {
    /// Whether Flags and Mask are either both present or both absent.
    #[must_use]
    pub fn flags_and_mask_paired(&self) -> bool { self.flags.is_some() == self.mask.is_some() }

    /// Decode the ControlParameters carried as a name component value.
    ///
    /// # Errors
    ///
    /// Returns a [`ControlError`] when the component does not hold exactly
    /// one well-formed ControlParameters element.
    pub fn from_component(component: &Component) -> Result<Self, ControlError> {
        let block = Block::decode_exact(component.value(), types::CONTROL_PARAMETERS)?;
        Self::decode(&block)
    }

    /// Encode as a name component, the form used in command Interests.
    #[must_use]
    pub fn to_component(&self) -> Component { Component::generic(self.encode().to_bytes()) }

    /// Decode a ControlParameters element.
    ///
    /// # Errors
    ///
    /// Returns a [`ControlError`] for malformed fields or unrecognised critical
    /// elements.
    pub fn decode(block: &Block) -> Result<Self, ControlError> {
        if block.typ() != types::CONTROL_PARAMETERS {
            return Err(TlvError::UnexpectedType {
                expected: types::CONTROL_PARAMETERS,
                found: block.typ(),
            }
            .into());
        }
        let mut params = Self::default();
        for field in block.children()? {
            match field.typ() {
                types::NAME => params.name = Some(Name::from_block(&field)?),
                types::FACE_ID => params.face_id = Some(field.as_nni()?),
                types::URI => params.uri = Some(utf8("Uri", field.value())?),
                types::LOCAL_URI => params.local_uri = Some(utf8("LocalUri", field.value())?),
                types::ORIGIN => params.origin = Some(field.as_nni()?),
                types::COST => params.cost = Some(field.as_nni()?),
                types::CAPACITY => params.capacity = Some(field.as_nni()?),
                types::COUNT => params.count = Some(field.as_nni()?),
                types::FLAGS => params.flags = Some(field.as_nni()?),
                types::MASK => params.mask = Some(field.as_nni()?),
                types::STRATEGY => {
                    let inner = field
                        .children()?
                        .into_iter()
                        .next()
                        .ok_or(TlvError::MissingElement("Strategy/Name"))?;
                    params.strategy = Some(Name::from_block(&inner)?);
                }
                types::EXPIRATION_PERIOD => params.expiration_period = Some(field.as_nni()?),
                types::FACE_PERSISTENCY => params.face_persistency = Some(field.as_nni()?),
                types::BASE_CONGESTION_MARKING_INTERVAL => {
                    params.base_congestion_marking_interval = Some(field.as_nni()?);
                }
                types::DEFAULT_CONGESTION_THRESHOLD => {
                    params.default_congestion_threshold = Some(field.as_nni()?);
                }
                types::MTU => params.mtu = Some(field.as_nni()?),
                other if field.is_critical() => return Err(TlvError::UnknownCritical(other).into()),
                _ => {}
            }
        }
        Ok(params)
    }

    /// Encode as a ControlParameters element, fields in canonical order.
    #[must_use]
    pub fn encode(&self) -> Block {
        let mut writer = TlvWriter::new();
        if let Some(name) = &self.name {
            writer.put_block(&name.to_block());
        }
        writer.put_opt_nni(types::FACE_ID, self.face_id);
        if let Some(uri) = &self.uri {
            writer.put(types::URI, uri.as_bytes());
        }
        if let Some(local_uri) = &self.local_uri {
            writer.put(types::LOCAL_URI, local_uri.as_bytes());
        }
        writer
            .put_opt_nni(types::ORIGIN, self.origin)
            .put_opt_nni(types::COST, self.cost)
            .put_opt_nni(types::CAPACITY, self.capacity)
            .put_opt_nni(types::COUNT, self.count)
            .put_opt_nni(types::FLAGS, self.flags)
            .put_opt_nni(types::MASK, self.mask);
        if let Some(strategy) = &self.strategy {
            writer.put_nested(types::STRATEGY, |inner| {
                inner.put_block(&strategy.to_block());
            });
        }
        writer
            .put_opt_nni(types::EXPIRATION_PERIOD, self.expiration_period)
            .put_opt_nni(types::FACE_PERSISTENCY, self.face_persistency)
            .put_opt_nni(
                types::BASE_CONGESTION_MARKING_INTERVAL,
                self.base_congestion_marking_interval,
            )
            .put_opt_nni(
                types::DEFAULT_CONGESTION_THRESHOLD,
                self.default_congestion_threshold,
            )
            .put_opt_nni(types::MTU, self.mtu);
        writer.into_block(types::CONTROL_PARAMETERS)
    }
}
