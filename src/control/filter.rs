//! FaceQueryFilter: the selector carried by `faces/query`.

use serde::{Deserialize, Serialize};

use super::{ControlError, parameters::utf8};
use crate::{
    ndn::Component,
    tlv::{Block, TlvError, TlvWriter, types},
};

/// Face attributes a `faces/query` request filters on.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceQueryFilter {
    #[serde(rename = "faceid", skip_serializing_if = "Option::is_none")]
    pub face_id: Option<u64>,
    #[serde(rename = "urischeme", skip_serializing_if = "Option::is_none")]
    pub uri_scheme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(rename = "localuri", skip_serializing_if = "Option::is_none")]
    pub local_uri: Option<String>,
    #[serde(rename = "facescope", skip_serializing_if = "Option::is_none")]
    pub face_scope: Option<u64>,
    #[serde(rename = "facepersistency", skip_serializing_if = "Option::is_none")]
    pub face_persistency: Option<u64>,
    #[serde(rename = "linktype", skip_serializing_if = "Option::is_none")]
    pub link_type: Option<u64>,
}

impl FaceQueryFilter {
    /// Decode the filter carried as a name component value.
    ///
    /// # Errors
    ///
    /// Returns a [`ControlError`] when the component is not a well-formed
    /// FaceQueryFilter.
    pub fn from_component(component: &Component) -> Result<Self, ControlError> {
        let block = Block::decode_exact(component.value(), types::FACE_QUERY_FILTER)?;
        let mut filter = Self::default();
        for field in block.children()? {
            match field.typ() {
                types::FACE_ID => filter.face_id = Some(field.as_nni()?),
                types::URI_SCHEME => filter.uri_scheme = Some(utf8("UriScheme", field.value())?),
                types::URI => filter.uri = Some(utf8("Uri", field.value())?),
                types::LOCAL_URI => filter.local_uri = Some(utf8("LocalUri", field.value())?),
                types::FACE_SCOPE => filter.face_scope = Some(field.as_nni()?),
                types::FACE_PERSISTENCY => filter.face_persistency = Some(field.as_nni()?),
                types::LINK_TYPE => filter.link_type = Some(field.as_nni()?),
                other if field.is_critical() => return Err(TlvError::UnknownCritical(other).into()),
                _ => {}
            }
        }
        Ok(filter)
    }

    /// Encode as a name component.
    #[must_use]
    pub fn to_component(&self) -> Component {
        let mut writer = TlvWriter::new();
        writer.put_opt_nni(types::FACE_ID, self.face_id);
        for (typ, text) in [
            (types::URI_SCHEME, &self.uri_scheme),
            (types::URI, &self.uri),
            (types::LOCAL_URI, &self.local_uri),
        ] {
            if let Some(text) = text {
                writer.put(typ, text.as_bytes());
            }
        }
        writer
            .put_opt_nni(types::FACE_SCOPE, self.face_scope)
            .put_opt_nni(types::FACE_PERSISTENCY, self.face_persistency)
            .put_opt_nni(types::LINK_TYPE, self.link_type);
        Component::generic(writer.into_block(types::FACE_QUERY_FILTER).to_bytes())
    }
}
