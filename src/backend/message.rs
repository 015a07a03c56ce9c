//! JSON records exchanged with the forwarding process.
//!
//! Correlation is positional: a record with an empty `command` answers the
//! oldest outstanding request, anything else is a notification.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::BackendError;
use crate::control::{ControlParameters, ControlResponse, FaceQueryFilter};

/// Commands understood by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendCommand {
    /// FIB dataset.
    List,
    /// General forwarder status dataset.
    ForwarderStatus,
    /// Channel dataset.
    Channels,
    /// Face dataset.
    ListFace,
    /// Create a face.
    CreateFace,
    /// Update face properties.
    UpdateFace,
    /// Destroy a face.
    DestroyFace,
    /// Filtered face dataset.
    Query,
    /// Content store information dataset.
    Info,
    /// Available strategy versions.
    Versions,
    /// Strategy choice dataset.
    ListStrategy,
    /// Face existence check.
    FaceId,
    /// Remove every next hop of a FIB entry.
    Clear,
    /// Remove one next hop.
    Remove,
    /// Insert or update one next hop.
    Insert,
    /// Choose a strategy for a namespace.
    SetStrategy,
    /// Revert a namespace to its parent's strategy.
    UnsetStrategy,
    /// Set content store capacity.
    Set,
}

impl BackendCommand {
    /// Wire spelling of the command.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::ForwarderStatus => "forwarderstatus",
            Self::Channels => "channels",
            Self::ListFace => "listface",
            Self::CreateFace => "createface",
            Self::UpdateFace => "updateface",
            Self::DestroyFace => "destroyface",
            Self::Query => "query",
            Self::Info => "info",
            Self::Versions => "versions",
            Self::ListStrategy => "liststrategy",
            Self::FaceId => "faceid",
            Self::Clear => "clear",
            Self::Remove => "remove",
            Self::Insert => "insert",
            Self::SetStrategy => "setstrategy",
            Self::UnsetStrategy => "unsetstrategy",
            Self::Set => "set",
        }
    }
}

impl fmt::Display for BackendCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Notification verb announcing that a face went away.
pub const NOTIFY_CLEAN: &str = "clean";

/// One backend record.
///
/// Absent fields take their zero value, matching what the backend emits.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendMessage {
    pub command: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "paramname", skip_serializing_if = "String::is_empty")]
    pub param_name: String,
    #[serde(rename = "faceid")]
    pub face_id: u64,
    pub cost: u64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub strategy: String,
    pub capacity: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub versions: Vec<u64>,
    /// Raw dataset bytes; base64 on the wire.
    #[serde(with = "base64_bytes", skip_serializing_if = "Bytes::is_empty")]
    pub dataset: Bytes,
    pub valid: bool,
    #[serde(rename = "controlparams", skip_serializing_if = "Option::is_none")]
    pub control_params: Option<ControlParameters>,
    #[serde(rename = "controlresponse", skip_serializing_if = "Option::is_none")]
    pub control_response: Option<ControlResponse>,
    #[serde(rename = "errorcode", skip_serializing_if = "is_zero")]
    pub error_code: u32,
    #[serde(rename = "errormessage", skip_serializing_if = "String::is_empty")]
    pub error_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<FaceQueryFilter>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uri: String,
    #[serde(rename = "localuri", skip_serializing_if = "String::is_empty")]
    pub local_uri: String,
}

#[expect(clippy::trivially_copy_pass_by_ref, reason = "serde skip predicates take references")]
fn is_zero(value: &u32) -> bool { *value == 0 }

impl BackendMessage {
    /// A request carrying `command` and nothing else.
    #[must_use]
    pub fn request(command: BackendCommand) -> Self {
        Self {
            command: command.as_str().to_owned(),
            ..Self::default()
        }
    }

    /// A response record (empty command).
    #[must_use]
    pub fn response() -> Self { Self::default() }

    /// Whether this record answers a request.
    #[must_use]
    pub fn is_response(&self) -> bool { self.command.is_empty() }

    /// Turn a backend-reported failure into an error.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Remote`] when `errorcode` is non-zero.
    pub fn into_result(self) -> Result<Self, BackendError> {
        if self.error_code == 0 {
            return Ok(self);
        }
        Err(BackendError::Remote {
            code: self.error_code,
            message: self.error_message,
        })
    }
}

mod base64_bytes {
    use base64::{Engine, prelude::BASE64_STANDARD};
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64_STANDARD.encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        // A nil byte slice is sent as `null`.
        let Some(text) = Option::<String>::deserialize(deserializer)? else {
            return Ok(Bytes::new());
        };
        BASE64_STANDARD
            .decode(text.as_bytes())
            .map(Bytes::from)
            .map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn request_omits_empty_fields() {
        let msg = BackendMessage {
            name: "/ndn".to_owned(),
            face_id: 5,
            cost: 10,
            ..BackendMessage::request(BackendCommand::Insert)
        };
        let json = serde_json::to_value(&msg).expect("serialise");
        assert_eq!(json["command"], "insert");
        assert_eq!(json["faceid"], 5);
        assert!(json.get("dataset").is_none());
        assert!(json.get("paramname").is_none());
    }

    #[test]
    fn dataset_is_base64() {
        let msg = BackendMessage {
            dataset: Bytes::from_static(b"\x80\x01\x02"),
            ..BackendMessage::response()
        };
        let json = serde_json::to_string(&msg).expect("serialise");
        assert!(json.contains(r#""dataset":"gAEC""#));
        let back: BackendMessage = serde_json::from_str(&json).expect("parse");
        assert_eq!(back, msg);
    }

    #[rstest]
    #[case(r#"{"command":"","dataset":null}"#)]
    #[case(r#"{"command":""}"#)]
    #[case(r#"{}"#)]
    fn sparse_responses_parse(#[case] json: &str) {
        let msg: BackendMessage = serde_json::from_str(json).expect("parse");
        assert!(msg.is_response());
        assert!(msg.dataset.is_empty());
    }

    #[test]
    fn remote_error_becomes_err() {
        let msg = BackendMessage {
            error_code: 404,
            error_message: "no such face".to_owned(),
            ..BackendMessage::response()
        };
        assert!(matches!(
            msg.into_result(),
            Err(BackendError::Remote { code: 404, .. })
        ));
    }
}
