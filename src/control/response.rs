//! ControlResponse: the result record of a management command.

use serde::{Deserialize, Serialize};

use super::{ControlError, ControlParameters, parameters::utf8};
use crate::tlv::{Block, TlvError, TlvWriter, types};

/// Status codes used in Control Responses.
pub mod status {
    pub const OK: u32 = 200;
    pub const BAD_REQUEST: u32 = 400;
    pub const NOT_FOUND: u32 = 404;
    pub const NOT_ACCEPTABLE: u32 = 406;
    pub const CONFLICT: u32 = 409;
    pub const GONE: u32 = 410;
    pub const INTERNAL_ERROR: u32 = 500;
    pub const NOT_IMPLEMENTED: u32 = 501;
    pub const UNAVAILABLE: u32 = 503;
    pub const TIMED_OUT: u32 = 504;
}

/// Outcome of a management command: status plus an optional parameter body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlResponse {
    #[serde(rename = "statuscode")]
    pub status_code: u32,
    #[serde(rename = "statustext")]
    pub status_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<ControlParameters>,
}

impl ControlResponse {
    /// Build a response with an explicit status.
    #[must_use]
    pub fn new(status_code: u32, status_text: impl Into<String>) -> Self {
        Self {
            status_code,
            status_text: status_text.into(),
            body: None,
        }
    }

    /// A 200 response echoing `body`.
    #[must_use]
    pub fn ok(body: ControlParameters) -> Self {
        Self {
            body: Some(body),
            ..Self::new(status::OK, "OK")
        }
    }

    /// Whether the status code is 200.
    #[must_use]
    pub fn is_ok(&self) -> bool { self.status_code == status::OK }

    /// Encode as a ControlResponse element.
    #[must_use]
    pub fn encode(&self) -> Block {
        let mut writer = TlvWriter::new();
        writer
            .put_nni(types::STATUS_CODE, u64::from(self.status_code))
            .put(types::STATUS_TEXT, self.status_text.as_bytes());
        if let Some(body) = &self.body {
            writer.put_block(&body.encode());
        }
        writer.into_block(types::CONTROL_RESPONSE)
    }

    /// Decode a ControlResponse element.
    ///
    /// # Errors
    ///
    /// Returns a [`ControlError`] when the element is malformed or lacks a
    /// status code.
    pub fn decode(block: &Block) -> Result<Self, ControlError> {
        if block.typ() != types::CONTROL_RESPONSE {
            return Err(TlvError::UnexpectedType {
                expected: types::CONTROL_RESPONSE,
                found: block.typ(),
            }
            .into());
        }
        let mut status_code = None;
        let mut response = Self::default();
        for field in block.children()? {
            match field.typ() {
                types::STATUS_CODE => {
                    let code = field.as_nni()?;
                    status_code =
                        Some(u32::try_from(code).map_err(|_| TlvError::InvalidType(code))?);
                }
                types::STATUS_TEXT => response.status_text = utf8("StatusText", field.value())?,
                types::CONTROL_PARAMETERS => {
                    response.body = Some(ControlParameters::decode(&field)?);
                }
                _ => {}
            }
        }
        response.status_code = status_code.ok_or(TlvError::MissingElement("StatusCode"))?;
        Ok(response)
    }
}
