//! Error types for the backend command channel.

use std::{io, time::Duration};

use thiserror::Error;

use crate::control::{ControlResponse, status};

/// Failures surfaced to callers of the backend channel.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The connection is closed; no response will arrive.
    #[error("backend connection closed")]
    Disconnected,
    /// No response arrived before the caller's deadline.
    #[error("backend did not respond within {0:?}")]
    TimedOut(Duration),
    /// The request could not be serialised.
    #[error("failed to encode backend request: {0}")]
    Encode(#[source] serde_json::Error),
    /// Transport I/O error.
    #[error("backend I/O error: {0}")]
    Io(#[from] io::Error),
    /// The backend answered with a non-zero `errorcode`.
    #[error("backend error {code}: {message}")]
    Remote {
        /// Reported error code.
        code: u32,
        /// Reported error message.
        message: String,
    },
}

impl BackendError {
    /// Short label for metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::TimedOut(_) => "timed_out",
            Self::Encode(_) => "encode",
            Self::Io(_) => "io",
            Self::Remote { .. } => "remote",
        }
    }

    /// Control Response reported to the requester for this failure.
    #[must_use]
    pub fn to_control_response(&self) -> ControlResponse {
        match self {
            Self::Disconnected | Self::Io(_) => {
                ControlResponse::new(status::UNAVAILABLE, "Forwarder unavailable")
            }
            Self::TimedOut(_) => ControlResponse::new(status::TIMED_OUT, "Forwarder timed out"),
            Self::Encode(_) => ControlResponse::new(status::INTERNAL_ERROR, "Internal error"),
            Self::Remote { code, message } if (400..600).contains(code) => {
                ControlResponse::new(*code, message.clone())
            }
            Self::Remote { .. } => ControlResponse::new(status::INTERNAL_ERROR, "Internal error"),
        }
    }
}

impl From<BackendError> for ControlResponse {
    fn from(err: BackendError) -> Self {
        tracing::warn!(error = %err, "backend command failed");
        err.to_control_response()
    }
}
