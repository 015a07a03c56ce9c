//! NFD management payloads.
//!
//! These records appear in two encodings: TLV inside command Interests and
//! response Data, and JSON on the backend socket.

mod error;
pub mod face_uri;
mod filter;
mod parameters;
mod response;

pub use error::ControlError;
pub use face_uri::FaceUriError;
pub use filter::FaceQueryFilter;
pub use parameters::ControlParameters;
pub use response::{ControlResponse, status};
