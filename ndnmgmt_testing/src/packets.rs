//! Builders for command Interests and link frames.

use bytes::Bytes;
use ndnmgmt::{
    control::ControlParameters,
    lp::LinkFrame,
    ndn::{Interest, Name},
};

/// A command Interest for `uri`, with `params` appended when given.
///
/// # Panics
///
/// Panics if `uri` is not a valid NDN name.
#[must_use]
pub fn command(uri: &str, params: Option<&ControlParameters>) -> Interest {
    let mut name: Name = uri.parse().expect("valid command name");
    if let Some(params) = params {
        name = name.append(params.to_component());
    }
    Interest::new(name)
}

/// Wrap `interest` in an `LpPacket` as the forwarder would.
///
/// # Panics
///
/// Panics if the frame cannot be encoded.
#[must_use]
pub fn link_frame(interest: &Interest, pit_token: Option<Bytes>, incoming_face_id: Option<u64>) -> Bytes {
    LinkFrame::new(interest.encode().to_bytes())
        .with_pit_token(pit_token)
        .with_incoming_face_id(incoming_face_id)
        .encode()
        .expect("encodable link frame")
        .to_bytes()
}
