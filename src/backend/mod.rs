//! Command channel to the forwarding process.
//!
//! The backend exchanges JSON records over a Unix seqpacket socket, one
//! record per datagram. Requests and responses are paired purely by order;
//! see [`BackendChannel`].

mod channel;
mod codec;
mod error;
mod link;
mod message;

pub use channel::{BackendChannel, NotificationHandler};
pub use codec::{DEFAULT_MAX_MESSAGE_SIZE, JsonStreamCodec};
pub use error::BackendError;
pub use link::{
    BackendTransport,
    JsonStream,
    MAX_DATAGRAM_SIZE,
    MessageSink,
    MessageStream,
};
pub use message::{BackendCommand, BackendMessage, NOTIFY_CLEAN};
