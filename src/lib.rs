#![doc(html_root_url = "https://docs.rs/ndnmgmt/latest")]
//! Public API for the `ndnmgmt` library.
//!
//! `ndnmgmt` is the management plane of an NDN forwarder. It reads command
//! Interests from the forwarder's link socket, executes them through a JSON
//! command channel to the forwarding process and answers with Control
//! Responses or segmented status datasets.

pub mod backend;
pub mod bridge;
pub mod codec;
pub mod config;
pub mod control;
pub mod error;
pub mod lp;
pub mod metrics;
pub mod mgmt;
pub mod ndn;
pub mod panic;
pub mod tlv;
pub mod transport;

pub use backend::{BackendChannel, BackendError, BackendMessage};
pub use bridge::{connect_and_serve, serve};
pub use codec::TlvFrameCodec;
pub use config::BridgeConfig;
pub use control::{ControlParameters, ControlResponse};
pub use error::BridgeError;
pub use mgmt::{Dispatcher, MgmtContext};
pub use metrics::{BACKEND_CALLS, FRAMES_DROPPED, FRAMES_PROCESSED, RESPONSES_SENT};
