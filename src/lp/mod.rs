//! NDNLPv2 link layer: the `LpPacket` envelope and fragment reassembly.

mod config;
mod error;
mod frame;
mod reassembler;

pub use config::{
    DEFAULT_MAX_FRAGMENTS,
    DEFAULT_MAX_PENDING,
    DEFAULT_REASSEMBLY_TIMEOUT,
    ReassemblyConfig,
};
pub use error::{LinkError, ReassemblyError};
pub use frame::{Fragmentation, LinkFrame};
pub use reassembler::Reassembler;
