//! NDN Type-Length-Value primitives.
//!
//! Everything on the management plane is TLV: the link frames read from the
//! forwarder socket, the network packets they carry and the control
//! parameters embedded in command names. This module keeps the encoding rules
//! in one place so the higher layers only deal with [`Block`]s.

mod block;
mod error;
pub mod types;
mod varnum;

pub use block::{Block, TlvWriter};
pub use error::TlvError;
pub use varnum::{
    TypeLength,
    decode_type_length,
    nni_len,
    put_nni,
    put_var_number,
    read_nni,
    read_var_number,
    var_number_len,
};
