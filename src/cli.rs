//! Command line interface for the `ndnmgmt` binary.
//!
//! Flags override values read from the configuration file. The same
//! definition drives man page generation in `build.rs`.

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

/// Command line arguments for the `ndnmgmt` binary.
#[derive(Debug, Parser)]
#[command(name = "ndnmgmt", version, about = "NDN forwarder management bridge")]
pub struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Unix socket carrying link frames from the forwarder.
    #[arg(long)]
    pub forwarder_socket: Option<PathBuf>,
    /// Unix socket of the forwarding process' command channel.
    #[arg(long)]
    pub backend_socket: Option<PathBuf>,
    /// Largest link frame accepted or emitted, in bytes.
    #[arg(long)]
    pub max_packet_size: Option<usize>,
    /// Backend request deadline in milliseconds; 0 waits forever.
    #[arg(long)]
    pub backend_timeout_ms: Option<u64>,
    /// Serve Prometheus metrics on this address.
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}
