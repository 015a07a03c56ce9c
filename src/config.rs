//! Bridge configuration.
//!
//! [`BridgeConfig`] carries every tunable with its default. Values can be
//! loaded from a TOML file, where durations are given in milliseconds, and
//! the command line may then override individual settings.

use std::{
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;

pub use crate::lp::ReassemblyConfig;
use crate::codec::{DEFAULT_MAX_PACKET_SIZE, MAX_PACKET_SIZE, MIN_PACKET_SIZE, clamp_packet_size};

/// Default forwarder socket carrying link frames.
pub const DEFAULT_FORWARDER_SOCKET: &str = "/run/nfd.sock";
/// Default backend control socket.
pub const DEFAULT_BACKEND_SOCKET: &str = "/tmp/mgmt.sock";
/// Default payload size of one status dataset segment.
pub const DEFAULT_SEGMENT_SIZE: usize = 8000;
/// Default FreshnessPeriod of status dataset segments.
pub const DEFAULT_DATASET_FRESHNESS: Duration = Duration::from_millis(1000);
/// Default deadline for one backend request.
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(10);
/// Default number of face events retained.
pub const DEFAULT_FACE_EVENT_CAPACITY: usize = 128;

/// Runtime settings of the management bridge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Socket on which the forwarder exchanges link frames with us.
    pub forwarder_socket: PathBuf,
    /// Socket of the forwarding process' command channel.
    pub backend_socket: PathBuf,
    /// Largest link frame accepted or emitted.
    pub max_packet_size: usize,
    /// Payload bytes per status dataset segment.
    pub segment_size: usize,
    /// FreshnessPeriod set on status dataset segments.
    pub dataset_freshness: Duration,
    /// Fragment reassembly limits.
    pub reassembly: ReassemblyConfig,
    /// Per-request backend deadline; `None` waits forever.
    pub backend_timeout: Option<Duration>,
    /// Face events retained for `faces/events` lookups.
    pub face_event_capacity: NonZeroUsize,
}

impl BridgeConfig {
    /// Set the forwarder socket path.
    #[must_use]
    pub fn forwarder_socket(mut self, path: impl Into<PathBuf>) -> Self {
        self.forwarder_socket = path.into();
        self
    }

    /// Set the backend socket path.
    #[must_use]
    pub fn backend_socket(mut self, path: impl Into<PathBuf>) -> Self {
        self.backend_socket = path.into();
        self
    }

    /// Set the packet ceiling, clamped to
    /// [`MIN_PACKET_SIZE`]..=[`MAX_PACKET_SIZE`]. The reassembly ceiling
    /// follows it.
    #[must_use]
    pub fn max_packet_size(mut self, value: usize) -> Self {
        let clamped = clamp_packet_size(value);
        if clamped != value {
            log::warn!(
                "max packet size {value} outside {MIN_PACKET_SIZE}..={MAX_PACKET_SIZE}; using \
                 {clamped}"
            );
        }
        self.max_packet_size = clamped;
        self.reassembly = self.reassembly.max_packet_size(clamped);
        self
    }

    /// Set the dataset segment size, clamped to the packet ceiling range.
    /// Segments are cut smaller still when the packet ceiling requires it.
    #[must_use]
    pub fn segment_size(mut self, value: usize) -> Self {
        self.segment_size = value.clamp(MIN_PACKET_SIZE, MAX_PACKET_SIZE);
        self
    }

    /// Set the dataset segment FreshnessPeriod.
    #[must_use]
    pub fn dataset_freshness(mut self, value: Duration) -> Self {
        self.dataset_freshness = value;
        self
    }

    /// Replace the reassembly limits. The packet ceiling is kept.
    #[must_use]
    pub fn reassembly(mut self, value: ReassemblyConfig) -> Self {
        self.reassembly = value.max_packet_size(self.max_packet_size);
        self
    }

    /// Set the backend deadline. A zero duration disables it.
    #[must_use]
    pub fn backend_timeout(mut self, value: Option<Duration>) -> Self {
        self.backend_timeout = value.filter(|limit| !limit.is_zero());
        self
    }

    /// Set how many face events are retained; zero is raised to one.
    #[must_use]
    pub fn face_event_capacity(mut self, value: usize) -> Self {
        self.face_event_capacity = NonZeroUsize::new(value).unwrap_or(NonZeroUsize::MIN);
        self
    }

    /// Read a TOML configuration file over the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read and
    /// [`ConfigError::Parse`] when it is not valid configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse TOML configuration text over the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed text or unknown keys.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(text)?;
        Ok(Self::default().merge(file))
    }

    fn merge(mut self, file: FileConfig) -> Self {
        if let Some(path) = file.forwarder_socket {
            self = self.forwarder_socket(path);
        }
        if let Some(path) = file.backend_socket {
            self = self.backend_socket(path);
        }
        if let Some(size) = file.max_packet_size {
            self = self.max_packet_size(size);
        }
        if let Some(size) = file.segment_size {
            self = self.segment_size(size);
        }
        if let Some(ms) = file.dataset_freshness_ms {
            self = self.dataset_freshness(Duration::from_millis(ms));
        }
        if let Some(ms) = file.backend_timeout_ms {
            self = self.backend_timeout(Some(Duration::from_millis(ms)));
        }
        if let Some(capacity) = file.face_event_capacity {
            self = self.face_event_capacity(capacity);
        }
        if let Some(limits) = file.reassembly {
            let mut reassembly = self.reassembly;
            if let Some(pending) = limits.max_pending {
                reassembly = reassembly.max_pending(pending);
            }
            if let Some(fragments) = limits.max_fragments {
                reassembly = reassembly.max_fragments(fragments);
            }
            if let Some(ms) = limits.timeout_ms {
                reassembly = reassembly.timeout(Duration::from_millis(ms));
            }
            self = self.reassembly(reassembly);
        }
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            forwarder_socket: PathBuf::from(DEFAULT_FORWARDER_SOCKET),
            backend_socket: PathBuf::from(DEFAULT_BACKEND_SOCKET),
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            segment_size: DEFAULT_SEGMENT_SIZE,
            dataset_freshness: DEFAULT_DATASET_FRESHNESS,
            reassembly: ReassemblyConfig::default(),
            backend_timeout: Some(DEFAULT_BACKEND_TIMEOUT),
            face_event_capacity: NonZeroUsize::new(DEFAULT_FACE_EVENT_CAPACITY)
                .unwrap_or(NonZeroUsize::MIN),
        }
    }
}

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid configuration.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    forwarder_socket: Option<PathBuf>,
    backend_socket: Option<PathBuf>,
    max_packet_size: Option<usize>,
    segment_size: Option<usize>,
    dataset_freshness_ms: Option<u64>,
    backend_timeout_ms: Option<u64>,
    face_event_capacity: Option<usize>,
    reassembly: Option<FileReassembly>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileReassembly {
    max_pending: Option<usize>,
    max_fragments: Option<u64>,
    timeout_ms: Option<u64>,
}
