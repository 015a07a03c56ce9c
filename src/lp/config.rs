//! Limits applied to fragment reassembly.

use std::{num::NonZeroUsize, time::Duration};

use crate::codec::{DEFAULT_MAX_PACKET_SIZE, clamp_packet_size};

/// Default number of packets that may be partially reassembled at once.
pub const DEFAULT_MAX_PENDING: usize = 256;
/// Default ceiling on FragCount.
pub const DEFAULT_MAX_FRAGMENTS: u64 = 64;
/// Default lifetime of an incomplete packet.
pub const DEFAULT_REASSEMBLY_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings that bound reassembly resource usage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReassemblyConfig {
    /// Incomplete packets tracked at once; the oldest is evicted beyond this.
    pub max_pending: NonZeroUsize,
    /// Largest FragCount accepted.
    pub max_fragments: u64,
    /// Hard cap on the reassembled packet size.
    pub max_packet_size: usize,
    /// Duration after which an incomplete packet is discarded.
    pub timeout: Duration,
}

impl ReassemblyConfig {
    /// Set the pending-packet bound; zero is raised to one.
    #[must_use]
    pub fn max_pending(mut self, value: usize) -> Self {
        self.max_pending = NonZeroUsize::new(value).unwrap_or(NonZeroUsize::MIN);
        self
    }

    /// Set the FragCount ceiling; values below two are raised to two.
    #[must_use]
    pub fn max_fragments(mut self, value: u64) -> Self {
        self.max_fragments = value.max(2);
        self
    }

    /// Set the packet ceiling, clamped like the frame codec's.
    #[must_use]
    pub fn max_packet_size(mut self, value: usize) -> Self {
        self.max_packet_size = clamp_packet_size(value);
        self
    }

    /// Set the incomplete-packet timeout.
    #[must_use]
    pub fn timeout(mut self, value: Duration) -> Self {
        self.timeout = value;
        self
    }
}

impl Default for ReassemblyConfig {
    fn default() -> Self {
        Self {
            max_pending: NonZeroUsize::new(DEFAULT_MAX_PENDING).unwrap_or(NonZeroUsize::MIN),
            max_fragments: DEFAULT_MAX_FRAGMENTS,
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            timeout: DEFAULT_REASSEMBLY_TIMEOUT,
        }
    }
}
