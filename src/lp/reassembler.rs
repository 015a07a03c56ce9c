//! Inbound helper that stitches `LpPacket` fragments back into network packets.
//!
//! [`Reassembler`] keys partial packets by base sequence number
//! (`Sequence - FragIndex`) and stores each fragment in the slot named by its
//! index, so fragments may arrive in any order and duplicates simply
//! overwrite. Resource use is bounded by the number of partial packets, the
//! FragCount ceiling, the packet ceiling and a per-packet timeout.

use std::{
    collections::{HashMap, hash_map::Entry},
    time::Instant,
};

use bytes::{Bytes, BytesMut};

use super::{Fragmentation, ReassemblyConfig, ReassemblyError};

#[derive(Debug)]
struct PartialPacket {
    slots: Vec<Option<Bytes>>,
    filled: usize,
    buffered: usize,
    started_at: Instant,
}

impl PartialPacket {
    fn new(count: usize, started_at: Instant) -> Self {
        Self {
            slots: vec![None; count],
            filled: 0,
            buffered: 0,
            started_at,
        }
    }

    fn count(&self) -> u64 { self.slots.len() as u64 }

    /// Store `payload` at `index`, returning the buffered size afterwards.
    fn store(&mut self, index: usize, payload: Bytes) -> usize {
        let incoming = payload.len();
        match self.slots[index].replace(payload) {
            Some(previous) => self.buffered -= previous.len(),
            None => self.filled += 1,
        }
        self.buffered += incoming;
        self.buffered
    }

    fn is_complete(&self) -> bool { self.filled == self.slots.len() }

    fn into_payload(self) -> Bytes {
        let mut out = BytesMut::with_capacity(self.buffered);
        for slot in self.slots.into_iter().flatten() {
            out.extend_from_slice(&slot);
        }
        out.freeze()
    }
}

/// Stateful fragment re-assembler with bounded state and timeout eviction.
#[derive(Debug)]
pub struct Reassembler {
    config: ReassemblyConfig,
    buffers: HashMap<u64, PartialPacket>,
}

impl Reassembler {
    /// Create a re-assembler enforcing `config`.
    #[must_use]
    pub fn new(config: ReassemblyConfig) -> Self {
        Self {
            config,
            buffers: HashMap::new(),
        }
    }

    /// Process a fragment using the current time.
    ///
    /// Returns `Ok(Some(_))` with the concatenated packet when the fragment
    /// completes it and `Ok(None)` while more fragments are required.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError`] when the fragment breaks a configured limit
    /// or disagrees with the FragCount already recorded for its packet.
    pub fn push(
        &mut self,
        fragmentation: Fragmentation,
        payload: Bytes,
    ) -> Result<Option<Bytes>, ReassemblyError> {
        self.push_at(fragmentation, payload, Instant::now())
    }

    /// Process a fragment using an explicit clock reading.
    ///
    /// # Errors
    ///
    /// See [`Reassembler::push`].
    pub fn push_at(
        &mut self,
        fragmentation: Fragmentation,
        payload: Bytes,
        now: Instant,
    ) -> Result<Option<Bytes>, ReassemblyError> {
        self.purge_expired_at(now);

        let Fragmentation { index, count, .. } = fragmentation;
        if count > self.config.max_fragments {
            return Err(ReassemblyError::TooManyFragments {
                count,
                limit: self.config.max_fragments,
            });
        }
        if index >= count {
            return Err(ReassemblyError::IndexOutOfRange { index, count });
        }
        let base_sequence = fragmentation.base_sequence();
        let limit = self.config.max_packet_size;
        let (Ok(index), Ok(slot_count)) = (usize::try_from(index), usize::try_from(count)) else {
            return Err(ReassemblyError::TooManyFragments {
                count,
                limit: self.config.max_fragments,
            });
        };

        if !self.buffers.contains_key(&base_sequence) {
            self.make_room();
        }
        let mut entry = match self.buffers.entry(base_sequence) {
            Entry::Occupied(occupied) => occupied,
            Entry::Vacant(vacant) => {
                let occupied = vacant.insert_entry(PartialPacket::new(slot_count, now));
                tracing::trace!(base_sequence, count, "started reassembly");
                occupied
            }
        };

        if entry.get().count() != count {
            let expected = entry.remove().count();
            return Err(ReassemblyError::CountMismatch {
                base_sequence,
                expected,
                found: count,
            });
        }

        let attempted = entry.get_mut().store(index, payload);
        if attempted > limit {
            entry.remove();
            return Err(ReassemblyError::PacketTooLarge {
                base_sequence,
                attempted,
                limit,
            });
        }

        if entry.get().is_complete() {
            return Ok(Some(entry.remove().into_payload()));
        }
        Ok(None)
    }

    /// Evict the oldest partial packet when the pending bound is reached.
    fn make_room(&mut self) {
        if self.buffers.len() < self.config.max_pending.get() {
            return;
        }
        let oldest = self
            .buffers
            .iter()
            .min_by_key(|(_, partial)| partial.started_at)
            .map(|(base, _)| *base);
        if let Some(base_sequence) = oldest {
            self.buffers.remove(&base_sequence);
            tracing::debug!(base_sequence, "evicted oldest partial packet");
        }
    }

    /// Remove any partial packets that exceeded the configured timeout.
    ///
    /// Returns the base sequences that were evicted.
    pub fn purge_expired(&mut self) -> Vec<u64> { self.purge_expired_at(Instant::now()) }

    /// Remove any partial packets that exceeded the configured timeout using
    /// an explicit clock reading.
    ///
    /// Returns the base sequences that were evicted.
    pub fn purge_expired_at(&mut self, now: Instant) -> Vec<u64> {
        let mut evicted = Vec::new();
        let timeout = self.config.timeout;

        self.buffers.retain(|base_sequence, partial| {
            let expired = now.saturating_duration_since(partial.started_at) >= timeout;
            if expired {
                evicted.push(*base_sequence);
            }
            !expired
        });

        evicted
    }

    /// Number of partial packets currently buffered.
    #[must_use]
    pub fn buffered_len(&self) -> usize { self.buffers.len() }
}
