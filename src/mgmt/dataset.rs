//! Status dataset publication.
//!
//! A dataset is cut into fixed-size slices, each carried by a Data named
//! `<dataset name>/v=<version>/seg=<n>`. Every segment names the last one in
//! its FinalBlockId so a consumer can stop fetching early. Slices shrink
//! below the configured segment size when a segment and its link header
//! would otherwise exceed the packet ceiling.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use bytes::Bytes;

use crate::ndn::{Component, Data, Name};

/// Room kept for the `LpPacket` header, a PIT token of up to 32 bytes,
/// `NextHopFaceId` and the fragment header.
const LINK_OVERHEAD: usize = 64;
/// Growth of the Data and Content length fields once content is added.
const LENGTH_GROWTH: usize = 8;

/// Splits datasets into versioned segments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segmenter {
    segment_size: usize,
    freshness: Duration,
    packet_ceiling: Option<usize>,
}

impl Segmenter {
    /// Create a segmenter emitting at most `segment_size` content bytes per
    /// segment. A zero size is treated as one.
    #[must_use]
    pub fn new(segment_size: usize, freshness: Duration) -> Self {
        Self {
            segment_size: segment_size.max(1),
            freshness,
            packet_ceiling: None,
        }
    }

    /// Keep every segment, once wrapped in a link frame, within
    /// `max_packet_size` bytes.
    #[must_use]
    pub fn with_packet_ceiling(mut self, max_packet_size: usize) -> Self {
        self.packet_ceiling = Some(max_packet_size);
        self
    }

    /// Content bytes carried per segment under `versioned`.
    fn slice_size(&self, versioned: &Name) -> usize {
        let Some(ceiling) = self.packet_ceiling else {
            return self.segment_size;
        };
        let envelope = Data::new(versioned.append(Component::segment(u64::MAX)), Bytes::new())
            .with_freshness_period(self.freshness)
            .with_final_block_id(Component::segment(u64::MAX))
            .encode()
            .encoded_len();
        let room = ceiling.saturating_sub(envelope + LENGTH_GROWTH + LINK_OVERHEAD);
        self.segment_size.min(room).max(1)
    }

    /// Segment `dataset` under `name` at `version`.
    ///
    /// An empty dataset still yields one empty segment.
    #[must_use]
    pub fn segment(&self, name: &Name, version: u64, dataset: &Bytes) -> Vec<Data> {
        let versioned = name.append(Component::version(version));
        let size = self.slice_size(&versioned);
        let slices: Vec<Bytes> = if dataset.is_empty() {
            vec![Bytes::new()]
        } else {
            (0..dataset.len())
                .step_by(size)
                .map(|start| dataset.slice(start..(start + size).min(dataset.len())))
                .collect()
        };
        let last = Component::segment(slices.len() as u64 - 1);

        slices
            .into_iter()
            .zip(0_u64..)
            .map(|(content, index)| {
                Data::new(versioned.append(Component::segment(index)), content)
                    .with_freshness_period(self.freshness)
                    .with_final_block_id(last.clone())
            })
            .collect()
    }
}

/// Monotonic dataset version for one (module, verb) pair.
#[derive(Debug, Default)]
pub struct VersionCounter(AtomicU64);

impl VersionCounter {
    /// Return the next version, starting from zero.
    pub fn next(&self) -> u64 { self.0.fetch_add(1, Ordering::Relaxed) }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::{
        codec::{DEFAULT_MAX_PACKET_SIZE, MIN_PACKET_SIZE},
        lp::LinkFrame,
    };

    fn name() -> Name { "/localhost/nfd/status/general".parse().expect("name") }

    #[rstest]
    #[case(0, 1)]
    #[case(1, 1)]
    #[case(10, 1)]
    #[case(11, 2)]
    #[case(25, 3)]
    fn segment_count_follows_size(#[case] len: usize, #[case] expected: usize) {
        let dataset = Bytes::from(vec![7_u8; len]);
        let segments = Segmenter::new(10, Duration::from_secs(1)).segment(&name(), 3, &dataset);
        assert_eq!(segments.len(), expected);

        let joined: Vec<u8> = segments
            .iter()
            .flat_map(|data| data.content().iter().copied())
            .collect();
        assert_eq!(joined.len(), len);
    }

    #[test]
    fn segments_are_named_and_marked() {
        let dataset = Bytes::from(vec![1_u8; 15]);
        let segments = Segmenter::new(10, Duration::from_millis(1000)).segment(&name(), 9, &dataset);
        for (index, data) in segments.iter().enumerate() {
            assert_eq!(
                data.name().to_string(),
                format!("/localhost/nfd/status/general/v=9/seg={index}")
            );
            assert_eq!(data.final_block_id().and_then(Component::as_segment), Some(1));
            assert_eq!(data.freshness_period(), Some(Duration::from_millis(1000)));
        }
    }

    #[rstest]
    #[case(1024)]
    #[case(MIN_PACKET_SIZE * 4)]
    #[case(DEFAULT_MAX_PACKET_SIZE)]
    fn wrapped_segments_fit_the_packet_ceiling(#[case] ceiling: usize) {
        let dataset = Bytes::from(vec![3_u8; 20_000]);
        let segments = Segmenter::new(8000, Duration::from_secs(1))
            .with_packet_ceiling(ceiling)
            .segment(&name(), u64::MAX, &dataset);
        assert!(segments.len() > 1);
        let mut carried = 0;
        for data in &segments {
            carried += data.content().len();
            let frame = LinkFrame::new(data.encode().to_bytes())
                .with_pit_token(Some(Bytes::from(vec![0xEE; 32])))
                .with_next_hop_face_id(Some(u64::MAX))
                .encode()
                .expect("frame");
            assert!(frame.encoded_len() <= ceiling, "{} > {ceiling}", frame.encoded_len());
        }
        assert_eq!(carried, dataset.len());
    }

    #[test]
    fn configured_size_applies_below_the_ceiling() {
        let dataset = Bytes::from(vec![3_u8; 250]);
        let segments = Segmenter::new(100, Duration::from_secs(1))
            .with_packet_ceiling(DEFAULT_MAX_PACKET_SIZE)
            .segment(&name(), 0, &dataset);
        assert_eq!(segments.len(), 3);
    }

    #[test]
    fn versions_increase_by_one() {
        let counter = VersionCounter::default();
        let first = counter.next();
        assert_eq!(counter.next(), first + 1);
    }
}
