//! The NDNLPv2 `LpPacket` envelope.

use bytes::Bytes;

use super::LinkError;
use crate::tlv::{Block, TlvWriter, types};

/// Sequence, index and count of a fragmented frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fragmentation {
    /// Sequence number of this fragment.
    pub sequence: u64,
    /// Position of this fragment within the packet.
    pub index: u64,
    /// Total fragments making up the packet.
    pub count: u64,
}

impl Fragmentation {
    /// Sequence number shared by every fragment of the same packet.
    #[must_use]
    pub fn base_sequence(&self) -> u64 { self.sequence.wrapping_sub(self.index) }
}

/// A decoded link frame.
///
/// Frames with a FragCount of one (or none) are not split and carry a complete
/// network packet in [`fragment`](Self::fragment).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkFrame {
    fragment: Bytes,
    pit_token: Option<Bytes>,
    incoming_face_id: Option<u64>,
    next_hop_face_id: Option<u64>,
    congestion_mark: Option<u64>,
    sequence: Option<u64>,
    frag_index: u64,
    frag_count: u64,
}

/// Header fields in `800..=959` with the two low bits clear may be skipped.
fn is_ignorable(typ: u32) -> bool { (800..=959).contains(&typ) && typ & 0b11 == 0 }

impl LinkFrame {
    /// Wrap a network-packet wire encoding.
    #[must_use]
    pub fn new(fragment: Bytes) -> Self {
        Self {
            fragment,
            frag_count: 1,
            ..Self::default()
        }
    }

    /// Attach a PIT token.
    #[must_use]
    pub fn with_pit_token(mut self, token: Option<Bytes>) -> Self {
        self.pit_token = token;
        self
    }

    /// Attach a next-hop face id.
    #[must_use]
    pub fn with_next_hop_face_id(mut self, face_id: Option<u64>) -> Self {
        self.next_hop_face_id = face_id;
        self
    }

    /// Attach an incoming face id.
    #[must_use]
    pub fn with_incoming_face_id(mut self, face_id: Option<u64>) -> Self {
        self.incoming_face_id = face_id;
        self
    }

    /// Attach a congestion mark.
    #[must_use]
    pub fn with_congestion_mark(mut self, mark: Option<u64>) -> Self {
        self.congestion_mark = mark;
        self
    }

    /// Mark this frame as one fragment of a larger packet.
    #[must_use]
    pub fn with_fragmentation(mut self, fragmentation: Fragmentation) -> Self {
        self.sequence = Some(fragmentation.sequence);
        self.frag_index = fragmentation.index;
        self.frag_count = fragmentation.count;
        self
    }

    /// Fragment payload.
    #[must_use]
    pub fn fragment(&self) -> &Bytes { &self.fragment }

    /// Consume the frame, returning the fragment payload.
    #[must_use]
    pub fn into_fragment(self) -> Bytes { self.fragment }

    /// PIT token, when present.
    #[must_use]
    pub fn pit_token(&self) -> Option<&Bytes> { self.pit_token.as_ref() }

    /// IncomingFaceId, when present.
    #[must_use]
    pub fn incoming_face_id(&self) -> Option<u64> { self.incoming_face_id }

    /// NextHopFaceId, when present.
    #[must_use]
    pub fn next_hop_face_id(&self) -> Option<u64> { self.next_hop_face_id }

    /// CongestionMark, when present.
    #[must_use]
    pub fn congestion_mark(&self) -> Option<u64> { self.congestion_mark }

    /// Fragmentation details for a split packet; `None` when the frame is whole.
    #[must_use]
    pub fn fragmentation(&self) -> Option<Fragmentation> {
        if self.frag_count <= 1 {
            return None;
        }
        Some(Fragmentation {
            sequence: self.sequence.unwrap_or_default(),
            index: self.frag_index,
            count: self.frag_count,
        })
    }

    /// Decode a link-layer element.
    ///
    /// A bare Interest or Data is accepted as a frame whose fragment is the
    /// whole element.
    ///
    /// # Errors
    ///
    /// Returns a [`LinkError`] for malformed TLV, unrecognised non-ignorable
    /// fields, an empty fragment or inconsistent fragmentation fields.
    pub fn decode(block: &Block) -> Result<Self, LinkError> {
        match block.typ() {
            types::INTEREST | types::DATA => return Ok(Self::new(block.to_bytes())),
            types::LP_PACKET => {}
            other => return Err(LinkError::UnexpectedType(other)),
        }

        let mut frame = Self::new(Bytes::new());
        for field in block.children()? {
            match field.typ() {
                types::LP_FRAGMENT => frame.fragment = field.value().clone(),
                types::LP_SEQUENCE => frame.sequence = Some(field.as_nni()?),
                types::LP_FRAG_INDEX => frame.frag_index = field.as_nni()?,
                types::LP_FRAG_COUNT => frame.frag_count = field.as_nni()?,
                types::LP_PIT_TOKEN => frame.pit_token = Some(field.value().clone()),
                types::LP_INCOMING_FACE_ID => frame.incoming_face_id = Some(field.as_nni()?),
                types::LP_NEXT_HOP_FACE_ID => frame.next_hop_face_id = Some(field.as_nni()?),
                types::LP_CONGESTION_MARK => frame.congestion_mark = Some(field.as_nni()?),
                other if is_ignorable(other) => {}
                other => return Err(LinkError::UnknownField(other)),
            }
        }

        if frame.fragment.is_empty() {
            return Err(LinkError::EmptyFragment);
        }
        frame.check_fragmentation()?;
        Ok(frame)
    }

    fn check_fragmentation(&self) -> Result<(), LinkError> {
        if self.frag_count == 0 || self.frag_index >= self.frag_count {
            return Err(LinkError::InvalidFragmentation {
                index: self.frag_index,
                count: self.frag_count,
            });
        }
        if self.frag_count > 1 && self.sequence.is_none() {
            return Err(LinkError::MissingSequence);
        }
        Ok(())
    }

    /// Encode as an `LpPacket`.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::EmptyFragment`] when there is nothing to carry and
    /// [`LinkError::InvalidFragmentation`] for an inconsistent index/count.
    pub fn encode(&self) -> Result<Block, LinkError> {
        if self.fragment.is_empty() {
            return Err(LinkError::EmptyFragment);
        }
        self.check_fragmentation()?;

        let mut writer = TlvWriter::new();
        if let Some(sequence) = self.sequence {
            // Sequence is a fixed-width field.
            writer.put(types::LP_SEQUENCE, &sequence.to_be_bytes());
        }
        if self.frag_count > 1 {
            writer
                .put_nni(types::LP_FRAG_INDEX, self.frag_index)
                .put_nni(types::LP_FRAG_COUNT, self.frag_count);
        }
        if let Some(token) = &self.pit_token {
            writer.put(types::LP_PIT_TOKEN, token);
        }
        writer
            .put_opt_nni(types::LP_NEXT_HOP_FACE_ID, self.next_hop_face_id)
            .put_opt_nni(types::LP_INCOMING_FACE_ID, self.incoming_face_id)
            .put_opt_nni(types::LP_CONGESTION_MARK, self.congestion_mark)
            .put(types::LP_FRAGMENT, &self.fragment);
        Ok(writer.into_block(types::LP_PACKET))
    }
}
