//! Link-layer plumbing between the forwarder socket and the dispatcher.
//!
//! [`LinkReceiver`] turns the inbound byte stream into network-layer
//! elements: TLV records are cut by [`TlvFrameCodec`], unwrapped from their
//! `LpPacket` envelope and, when fragmented, stitched back together. Every
//! unit that fails along the way is logged, counted and skipped.
//!
//! Outbound packets travel the other way through a [`ResponseSink`] to a
//! single [`write_loop`] task that owns the write half of the socket.

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use log::info;
use thiserror::Error;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    select,
    sync::mpsc,
};
use tokio_util::{
    codec::{FramedRead, FramedWrite},
    sync::CancellationToken,
};

use crate::{
    codec::{CodecError, TlvFrameCodec},
    lp::{LinkError, LinkFrame, Reassembler, ReassemblyConfig, ReassemblyError},
    metrics::{self, Direction},
    tlv::{Block, TlvError},
};

/// Default depth of the outbound queue.
pub const DEFAULT_SEND_QUEUE_CAPACITY: usize = 1024;

/// A network-layer element received from the forwarder together with its
/// link-layer metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundPacket {
    /// The Interest or Data element.
    pub block: Block,
    /// Token to echo on the reply.
    pub pit_token: Option<Bytes>,
    /// Face the packet arrived on.
    pub incoming_face_id: Option<u64>,
    /// Congestion mark set by the forwarder.
    pub congestion_mark: Option<u64>,
}

/// Reasons an inbound unit is dropped.
#[derive(Debug, Error)]
pub enum ReceiveError {
    /// The record or the carried packet is not valid TLV.
    #[error("malformed TLV: {0}")]
    Tlv(#[from] TlvError),
    /// The `LpPacket` envelope is malformed.
    #[error("malformed link frame: {0}")]
    Link(#[from] LinkError),
    /// The fragment was rejected by the reassembler.
    #[error("fragment rejected: {0}")]
    Reassembly(#[from] ReassemblyError),
}

impl ReceiveError {
    /// Short label for metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Tlv(_) => "tlv",
            Self::Link(LinkError::EmptyFragment) => "empty_fragment",
            Self::Link(_) => "link",
            Self::Reassembly(_) => "reassembly",
        }
    }
}

/// Inbound half of the forwarder connection.
pub struct LinkReceiver<R> {
    frames: FramedRead<R, TlvFrameCodec>,
    reassembler: Reassembler,
}

impl<R> LinkReceiver<R>
where
    R: AsyncRead + Unpin,
{
    /// Wrap `reader`, accepting records up to `max_packet_size` bytes.
    pub fn new(reader: R, max_packet_size: usize, reassembly: ReassemblyConfig) -> Self {
        Self {
            frames: FramedRead::new(reader, TlvFrameCodec::new(max_packet_size)),
            reassembler: Reassembler::new(reassembly),
        }
    }

    /// Wait for the next complete network-layer element.
    ///
    /// Returns `None` once the forwarder closes the stream or reading fails.
    pub async fn recv(&mut self) -> Option<InboundPacket> {
        while let Some(next) = self.frames.next().await {
            let wire = match next {
                Ok(wire) => wire,
                Err(err) => {
                    tracing::warn!(error = %err, "forwarder link failed");
                    return None;
                }
            };
            metrics::inc_frames(Direction::Inbound);
            match self.accept(wire) {
                Ok(Some(packet)) => return Some(packet),
                Ok(None) => {}
                Err(err) => {
                    metrics::inc_dropped(err.kind());
                    tracing::warn!(error = %err, "dropping inbound link frame");
                }
            }
        }
        info!("forwarder closed the link");
        None
    }

    /// Process one complete record.
    ///
    /// Returns `Ok(None)` for a fragment that does not yet complete its
    /// packet.
    fn accept(&mut self, wire: Bytes) -> Result<Option<InboundPacket>, ReceiveError> {
        let (outer, _) = Block::decode(&wire)?;
        let frame = LinkFrame::decode(&outer)?;
        let pit_token = frame.pit_token().cloned();
        let incoming_face_id = frame.incoming_face_id();
        let congestion_mark = frame.congestion_mark();

        let payload = match frame.fragmentation() {
            Some(fragmentation) => {
                match self.reassembler.push(fragmentation, frame.into_fragment())? {
                    Some(payload) => payload,
                    None => return Ok(None),
                }
            }
            None => frame.into_fragment(),
        };
        let (block, _) = Block::decode(&payload)?;
        Ok(Some(InboundPacket {
            block,
            pit_token,
            incoming_face_id,
            congestion_mark,
        }))
    }
}

/// A network-layer packet queued for the forwarder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundPacket {
    /// Encoded Interest or Data.
    pub wire: Bytes,
    /// Token copied from the request being answered.
    pub pit_token: Option<Bytes>,
    /// Face the forwarder should send the packet out of.
    pub next_hop_face_id: Option<u64>,
}

/// Cloneable handle feeding the outbound writer task.
#[derive(Clone, Debug)]
pub struct ResponseSink {
    tx: mpsc::Sender<OutboundPacket>,
}

impl ResponseSink {
    /// Create a sink and the queue its writer drains.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<OutboundPacket>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Queue `packet` for the forwarder.
    ///
    /// Returns `false` if the writer has stopped.
    pub async fn send(&self, packet: OutboundPacket) -> bool {
        if self.tx.send(packet).await.is_err() {
            tracing::debug!("outbound writer stopped; dropping packet");
            return false;
        }
        true
    }
}

/// Drain `rx` into `writer`, wrapping every packet in an `LpPacket`.
///
/// Packets that cannot be framed are dropped; an I/O error ends the loop.
#[expect(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! expands to modulus internally"
)]
pub async fn write_loop<W>(
    mut rx: mpsc::Receiver<OutboundPacket>,
    writer: W,
    max_packet_size: usize,
    shutdown: CancellationToken,
) where
    W: AsyncWrite + Unpin,
{
    let mut frames = FramedWrite::new(writer, TlvFrameCodec::new(max_packet_size));
    loop {
        let packet = select! {
            () = shutdown.cancelled() => break,
            packet = rx.recv() => match packet {
                Some(packet) => packet,
                None => break,
            },
        };

        let frame = LinkFrame::new(packet.wire)
            .with_pit_token(packet.pit_token)
            .with_next_hop_face_id(packet.next_hop_face_id);
        let block = match frame.encode() {
            Ok(block) => block,
            Err(err) => {
                metrics::inc_dropped("encode");
                tracing::warn!(error = %err, "failed to encode outbound link frame");
                continue;
            }
        };
        match frames.send(block.to_bytes()).await {
            Ok(()) => metrics::inc_frames(Direction::Outbound),
            Err(CodecError::Io(err)) => {
                tracing::warn!(error = %err, "forwarder write failed");
                break;
            }
            Err(err) => {
                metrics::inc_dropped("oversized");
                tracing::warn!(error = %err, "dropping outbound link frame");
            }
        }
    }
    info!("outbound writer stopped");
}
