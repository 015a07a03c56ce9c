//! The forwarder end of the link socket.

use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use ndnmgmt::{
    TlvFrameCodec,
    control::ControlResponse,
    lp::LinkFrame,
    ndn::{Data, Interest},
    tlv::Block,
};
use tokio::io::{AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};
use tokio_util::codec::FramedRead;

use crate::packets::link_frame;

const PIT_TOKEN: &[u8] = b"\xC0\xFF\xEE";
const RESPONSE_WAIT: Duration = Duration::from_secs(5);

/// Writes commands into the bridge and reads its link frames back.
pub struct FakeForwarder {
    reader: FramedRead<ReadHalf<DuplexStream>, TlvFrameCodec>,
    writer: WriteHalf<DuplexStream>,
}

impl FakeForwarder {
    /// Drive the forwarder end of `stream`.
    #[must_use]
    pub fn new(stream: DuplexStream) -> Self {
        let (read, writer) = tokio::io::split(stream);
        Self {
            reader: FramedRead::new(read, TlvFrameCodec::new(ndnmgmt::codec::MAX_PACKET_SIZE)),
            writer,
        }
    }

    /// PIT token attached to every command sent with [`Self::send`].
    #[must_use]
    pub fn pit_token() -> Bytes { Bytes::from_static(PIT_TOKEN) }

    /// Send `interest` as arriving on `incoming_face_id`.
    ///
    /// # Panics
    ///
    /// Panics if the bridge closed the link.
    pub async fn send(&mut self, interest: &Interest, incoming_face_id: Option<u64>) {
        let wire = link_frame(interest, Some(Self::pit_token()), incoming_face_id);
        self.send_raw(&wire).await;
    }

    /// Write raw bytes to the link.
    ///
    /// # Panics
    ///
    /// Panics if the bridge closed the link.
    pub async fn send_raw(&mut self, wire: &[u8]) {
        self.writer.write_all(wire).await.expect("link write");
    }

    /// Next link frame and the Data it carries.
    ///
    /// # Panics
    ///
    /// Panics if nothing arrives within five seconds or the frame is not a
    /// Data packet.
    pub async fn next_data(&mut self) -> (LinkFrame, Data) {
        let wire = tokio::time::timeout(RESPONSE_WAIT, self.reader.next())
            .await
            .expect("response in time")
            .expect("link open")
            .expect("readable frame");
        let (outer, _) = Block::decode(&wire).expect("frame block");
        let frame = LinkFrame::decode(&outer).expect("link frame");
        let (inner, _) = Block::decode(frame.fragment()).expect("packet block");
        let data = Data::decode(&inner).expect("data packet");
        (frame, data)
    }

    /// Next Control Response.
    ///
    /// # Panics
    ///
    /// Panics as [`Self::next_data`] does, or if the content is not a
    /// Control Response.
    pub async fn next_response(&mut self) -> ControlResponse {
        let (_, data) = self.next_data().await;
        let (block, _) = Block::decode(data.content()).expect("response block");
        ControlResponse::decode(&block).expect("control response")
    }

    /// Whether nothing arrives within `window`.
    pub async fn is_silent_for(&mut self, window: Duration) -> bool {
        tokio::time::timeout(window, self.reader.next()).await.is_err()
    }
}
