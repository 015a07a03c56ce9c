//! Message transports the backend channel can run over.
//!
//! The forwarding process listens on a `SOCK_SEQPACKET` socket and exchanges
//! one JSON object per datagram. Byte streams carrying concatenated JSON are
//! also accepted, which is what in-memory test peers use.

use std::{pin::Pin, sync::Arc};

use futures::{Sink, Stream};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_seqpacket::UnixSeqpacket;
use tokio_util::codec::{FramedRead, FramedWrite};

use super::{BackendError, BackendMessage, JsonStreamCodec};

/// Largest datagram read from a seqpacket backend.
pub const MAX_DATAGRAM_SIZE: usize = 256 * 1024;

/// Outbound half of a backend transport.
pub type MessageSink = Pin<Box<dyn Sink<BackendMessage, Error = BackendError> + Send>>;
/// Inbound half of a backend transport.
pub type MessageStream = Pin<Box<dyn Stream<Item = Result<BackendMessage, BackendError>> + Send>>;

/// A connection that can carry [`BackendMessage`]s.
pub trait BackendTransport: Send + 'static {
    /// Split into independently driven write and read halves.
    fn into_parts(self) -> (MessageSink, MessageStream);
}

/// A byte stream carrying back-to-back JSON objects.
#[derive(Debug)]
pub struct JsonStream<S>(pub S);

impl<S> BackendTransport for JsonStream<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    fn into_parts(self) -> (MessageSink, MessageStream) {
        let (read_half, write_half) = tokio::io::split(self.0);
        (
            Box::pin(FramedWrite::new(write_half, JsonStreamCodec::default())),
            Box::pin(FramedRead::new(read_half, JsonStreamCodec::default())),
        )
    }
}

impl BackendTransport for UnixSeqpacket {
    fn into_parts(self) -> (MessageSink, MessageStream) {
        let socket = Arc::new(self);
        let sink = futures::sink::unfold(
            Arc::clone(&socket),
            |socket, message: BackendMessage| async move {
                let datagram = serde_json::to_vec(&message).map_err(BackendError::Encode)?;
                socket.send(&datagram).await?;
                Ok::<_, BackendError>(socket)
            },
        );
        let stream = futures::stream::unfold(
            (socket, vec![0_u8; MAX_DATAGRAM_SIZE]),
            |(socket, mut buf)| async move {
                loop {
                    let len = match socket.recv(&mut buf).await {
                        // A zero-length read is the peer hanging up.
                        Ok(0) => return None,
                        Ok(len) => len,
                        Err(err) => return Some((Err(BackendError::Io(err)), (socket, buf))),
                    };
                    if let Some(message) = decode_datagram(&buf[..len]) {
                        return Some((Ok(message), (socket, buf)));
                    }
                }
            },
        );
        (Box::pin(sink), Box::pin(stream))
    }
}

/// Parse one datagram, logging and skipping anything that is not a message.
fn decode_datagram(datagram: &[u8]) -> Option<BackendMessage> {
    match serde_json::from_slice(datagram) {
        Ok(message) => Some(message),
        Err(err) => {
            tracing::warn!(error = %err, len = datagram.len(), "malformed backend datagram");
            crate::metrics::inc_backend_errors("malformed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::{SinkExt, StreamExt};

    use super::*;
    use crate::backend::{BackendCommand, NOTIFY_CLEAN};

    #[test]
    fn malformed_datagrams_are_skipped() {
        assert!(decode_datagram(b"{\"command\":").is_none());
        let message = decode_datagram(br#"{"command":"clean","faceid":7}"#).expect("message");
        assert_eq!(message.command, NOTIFY_CLEAN);
        assert_eq!(message.face_id, 7);
    }

    #[tokio::test]
    async fn seqpacket_carries_one_message_per_datagram() {
        let (ours, theirs) = UnixSeqpacket::pair().expect("socket pair");
        let (mut sink, _stream) = ours.into_parts();
        sink.send(BackendMessage {
            face_id: 3,
            ..BackendMessage::request(BackendCommand::FaceId)
        })
        .await
        .expect("send");
        sink.send(BackendMessage::request(BackendCommand::List)).await.expect("send");

        let mut buf = vec![0_u8; MAX_DATAGRAM_SIZE];
        let len = theirs.recv(&mut buf).await.expect("first datagram");
        let first: BackendMessage = serde_json::from_slice(&buf[..len]).expect("whole object");
        assert_eq!((first.command.as_str(), first.face_id), ("faceid", 3));
        let len = theirs.recv(&mut buf).await.expect("second datagram");
        let second: BackendMessage = serde_json::from_slice(&buf[..len]).expect("whole object");
        assert_eq!(second.command, "list");
    }

    #[tokio::test]
    async fn seqpacket_stream_ends_when_the_peer_hangs_up() {
        let (ours, theirs) = UnixSeqpacket::pair().expect("socket pair");
        let (_sink, mut stream) = ours.into_parts();
        theirs.send(b"not json").await.expect("send");
        theirs
            .send(br#"{"command":"","valid":true}"#)
            .await
            .expect("send");
        drop(theirs);

        let message = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("in time")
            .expect("item")
            .expect("message");
        assert!(message.valid);
        assert!(stream.next().await.is_none());
    }
}
