//! A scripted stand-in for the forwarding process' command socket.

use futures::{SinkExt, StreamExt};
use ndnmgmt::backend::{BackendMessage, JsonStreamCodec};
use tokio::{io::DuplexStream, sync::mpsc};
use tokio_util::codec::Framed;

/// Computes the response to one backend request.
pub type Script = Box<dyn Fn(&BackendMessage) -> BackendMessage + Send + Sync>;

/// Answer every request with an empty success record.
#[must_use]
pub fn ok_script() -> Script { Box::new(|_| BackendMessage::response()) }

/// Handle to a backend task serving a [`Script`].
pub struct FakeBackend {
    seen: mpsc::UnboundedReceiver<BackendMessage>,
    push: mpsc::UnboundedSender<BackendMessage>,
    disconnect: Option<tokio::sync::oneshot::Sender<()>>,
}

impl FakeBackend {
    /// Serve `stream` with `script` until the bridge disconnects.
    #[must_use]
    pub fn spawn(stream: DuplexStream, script: Script) -> Self {
        let (seen_tx, seen) = mpsc::unbounded_channel();
        let (push, mut pushed) = mpsc::unbounded_channel();
        let (disconnect, mut disconnected) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            let mut framed = Framed::new(stream, JsonStreamCodec::<BackendMessage>::default());
            loop {
                tokio::select! {
                    _ = &mut disconnected => break,
                    request = framed.next() => {
                        let Some(Ok(request)) = request else { break };
                        let reply = script(&request);
                        let _ = seen_tx.send(request);
                        if framed.send(reply).await.is_err() {
                            break;
                        }
                    }
                    Some(record) = pushed.recv() => {
                        if framed.send(record).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });
        Self {
            seen,
            push,
            disconnect: Some(disconnect),
        }
    }

    /// Next request the bridge sent, waiting for it to arrive.
    ///
    /// # Panics
    ///
    /// Panics if the backend task has stopped.
    pub async fn next_request(&mut self) -> BackendMessage {
        self.seen.recv().await.expect("backend task stopped")
    }

    /// Every request received so far.
    pub fn drain_requests(&mut self) -> Vec<BackendMessage> {
        std::iter::from_fn(|| self.seen.try_recv().ok()).collect()
    }

    /// Send an unsolicited record such as a notification.
    ///
    /// # Panics
    ///
    /// Panics if the backend task has stopped.
    pub fn push(&self, record: BackendMessage) {
        self.push.send(record).expect("backend task stopped");
    }

    /// Close the backend side of the connection.
    pub fn disconnect(&mut self) {
        if let Some(disconnect) = self.disconnect.take() {
            let _ = disconnect.send(());
        }
    }
}
