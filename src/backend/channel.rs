//! One duplex connection to the forwarding process shared by every module.
//!
//! Requests are written in the order callers acquire the connection lock and
//! the backend answers them in the same order, so each caller parks a
//! one-shot waiter at the back of a FIFO queue while still holding the lock
//! it used to write. The read task pops the front waiter for every response
//! and hands anything carrying a `command` to the [`NotificationHandler`].

use std::{collections::VecDeque, sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use log::{info, warn};
use tokio::{
    select,
    sync::{Mutex, oneshot},
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::{BackendError, BackendMessage, BackendTransport, MessageSink, MessageStream};

type Waiter = oneshot::Sender<Result<BackendMessage, BackendError>>;

/// Receiver of unsolicited backend messages.
///
/// The read task awaits each notification in arrival order before reading
/// on, so implementations must not wait on the [`BackendChannel`]; hand the
/// work to another task instead.
#[async_trait]
pub trait NotificationHandler: Send + Sync + 'static {
    /// Process one notification.
    async fn handle(&self, notification: BackendMessage);
}

struct State {
    writer: MessageSink,
    waiters: VecDeque<Waiter>,
    closed: bool,
}

/// Handle to the backend connection. Cheap to clone.
#[derive(Clone)]
pub struct BackendChannel {
    state: Arc<Mutex<State>>,
    timeout: Option<Duration>,
}

impl BackendChannel {
    /// Take ownership of `transport` and start its read task on `tracker`.
    ///
    /// The read task stops when the backend closes the connection, on a read
    /// error, or when `shutdown` is cancelled. In every case outstanding and
    /// future calls fail with [`BackendError::Disconnected`].
    pub fn spawn<T>(
        transport: T,
        handler: Arc<dyn NotificationHandler>,
        timeout: Option<Duration>,
        tracker: &TaskTracker,
        shutdown: CancellationToken,
    ) -> Self
    where
        T: BackendTransport,
    {
        let (writer, reader) = transport.into_parts();
        let state = Arc::new(Mutex::new(State {
            writer,
            waiters: VecDeque::new(),
            closed: false,
        }));

        tracker.spawn(read_loop(reader, Arc::clone(&state), handler, shutdown));

        Self { state, timeout }
    }

    /// Send `request` and wait for its response.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Disconnected`] if the connection is closed
    /// before or while waiting, [`BackendError::TimedOut`] if the configured
    /// deadline passes, and [`BackendError::Encode`] or [`BackendError::Io`]
    /// when the request cannot be written.
    pub async fn call(&self, request: BackendMessage) -> Result<BackendMessage, BackendError> {
        crate::metrics::backend_call_started();
        let result = self.call_inner(request).await;
        crate::metrics::backend_call_finished();
        if let Err(err) = &result {
            crate::metrics::inc_backend_errors(err.kind());
            tracing::debug!(error = %err, "backend call failed");
        }
        result
    }

    async fn call_inner(&self, request: BackendMessage) -> Result<BackendMessage, BackendError> {
        let command = request.command.clone();
        let rx = {
            let mut state = self.state.lock().await;
            if state.closed {
                return Err(BackendError::Disconnected);
            }
            state.writer.send(request).await?;
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(tx);
            rx
        };
        tracing::trace!(%command, "backend request sent");

        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(outcome) => outcome,
                // The waiter stays queued so the late response is consumed in order.
                Err(_) => return Err(BackendError::TimedOut(limit)),
            },
            None => rx.await,
        };
        outcome.unwrap_or(Err(BackendError::Disconnected))
    }

    /// Send `request` and turn a backend-reported failure into an error.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`BackendChannel::call`] and
    /// [`BackendError::Remote`] when the response carries an `errorcode`.
    pub async fn execute(&self, request: BackendMessage) -> Result<BackendMessage, BackendError> {
        self.call(request).await?.into_result()
    }

    /// Number of requests still waiting for a response.
    pub async fn pending(&self) -> usize { self.state.lock().await.waiters.len() }

    /// Whether the connection has been closed.
    pub async fn is_closed(&self) -> bool { self.state.lock().await.closed }
}

#[expect(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! expands to modulus internally"
)]
async fn read_loop(
    mut reader: MessageStream,
    state: Arc<Mutex<State>>,
    handler: Arc<dyn NotificationHandler>,
    shutdown: CancellationToken,
) {
    loop {
        let next = select! {
            () = shutdown.cancelled() => break,
            next = reader.next() => next,
        };
        match next {
            Some(Ok(message)) if message.is_response() => deliver(&state, message).await,
            Some(Ok(notification)) => handler.handle(notification).await,
            Some(Err(err)) => {
                warn!("backend read failed: error={err}");
                break;
            }
            None => {
                info!("backend closed the connection");
                break;
            }
        }
    }

    let mut state = state.lock().await;
    state.closed = true;
    let abandoned = state.waiters.len();
    for waiter in state.waiters.drain(..) {
        let _ = waiter.send(Err(BackendError::Disconnected));
    }
    tracing::debug!(abandoned, "backend channel closed");
}

async fn deliver(state: &Mutex<State>, message: BackendMessage) {
    let waiter = state.lock().await.waiters.pop_front();
    match waiter {
        // A send error only means the caller gave up (timed out); the slot is still consumed.
        Some(waiter) => {
            let _ = waiter.send(Ok(message));
        }
        None => warn!("discarding backend response with no outstanding request"),
    }
}
