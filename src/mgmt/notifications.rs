//! Unsolicited backend notifications.
//!
//! The backend channel hands notifications to a [`NotificationQueue`]; a
//! single consumer task applies them in arrival order against the shared
//! [`MgmtContext`].

use std::sync::Arc;

use async_trait::async_trait;
use tokio::{select, sync::mpsc};
use tokio_util::sync::CancellationToken;

use super::{context::MgmtContext, face_events::FaceEventKind, modules::rib};
use crate::backend::{BackendMessage, NOTIFY_CLEAN, NotificationHandler};

/// Forwards backend notifications to [`process_notifications`].
#[derive(Clone, Debug)]
pub struct NotificationQueue(mpsc::UnboundedSender<BackendMessage>);

impl NotificationQueue {
    /// Create a queue and the receiver its consumer reads from.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BackendMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), rx)
    }
}

#[async_trait]
impl NotificationHandler for NotificationQueue {
    async fn handle(&self, notification: BackendMessage) {
        if self.0.send(notification).is_err() {
            tracing::debug!("notification consumer gone, dropping notification");
        }
    }
}

/// Apply notifications from `rx` until the queue closes or `shutdown` fires.
#[expect(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! expands to modulus internally"
)]
pub async fn process_notifications(
    ctx: Arc<MgmtContext>,
    mut rx: mpsc::UnboundedReceiver<BackendMessage>,
    shutdown: CancellationToken,
) {
    loop {
        let notification = select! {
            () = shutdown.cancelled() => break,
            next = rx.recv() => match next {
                Some(notification) => notification,
                None => break,
            },
        };
        apply(&ctx, notification).await;
    }
    log::debug!("notification task stopped");
}

async fn apply(ctx: &MgmtContext, notification: BackendMessage) {
    if notification.command != NOTIFY_CLEAN {
        tracing::warn!(command = %notification.command, "unknown backend notification");
        return;
    }

    let face_id = notification.face_id;
    let withdrawn = ctx.rib().clean_up_face(face_id);
    tracing::info!(face_id, routes = withdrawn.len(), "face removed, cleaning up routes");
    for route in &withdrawn {
        rib::withdraw(ctx, route).await;
    }

    let event = ctx.face_events().record(
        FaceEventKind::Destroyed,
        face_id,
        notification.uri,
        notification.local_uri,
    );
    ctx.publish("faces", &event.to_data(ctx.local_prefix())).await;
}
