//! Management command handling.
//!
//! The [`Dispatcher`] screens every inbound network packet, wraps the
//! management Interests in a [`Request`] and runs each on its own tracked
//! task so that a slow backend call never stalls the receive loop.

pub mod context;
pub mod dataset;
pub mod face_events;
pub mod modules;
pub mod notifications;
pub mod rib_table;

use std::sync::Arc;

pub use context::{LOCAL_PREFIX, MgmtContext, NON_LOCAL_PREFIX, Request};
pub use dataset::{Segmenter, VersionCounter};
pub use face_events::{FaceEvent, FaceEventKind, FaceEventLog};
pub use modules::{ModuleKind, ModuleSet};
pub use notifications::{NotificationQueue, process_notifications};
pub use rib_table::{RibTable, Route, Withdrawn};
use tokio::{io::AsyncRead, select};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::{
    ndn::NetPacket,
    transport::{InboundPacket, LinkReceiver},
};

/// Components in either management prefix.
pub const PREFIX_LEN: usize = 2;

/// Routes inbound management Interests to the module set.
#[derive(Clone)]
pub struct Dispatcher {
    ctx: Arc<MgmtContext>,
    modules: Arc<ModuleSet>,
}

impl Dispatcher {
    /// Create a dispatcher over `ctx` with a fresh module set.
    #[must_use]
    pub fn new(ctx: Arc<MgmtContext>) -> Self {
        Self {
            ctx,
            modules: Arc::new(ModuleSet::new()),
        }
    }

    /// Shared management state.
    #[must_use]
    pub fn context(&self) -> &Arc<MgmtContext> { &self.ctx }

    /// Turn an inbound packet into a management request.
    ///
    /// Returns `None`, counting the drop, for anything that is not an
    /// Interest under a management prefix naming at least a module and a
    /// verb.
    #[must_use]
    pub fn route(&self, packet: InboundPacket) -> Option<Request> {
        let interest = match NetPacket::decode(&packet.block) {
            Ok(NetPacket::Interest(interest)) => interest,
            Ok(NetPacket::Data(data)) => {
                tracing::debug!(name = %data.name(), "ignoring Data on management face");
                crate::metrics::inc_dropped("not_interest");
                return None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "dropping undecodable network packet");
                crate::metrics::inc_dropped("bad_packet");
                return None;
            }
        };

        let name = interest.name();
        let local = if self.ctx.local_prefix().is_prefix_of(name) {
            true
        } else if self.ctx.non_local_prefix().is_prefix_of(name) {
            false
        } else {
            tracing::info!(%name, "command has unexpected prefix, dropping");
            crate::metrics::inc_dropped("foreign_prefix");
            return None;
        };
        if name.len() < PREFIX_LEN + 2 {
            tracing::info!(%name, "command name too short, dropping");
            crate::metrics::inc_dropped("short_name");
            return None;
        }

        Some(Request::new(
            interest,
            packet.pit_token,
            packet.incoming_face_id,
            PREFIX_LEN,
            local,
        ))
    }

    /// Handle `packet` on a task tracked by `tracker`.
    pub fn dispatch(&self, packet: InboundPacket, tracker: &TaskTracker) {
        let Some(request) = self.route(packet) else {
            return;
        };
        tracing::debug!(name = %request.name(), face = ?request.incoming_face_id(), "received command");
        let ctx = Arc::clone(&self.ctx);
        let modules = Arc::clone(&self.modules);
        let label = request.name().to_string();
        crate::panic::spawn_guarded(tracker, "request", label, async move {
            modules.handle(&ctx, &request).await;
        });
    }

    /// Dispatch packets from `receiver` until the link closes or `shutdown`
    /// fires.
    #[expect(
        clippy::integer_division_remainder_used,
        reason = "tokio::select! expands to modulus internally"
    )]
    pub async fn run<R>(
        &self,
        receiver: &mut LinkReceiver<R>,
        tracker: &TaskTracker,
        shutdown: CancellationToken,
    ) where
        R: AsyncRead + Unpin,
    {
        loop {
            let packet = select! {
                () = shutdown.cancelled() => break,
                packet = receiver.recv() => match packet {
                    Some(packet) => packet,
                    None => break,
                },
            };
            self.dispatch(packet, tracker);
        }
        log::info!("management dispatcher stopped");
    }
}

#[cfg(test)]
mod tests;
