//! Prefix registration.
//!
//! Registrations are kept in the bridge's [`RibTable`](crate::mgmt::RibTable)
//! and mirrored into the forwarder's FIB as next hops. This is the only
//! module reachable through `/localhop`.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::{select, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::{Outcome, dataset_name, reply, require_face, unknown_verb, verb_str};
use crate::{
    backend::{BackendCommand, BackendMessage},
    control::{ControlParameters, ControlResponse},
    mgmt::{
        context::{MgmtContext, Request, incorrect_parameters},
        dataset::VersionCounter,
        rib_table::{ROUTE_FLAG_CHILD_INHERIT, ROUTE_ORIGIN_APP, Route, Withdrawn},
    },
};

const MODULE: &str = "rib";

/// How often lapsed routes are swept.
pub const EXPIRY_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

enum Verb {
    Register,
    Unregister,
    List,
}

impl Verb {
    fn parse(text: &str) -> Option<Self> {
        match text {
            "register" => Some(Self::Register),
            "unregister" => Some(Self::Unregister),
            "list" => Some(Self::List),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub(super) struct Rib {
    list_version: VersionCounter,
}

impl Rib {
    pub(super) async fn handle(&self, ctx: &MgmtContext, request: &Request) {
        match Verb::parse(verb_str(request)) {
            Some(Verb::Register) => reply(ctx, request, MODULE, register(ctx, request).await).await,
            Some(Verb::Unregister) => {
                reply(ctx, request, MODULE, unregister(ctx, request).await).await;
            }
            Some(Verb::List) => self.list(ctx, request).await,
            None => unknown_verb(ctx, request, MODULE).await,
        }
    }

    async fn list(&self, ctx: &MgmtContext, request: &Request) {
        if request.has_suffix() {
            return;
        }
        let dataset = ctx.rib().encode_dataset(Instant::now());
        let name = dataset_name(ctx, MODULE, "list");
        ctx.publish_dataset(request, MODULE, &name, self.list_version.next(), &dataset)
            .await;
    }
}

async fn register(ctx: &MgmtContext, request: &Request) -> Outcome {
    let params = request.control_parameters()?;
    let Some(name) = params.name else {
        tracing::warn!(request = %request.name(), "missing Name");
        return Err(incorrect_parameters());
    };
    let face_id = request.face_or_incoming(params.face_id)?;
    require_face(ctx, face_id).await?;

    let route = Route {
        face_id,
        origin: params.origin.unwrap_or(ROUTE_ORIGIN_APP),
        cost: params.cost.unwrap_or(0),
        flags: params.flags.unwrap_or(ROUTE_FLAG_CHILD_INHERIT),
        expires_at: params
            .expiration_period
            .map(|ms| Instant::now() + Duration::from_millis(ms)),
    };

    ctx.backend()
        .execute(BackendMessage {
            name: name.to_string(),
            face_id,
            cost: route.cost,
            ..BackendMessage::request(BackendCommand::Insert)
        })
        .await?;

    tracing::info!(
        %name,
        face_id,
        origin = route.origin,
        cost = route.cost,
        "registered route"
    );
    let response = ControlParameters {
        name: Some(name.clone()),
        face_id: Some(face_id),
        origin: Some(route.origin),
        cost: Some(route.cost),
        flags: Some(route.flags),
        expiration_period: params.expiration_period,
        ..ControlParameters::default()
    };
    ctx.rib().insert(name, route);
    Ok(ControlResponse::ok(response))
}

async fn unregister(ctx: &MgmtContext, request: &Request) -> Outcome {
    let params = request.control_parameters()?;
    let Some(name) = params.name else {
        tracing::warn!(request = %request.name(), "missing Name");
        return Err(incorrect_parameters());
    };
    let face_id = request.face_or_incoming(params.face_id)?;
    let origin = params.origin.unwrap_or(ROUTE_ORIGIN_APP);

    match ctx.rib().remove(&name, face_id, origin) {
        Some(withdrawn) => {
            tracing::info!(%name, face_id, origin, "unregistered route");
            withdraw(ctx, &withdrawn).await;
        }
        None => tracing::debug!(%name, face_id, origin, "unregister of unknown route"),
    }

    Ok(ControlResponse::ok(ControlParameters {
        name: Some(name),
        face_id: Some(face_id),
        origin: Some(origin),
        ..ControlParameters::default()
    }))
}

/// Apply a RIB withdrawal to the forwarder's FIB.
///
/// The next hop stays while another origin still routes the prefix through
/// the same face. Backend failures are logged; the RIB change stands.
pub async fn withdraw(ctx: &MgmtContext, withdrawn: &Withdrawn) {
    let name = withdrawn.name.to_string();
    if !withdrawn.face_still_routed {
        let removal = BackendMessage {
            name: name.clone(),
            face_id: withdrawn.face_id,
            ..BackendMessage::request(BackendCommand::Remove)
        };
        if let Err(err) = ctx.backend().execute(removal).await {
            tracing::warn!(%name, face_id = withdrawn.face_id, error = %err, "next hop removal failed");
        }
    }
    if withdrawn.entry_empty {
        let clear = BackendMessage {
            name: name.clone(),
            ..BackendMessage::request(BackendCommand::Clear)
        };
        if let Err(err) = ctx.backend().execute(clear).await {
            tracing::warn!(%name, error = %err, "FIB entry clear failed");
        }
    }
}

/// Withdraw routes as their expiration period lapses until `shutdown`.
#[expect(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! expands to modulus internally"
)]
pub async fn expire_routes(ctx: Arc<MgmtContext>, every: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        select! {
            () = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }
        for withdrawn in ctx.rib().purge_expired(Instant::now()) {
            tracing::info!(name = %withdrawn.name, face_id = withdrawn.face_id, "route expired");
            withdraw(&ctx, &withdrawn).await;
        }
    }
    log::debug!("route expiry task stopped");
}
