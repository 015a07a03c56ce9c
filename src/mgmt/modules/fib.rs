//! FIB next hop management.

use super::{Outcome, dataset_name, reply, require_face, serve_dataset, unknown_verb, verb_str};
use crate::{
    backend::{BackendCommand, BackendMessage},
    control::{ControlParameters, ControlResponse},
    mgmt::{
        context::{MgmtContext, Request, incorrect_parameters},
        dataset::VersionCounter,
    },
};

const MODULE: &str = "fib";

enum Verb {
    AddNextHop,
    RemoveNextHop,
    List,
}

impl Verb {
    fn parse(text: &str) -> Option<Self> {
        match text {
            "add-nexthop" => Some(Self::AddNextHop),
            "remove-nexthop" => Some(Self::RemoveNextHop),
            "list" => Some(Self::List),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub(super) struct Fib {
    list_version: VersionCounter,
}

impl Fib {
    pub(super) async fn handle(&self, ctx: &MgmtContext, request: &Request) {
        match Verb::parse(verb_str(request)) {
            Some(Verb::AddNextHop) => {
                reply(ctx, request, MODULE, add_next_hop(ctx, request).await).await;
            }
            Some(Verb::RemoveNextHop) => {
                reply(ctx, request, MODULE, remove_next_hop(ctx, request).await).await;
            }
            Some(Verb::List) => {
                let name = dataset_name(ctx, MODULE, "list");
                serve_dataset(
                    ctx,
                    request,
                    MODULE,
                    &name,
                    &self.list_version,
                    BackendMessage::request(BackendCommand::List),
                )
                .await;
            }
            None => unknown_verb(ctx, request, MODULE).await,
        }
    }
}

async fn add_next_hop(ctx: &MgmtContext, request: &Request) -> Outcome {
    let params = request.control_parameters()?;
    let Some(name) = params.name else {
        tracing::warn!(request = %request.name(), "missing Name");
        return Err(incorrect_parameters());
    };
    let face_id = request.face_or_incoming(params.face_id)?;
    require_face(ctx, face_id).await?;
    let cost = params.cost.unwrap_or(0);

    ctx.backend()
        .execute(BackendMessage {
            name: name.to_string(),
            face_id,
            cost,
            ..BackendMessage::request(BackendCommand::Insert)
        })
        .await?;
    tracing::info!(%name, face_id, cost, "added next hop");

    Ok(ControlResponse::ok(ControlParameters {
        name: Some(name),
        face_id: Some(face_id),
        cost: Some(cost),
        ..ControlParameters::default()
    }))
}

async fn remove_next_hop(ctx: &MgmtContext, request: &Request) -> Outcome {
    let params = request.control_parameters()?;
    let Some(name) = params.name else {
        tracing::warn!(request = %request.name(), "missing Name");
        return Err(incorrect_parameters());
    };
    let face_id = request.face_or_incoming(params.face_id)?;

    ctx.backend()
        .execute(BackendMessage {
            name: name.to_string(),
            face_id,
            ..BackendMessage::request(BackendCommand::Remove)
        })
        .await?;
    tracing::info!(%name, face_id, "removed next hop");

    Ok(ControlResponse::ok(ControlParameters {
        name: Some(name),
        face_id: Some(face_id),
        ..ControlParameters::default()
    }))
}
