//! Face management and face event delivery.

use super::{
    Outcome,
    check_flags_and_mask,
    dataset_name,
    publish_fetched,
    reply,
    serve_dataset,
    unknown_verb,
    verb_str,
};
use crate::{
    backend::{BackendCommand, BackendMessage},
    control::{ControlResponse, FaceQueryFilter, face_uri, status},
    mgmt::{
        context::{MgmtContext, Request, incorrect_parameters},
        dataset::VersionCounter,
    },
};

const MODULE: &str = "faces";

enum Verb {
    Create,
    Update,
    Destroy,
    List,
    Query,
    Channels,
    Events,
}

impl Verb {
    fn parse(text: &str) -> Option<Self> {
        match text {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "destroy" => Some(Self::Destroy),
            "list" => Some(Self::List),
            "query" => Some(Self::Query),
            "channels" => Some(Self::Channels),
            "events" => Some(Self::Events),
            _ => None,
        }
    }
}

/// `list` and `query` publish under one version sequence.
#[derive(Debug, Default)]
pub(super) struct Faces {
    face_version: VersionCounter,
    channel_version: VersionCounter,
}

impl Faces {
    pub(super) async fn handle(&self, ctx: &MgmtContext, request: &Request) {
        match Verb::parse(verb_str(request)) {
            Some(Verb::Create) => reply(ctx, request, MODULE, create(ctx, request).await).await,
            Some(Verb::Update) => reply(ctx, request, MODULE, update(ctx, request).await).await,
            Some(Verb::Destroy) => reply(ctx, request, MODULE, destroy(ctx, request).await).await,
            Some(Verb::List) => {
                let name = dataset_name(ctx, MODULE, "list");
                serve_dataset(
                    ctx,
                    request,
                    MODULE,
                    &name,
                    &self.face_version,
                    BackendMessage::request(BackendCommand::ListFace),
                )
                .await;
            }
            Some(Verb::Query) => self.query(ctx, request).await,
            Some(Verb::Channels) => {
                let name = dataset_name(ctx, MODULE, "channels");
                serve_dataset(
                    ctx,
                    request,
                    MODULE,
                    &name,
                    &self.channel_version,
                    BackendMessage::request(BackendCommand::Channels),
                )
                .await;
            }
            Some(Verb::Events) => events(ctx, request).await,
            None => unknown_verb(ctx, request, MODULE).await,
        }
    }

    async fn query(&self, ctx: &MgmtContext, request: &Request) {
        let Some(argument) = request.argument() else {
            tracing::warn!(name = %request.name(), "missing FaceQueryFilter");
            return;
        };
        let filter = match FaceQueryFilter::from_component(argument) {
            Ok(filter) => filter,
            Err(err) => {
                tracing::warn!(name = %request.name(), error = %err, "undecodable FaceQueryFilter");
                return;
            }
        };
        let command = BackendMessage {
            filter: Some(filter),
            ..BackendMessage::request(BackendCommand::Query)
        };
        publish_fetched(
            ctx,
            request,
            MODULE,
            request.name(),
            &self.face_version,
            command,
        )
        .await;
    }
}

async fn create(ctx: &MgmtContext, request: &Request) -> Outcome {
    let mut params = request.control_parameters()?;
    let Some(uri) = params.uri.take() else {
        tracing::warn!(name = %request.name(), "missing Uri");
        return Err(incorrect_parameters());
    };
    let canonical = face_uri::canonize(&uri).await.map_err(|err| {
        tracing::warn!(name = %request.name(), %uri, error = %err, "cannot canonize remote Uri");
        ControlResponse::new(status::NOT_ACCEPTABLE, "URI could not be canonized")
    })?;
    params.uri = Some(canonical);
    check_flags_and_mask(&params)?;

    let reply = ctx
        .backend()
        .execute(BackendMessage {
            control_params: Some(params),
            ..BackendMessage::request(BackendCommand::CreateFace)
        })
        .await?;
    relay(reply)
}

async fn update(ctx: &MgmtContext, request: &Request) -> Outcome {
    let mut params = request.control_parameters()?;
    let face_id = request.face_or_incoming(params.face_id)?;
    check_flags_and_mask(&params)?;
    params.face_id = Some(face_id);

    let reply = ctx
        .backend()
        .execute(BackendMessage {
            face_id,
            control_params: Some(params),
            ..BackendMessage::request(BackendCommand::UpdateFace)
        })
        .await?;
    relay(reply)
}

async fn destroy(ctx: &MgmtContext, request: &Request) -> Outcome {
    let params = request.control_parameters()?;
    let Some(face_id) = params.face_id else {
        tracing::warn!(name = %request.name(), "missing FaceId");
        return Err(incorrect_parameters());
    };

    ctx.backend()
        .execute(BackendMessage {
            face_id,
            ..BackendMessage::request(BackendCommand::DestroyFace)
        })
        .await?;
    tracing::info!(face_id, "destroyed face");
    Ok(ControlResponse::ok(params))
}

/// Pass on the Control Response the forwarder built.
fn relay(reply: BackendMessage) -> Outcome {
    reply.control_response.ok_or_else(|| {
        tracing::error!("backend reply carries no controlresponse");
        ControlResponse::new(status::INTERNAL_ERROR, "Internal error")
    })
}

async fn events(ctx: &MgmtContext, request: &Request) {
    let event = match request.argument() {
        None if !request.interest().can_be_prefix() => {
            tracing::info!(
                name = %request.name(),
                "face event prefix Interest without CanBePrefix"
            );
            return;
        }
        None => ctx.face_events().last(),
        Some(component) => {
            let Some(id) = component.as_sequence_num() else {
                tracing::info!(name = %request.name(), "illegible face event id");
                return;
            };
            ctx.face_events().get(id)
        }
    };
    let Some(event) = event else {
        tracing::debug!(name = %request.name(), "no such face event");
        return;
    };
    let data = event.to_data(ctx.local_prefix());
    ctx.reply_data(request, MODULE, &data).await;
}
