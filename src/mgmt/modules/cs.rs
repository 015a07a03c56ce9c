//! Content store management.

use super::{Outcome, check_flags_and_mask, dataset_name, reply, serve_dataset, unknown_verb, verb_str};
use crate::{
    backend::{BackendCommand, BackendMessage},
    control::{ControlParameters, ControlResponse},
    mgmt::{
        context::{MgmtContext, Request},
        dataset::VersionCounter,
    },
};

const MODULE: &str = "cs";

enum Verb {
    Config,
    Info,
}

impl Verb {
    fn parse(text: &str) -> Option<Self> {
        match text {
            "config" => Some(Self::Config),
            "info" => Some(Self::Info),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub(super) struct ContentStore {
    info_version: VersionCounter,
}

impl ContentStore {
    pub(super) async fn handle(&self, ctx: &MgmtContext, request: &Request) {
        match Verb::parse(verb_str(request)) {
            Some(Verb::Config) => reply(ctx, request, MODULE, config(ctx, request).await).await,
            Some(Verb::Info) => {
                let name = dataset_name(ctx, MODULE, "info");
                serve_dataset(
                    ctx,
                    request,
                    MODULE,
                    &name,
                    &self.info_version,
                    BackendMessage::request(BackendCommand::Info),
                )
                .await;
            }
            None => unknown_verb(ctx, request, MODULE).await,
        }
    }
}

async fn config(ctx: &MgmtContext, request: &Request) -> Outcome {
    let params = request.control_parameters()?;
    check_flags_and_mask(&params)?;

    if let Some(capacity) = params.capacity {
        tracing::info!(capacity, "setting content store capacity");
        ctx.backend()
            .execute(BackendMessage {
                capacity,
                ..BackendMessage::request(BackendCommand::Set)
            })
            .await?;
    }

    // Admit and serve flags are not implemented by the forwarder.
    Ok(ControlResponse::ok(ControlParameters {
        capacity: params.capacity,
        flags: Some(0),
        ..ControlParameters::default()
    }))
}
