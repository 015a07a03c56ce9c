//! Forwarder status datasets.

use super::{dataset_name, serve_dataset, unknown_verb, verb_str};
use crate::{
    backend::{BackendCommand, BackendMessage},
    mgmt::{
        context::{MgmtContext, Request},
        dataset::VersionCounter,
    },
};

const MODULE: &str = "status";

#[derive(Debug, Default)]
pub(super) struct ForwarderStatus {
    general_version: VersionCounter,
}

impl ForwarderStatus {
    pub(super) async fn handle(&self, ctx: &MgmtContext, request: &Request) {
        if verb_str(request) != "general" {
            unknown_verb(ctx, request, MODULE).await;
            return;
        }
        let name = dataset_name(ctx, MODULE, "general");
        serve_dataset(
            ctx,
            request,
            MODULE,
            &name,
            &self.general_version,
            BackendMessage::request(BackendCommand::ForwarderStatus),
        )
        .await;
    }
}
