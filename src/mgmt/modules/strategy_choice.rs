//! Strategy choice management.

use super::{Outcome, dataset_name, reply, serve_dataset, unknown_verb, verb_str};
use crate::{
    backend::{BackendCommand, BackendMessage},
    control::{ControlParameters, ControlResponse, status},
    mgmt::{
        context::{MgmtContext, Request, incorrect_parameters},
        dataset::VersionCounter,
    },
    ndn::{Component, Name},
};

const MODULE: &str = "strategy-choice";

enum Verb {
    Set,
    Unset,
    List,
}

impl Verb {
    fn parse(text: &str) -> Option<Self> {
        match text {
            "set" => Some(Self::Set),
            "unset" => Some(Self::Unset),
            "list" => Some(Self::List),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub(super) struct StrategyChoice {
    list_version: VersionCounter,
}

impl StrategyChoice {
    pub(super) async fn handle(&self, ctx: &MgmtContext, request: &Request) {
        match Verb::parse(verb_str(request)) {
            Some(Verb::Set) => reply(ctx, request, MODULE, set(ctx, request).await).await,
            Some(Verb::Unset) => reply(ctx, request, MODULE, unset(ctx, request).await).await,
            Some(Verb::List) => {
                let name = dataset_name(ctx, MODULE, "list");
                serve_dataset(
                    ctx,
                    request,
                    MODULE,
                    &name,
                    &self.list_version,
                    BackendMessage::request(BackendCommand::ListStrategy),
                )
                .await;
            }
            None => unknown_verb(ctx, request, MODULE).await,
        }
    }
}

async fn set(ctx: &MgmtContext, request: &Request) -> Outcome {
    let params = request.control_parameters()?;
    let (Some(name), Some(strategy)) = (params.name, params.strategy) else {
        tracing::warn!(request = %request.name(), "missing Name or Strategy");
        return Err(incorrect_parameters());
    };

    let (base, requested) = split_version(&strategy);
    let reply = ctx
        .backend()
        .execute(BackendMessage {
            name: base.to_string(),
            ..BackendMessage::request(BackendCommand::Versions)
        })
        .await?;
    let strategy = resolve(&base, requested, &reply.versions)?;

    ctx.backend()
        .execute(BackendMessage {
            param_name: name.to_string(),
            strategy: strategy.to_string(),
            ..BackendMessage::request(BackendCommand::SetStrategy)
        })
        .await?;
    tracing::info!(%name, %strategy, "set strategy");

    Ok(ControlResponse::ok(ControlParameters {
        name: Some(name),
        strategy: Some(strategy),
        ..ControlParameters::default()
    }))
}

async fn unset(ctx: &MgmtContext, request: &Request) -> Outcome {
    let params = request.control_parameters()?;
    let Some(name) = params.name else {
        tracing::warn!(request = %request.name(), "missing Name");
        return Err(incorrect_parameters());
    };
    if name.is_empty() {
        tracing::warn!("refusing to unset the root strategy");
        return Err(incorrect_parameters());
    }

    ctx.backend()
        .execute(BackendMessage {
            param_name: name.to_string(),
            ..BackendMessage::request(BackendCommand::UnsetStrategy)
        })
        .await?;
    tracing::info!(%name, "unset strategy");

    Ok(ControlResponse::ok(ControlParameters {
        name: Some(name),
        ..ControlParameters::default()
    }))
}

/// Split a trailing version component off a strategy name.
fn split_version(strategy: &Name) -> (Name, Option<u64>) {
    match strategy.last().and_then(Component::as_version) {
        Some(version) => (strategy.prefix(strategy.len() - 1), Some(version)),
        None => (strategy.clone(), None),
    }
}

/// Pick the strategy instance to install.
fn resolve(base: &Name, requested: Option<u64>, available: &[u64]) -> Result<Name, ControlResponse> {
    let Some(&highest) = available.iter().max() else {
        tracing::warn!(strategy = %base, "unknown strategy");
        return Err(ControlResponse::new(status::NOT_FOUND, "Unknown strategy"));
    };
    match requested {
        None => Ok(base.append(Component::version(highest))),
        Some(version) if available.contains(&version) => Ok(base.append(Component::version(version))),
        Some(version) => {
            tracing::warn!(strategy = %base, version, "unknown strategy version");
            Err(ControlResponse::new(status::NOT_FOUND, "Unknown strategy version"))
        }
    }
}
