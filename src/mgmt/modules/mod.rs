//! Management modules and the routing between them.
//!
//! Each module owns one sub-namespace under the management prefix, parses
//! its verb into a private enum and answers with either a Control Response
//! or a status dataset.

mod cs;
mod faces;
mod fib;
pub mod rib;
mod status;
mod strategy_choice;

use crate::{
    backend::{BackendCommand, BackendMessage},
    control::{ControlParameters, ControlResponse, status as code},
    ndn::{Component, Name},
};

use super::{
    context::{MgmtContext, Request},
    dataset::VersionCounter,
};

/// Result of a write verb; both arms are sent back unchanged.
pub(crate) type Outcome = Result<ControlResponse, ControlResponse>;

/// Management sub-namespaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModuleKind {
    /// `cs`
    ContentStore,
    /// `faces`
    Faces,
    /// `fib`
    Fib,
    /// `rib`
    Rib,
    /// `status`
    Status,
    /// `strategy-choice`
    StrategyChoice,
}

impl ModuleKind {
    /// Parse the module component of a command name.
    #[must_use]
    pub fn from_component(component: &Component) -> Option<Self> {
        match component_str(component)? {
            "cs" => Some(Self::ContentStore),
            "faces" => Some(Self::Faces),
            "fib" => Some(Self::Fib),
            "rib" => Some(Self::Rib),
            "status" => Some(Self::Status),
            "strategy-choice" => Some(Self::StrategyChoice),
            _ => None,
        }
    }

    /// Name component of the module.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ContentStore => "cs",
            Self::Faces => "faces",
            Self::Fib => "fib",
            Self::Rib => "rib",
            Self::Status => "status",
            Self::StrategyChoice => "strategy-choice",
        }
    }

    /// Whether commands may arrive under `/localhop`.
    #[must_use]
    pub fn accepts_non_local(self) -> bool { matches!(self, Self::Rib) }
}

/// Every module with its dataset version counters.
#[derive(Debug, Default)]
pub struct ModuleSet {
    cs: cs::ContentStore,
    faces: faces::Faces,
    fib: fib::Fib,
    rib: rib::Rib,
    status: status::ForwarderStatus,
    strategy_choice: strategy_choice::StrategyChoice,
}

impl ModuleSet {
    /// Create the module set with fresh version counters.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Route `request` to its module.
    ///
    /// Unknown modules are answered with 501. Non-local commands for
    /// local-only modules are dropped without a response.
    pub async fn handle(&self, ctx: &MgmtContext, request: &Request) {
        let Some(kind) = request.module().and_then(ModuleKind::from_component) else {
            tracing::warn!(name = %request.name(), "command for unknown module");
            ctx.respond(
                request,
                "unknown",
                ControlResponse::new(code::NOT_IMPLEMENTED, "Unknown module"),
            )
            .await;
            return;
        };
        if !request.is_local() && !kind.accepts_non_local() {
            tracing::warn!(
                module = kind.as_str(),
                name = %request.name(),
                "non-local command for local-only module, dropping"
            );
            crate::metrics::inc_dropped("non_local");
            return;
        }
        match kind {
            ModuleKind::ContentStore => self.cs.handle(ctx, request).await,
            ModuleKind::Faces => self.faces.handle(ctx, request).await,
            ModuleKind::Fib => self.fib.handle(ctx, request).await,
            ModuleKind::Rib => self.rib.handle(ctx, request).await,
            ModuleKind::Status => self.status.handle(ctx, request).await,
            ModuleKind::StrategyChoice => self.strategy_choice.handle(ctx, request).await,
        }
    }
}

/// UTF-8 text of a generic component.
pub(crate) fn component_str(component: &Component) -> Option<&str> {
    if !component.is_generic() {
        return None;
    }
    std::str::from_utf8(component.value()).ok()
}

/// Text of the request's verb, or empty when absent or not text.
pub(crate) fn verb_str(request: &Request) -> &str {
    request.verb().and_then(component_str).unwrap_or_default()
}

pub(crate) async fn unknown_verb(ctx: &MgmtContext, request: &Request, module: &'static str) {
    tracing::warn!(module, verb = verb_str(request), "command for unknown verb");
    ctx.respond(
        request,
        module,
        ControlResponse::new(code::NOT_IMPLEMENTED, "Unknown verb"),
    )
    .await;
}

pub(crate) async fn reply(
    ctx: &MgmtContext,
    request: &Request,
    module: &'static str,
    outcome: Outcome,
) {
    let (Ok(response) | Err(response)) = outcome;
    ctx.respond(request, module, response).await;
}

/// 409 for Flags without Mask or the reverse.
pub(crate) fn check_flags_and_mask(params: &ControlParameters) -> Result<(), ControlResponse> {
    if params.flags_and_mask_paired() {
        return Ok(());
    }
    tracing::warn!("Flags and Mask must be both present or both absent");
    Err(ControlResponse::new(
        code::CONFLICT,
        "Incomplete Flags/Mask combination",
    ))
}

/// 410 unless the forwarder knows `face_id`.
pub(crate) async fn require_face(ctx: &MgmtContext, face_id: u64) -> Result<(), ControlResponse> {
    let reply = ctx
        .backend()
        .execute(BackendMessage {
            face_id,
            ..BackendMessage::request(BackendCommand::FaceId)
        })
        .await?;
    if reply.valid {
        return Ok(());
    }
    tracing::warn!(face_id, "face does not exist");
    Err(ControlResponse::new(code::GONE, "Face does not exist"))
}

/// `<local prefix>/<module>/<verb>`.
pub(crate) fn dataset_name(ctx: &MgmtContext, module: &'static str, verb: &'static str) -> Name {
    ctx.local_prefix()
        .append(Component::generic(module.as_bytes()))
        .append(Component::generic(verb.as_bytes()))
}

/// Fetch a dataset with `command` and publish it under `name`.
///
/// Requests naming a version or segment are ignored. A failed fetch is
/// answered with the Control Response of the backend error.
pub(crate) async fn serve_dataset(
    ctx: &MgmtContext,
    request: &Request,
    module: &'static str,
    name: &Name,
    counter: &VersionCounter,
    command: BackendMessage,
) {
    if request.has_suffix() {
        tracing::debug!(name = %request.name(), "ignoring dataset request with suffix");
        return;
    }
    publish_fetched(ctx, request, module, name, counter, command).await;
}

pub(crate) async fn publish_fetched(
    ctx: &MgmtContext,
    request: &Request,
    module: &'static str,
    name: &Name,
    counter: &VersionCounter,
    command: BackendMessage,
) {
    match ctx.backend().execute(command).await {
        Ok(reply) => {
            ctx.publish_dataset(request, module, name, counter.next(), &reply.dataset)
                .await;
        }
        Err(err) => ctx.respond(request, module, err.into()).await,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("cs", Some(ModuleKind::ContentStore))]
    #[case("faces", Some(ModuleKind::Faces))]
    #[case("strategy-choice", Some(ModuleKind::StrategyChoice))]
    #[case("bogus", None)]
    fn module_names_parse(#[case] text: &str, #[case] expected: Option<ModuleKind>) {
        let component = Component::generic(text.as_bytes().to_vec());
        let parsed = ModuleKind::from_component(&component);
        assert_eq!(parsed, expected);
        if let Some(kind) = parsed {
            assert_eq!(kind.as_str(), text);
        }
    }

    #[test]
    fn typed_components_are_not_modules() {
        assert_eq!(ModuleKind::from_component(&Component::segment(0)), None);
    }

    #[test]
    fn only_rib_accepts_localhop() {
        assert!(ModuleKind::Rib.accepts_non_local());
        assert!(!ModuleKind::Faces.accepts_non_local());
        assert!(!ModuleKind::Status.accepts_non_local());
    }

    #[rstest]
    #[case(Some(1), Some(1), true)]
    #[case(None, None, true)]
    #[case(Some(1), None, false)]
    #[case(None, Some(1), false)]
    fn flags_and_mask_must_pair(
        #[case] flags: Option<u64>,
        #[case] mask: Option<u64>,
        #[case] ok: bool,
    ) {
        let params = ControlParameters {
            flags,
            mask,
            ..ControlParameters::default()
        };
        let result = check_flags_and_mask(&params);
        assert_eq!(result.is_ok(), ok);
        if let Err(response) = result {
            assert_eq!(response.status_code, code::CONFLICT);
        }
    }
}
