//! Shared state handed to every management module.

use bytes::Bytes;

use super::{dataset::Segmenter, face_events::FaceEventLog, rib_table::RibTable};
use crate::{
    backend::BackendChannel,
    config::BridgeConfig,
    control::{ControlParameters, ControlResponse, status},
    ndn::{Component, Data, Interest, Name},
    transport::{OutboundPacket, ResponseSink},
};

/// Local management prefix.
pub const LOCAL_PREFIX: &str = "/localhost/nfd";
/// Non-local management prefix used for remote prefix registration.
pub const NON_LOCAL_PREFIX: &str = "/localhop/nfd";

/// One validated management Interest.
#[derive(Clone, Debug)]
pub struct Request {
    interest: Interest,
    pit_token: Option<Bytes>,
    incoming_face_id: Option<u64>,
    prefix_len: usize,
    local: bool,
}

impl Request {
    /// Wrap an Interest that has already been matched against a management
    /// prefix of `prefix_len` components.
    #[must_use]
    pub fn new(
        interest: Interest,
        pit_token: Option<Bytes>,
        incoming_face_id: Option<u64>,
        prefix_len: usize,
        local: bool,
    ) -> Self {
        Self {
            interest,
            pit_token,
            incoming_face_id,
            prefix_len,
            local,
        }
    }

    /// The command Interest.
    #[must_use]
    pub fn interest(&self) -> &Interest { &self.interest }

    /// The command name.
    #[must_use]
    pub fn name(&self) -> &Name { self.interest.name() }

    /// PIT token to echo on replies.
    #[must_use]
    pub fn pit_token(&self) -> Option<&Bytes> { self.pit_token.as_ref() }

    /// Face the command arrived on.
    #[must_use]
    pub fn incoming_face_id(&self) -> Option<u64> { self.incoming_face_id }

    /// Whether the command arrived under the `/localhost` prefix.
    #[must_use]
    pub fn is_local(&self) -> bool { self.local }

    /// The module component.
    #[must_use]
    pub fn module(&self) -> Option<&Component> { self.name().get(self.prefix_len) }

    /// The verb component.
    #[must_use]
    pub fn verb(&self) -> Option<&Component> { self.name().get(self.prefix_len + 1) }

    /// The component following the verb, which carries the arguments.
    #[must_use]
    pub fn argument(&self) -> Option<&Component> { self.name().get(self.prefix_len + 2) }

    /// Whether the name goes beyond `<prefix>/<module>/<verb>`.
    ///
    /// Dataset requests with extra components ask for a specific version or
    /// segment that the bridge does not cache.
    #[must_use]
    pub fn has_suffix(&self) -> bool { self.name().len() > self.prefix_len + 2 }

    /// Decode the ControlParameters argument.
    ///
    /// # Errors
    ///
    /// Returns a 400 Control Response when the argument is absent or
    /// malformed.
    pub fn control_parameters(&self) -> Result<ControlParameters, ControlResponse> {
        let Some(argument) = self.argument() else {
            tracing::warn!(name = %self.name(), "missing ControlParameters");
            return Err(incorrect_parameters());
        };
        ControlParameters::from_component(argument).map_err(|err| {
            tracing::warn!(name = %self.name(), error = %err, "undecodable ControlParameters");
            incorrect_parameters()
        })
    }

    /// `face_id` unless absent or zero, else the incoming face.
    ///
    /// # Errors
    ///
    /// Returns a 400 Control Response when neither is known.
    pub fn face_or_incoming(&self, face_id: Option<u64>) -> Result<u64, ControlResponse> {
        face_id
            .filter(|&id| id != 0)
            .or(self.incoming_face_id)
            .ok_or_else(|| ControlResponse::new(status::BAD_REQUEST, "FaceId is required"))
    }
}

/// The 400 response for a missing or malformed argument.
#[must_use]
pub fn incorrect_parameters() -> ControlResponse {
    ControlResponse::new(status::BAD_REQUEST, "ControlParameters is incorrect")
}

/// Process-wide management state.
pub struct MgmtContext {
    backend: BackendChannel,
    sink: ResponseSink,
    rib: RibTable,
    face_events: FaceEventLog,
    segmenter: Segmenter,
    local_prefix: Name,
    non_local_prefix: Name,
}

impl MgmtContext {
    /// Assemble the context from its collaborators.
    #[must_use]
    pub fn new(backend: BackendChannel, sink: ResponseSink, config: &BridgeConfig) -> Self {
        Self {
            backend,
            sink,
            rib: RibTable::new(),
            face_events: FaceEventLog::new(config.face_event_capacity),
            segmenter: Segmenter::new(config.segment_size, config.dataset_freshness)
                .with_packet_ceiling(config.max_packet_size),
            local_prefix: prefix(LOCAL_PREFIX),
            non_local_prefix: prefix(NON_LOCAL_PREFIX),
        }
    }

    /// The backend command channel.
    #[must_use]
    pub fn backend(&self) -> &BackendChannel { &self.backend }

    /// The bridge's RIB.
    #[must_use]
    pub fn rib(&self) -> &RibTable { &self.rib }

    /// The face event log.
    #[must_use]
    pub fn face_events(&self) -> &FaceEventLog { &self.face_events }

    /// `/localhost/nfd`.
    #[must_use]
    pub fn local_prefix(&self) -> &Name { &self.local_prefix }

    /// `/localhop/nfd`.
    #[must_use]
    pub fn non_local_prefix(&self) -> &Name { &self.non_local_prefix }

    /// Send `response` as the Content of a Data named after the request.
    pub async fn respond(&self, request: &Request, module: &'static str, response: ControlResponse) {
        tracing::debug!(
            name = %request.name(),
            status = response.status_code,
            "sending control response"
        );
        let data = Data::new(request.name().clone(), response.encode().to_bytes());
        self.reply_data(request, module, &data).await;
    }

    /// Publish `dataset` as segments of `<name>/v=<version>`.
    pub async fn publish_dataset(
        &self,
        request: &Request,
        module: &'static str,
        name: &Name,
        version: u64,
        dataset: &Bytes,
    ) {
        let segments = self.segmenter.segment(name, version, dataset);
        let count = segments.len();
        for segment in &segments {
            self.reply_data(request, module, segment).await;
        }
        tracing::trace!(%name, version, segments = count, "published dataset");
    }

    /// Send an unsolicited Data packet.
    pub async fn publish(&self, module: &'static str, data: &Data) {
        if self
            .sink
            .send(OutboundPacket {
                wire: data.to_bytes(),
                pit_token: None,
                next_hop_face_id: None,
            })
            .await
        {
            crate::metrics::inc_responses(module);
        }
    }

    /// Send `data` back towards the requester.
    pub async fn reply_data(&self, request: &Request, module: &'static str, data: &Data) {
        let sent = self
            .sink
            .send(OutboundPacket {
                wire: data.to_bytes(),
                pit_token: request.pit_token.clone(),
                next_hop_face_id: request.incoming_face_id,
            })
            .await;
        if sent {
            crate::metrics::inc_responses(module);
        }
    }
}

fn prefix(uri: &str) -> Name {
    uri.split('/')
        .filter(|segment| !segment.is_empty())
        .fold(Name::root(), |name, segment| {
            name.append(Component::generic(Bytes::copy_from_slice(segment.as_bytes())))
        })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn request(uri: &str, incoming: Option<u64>) -> Request {
        let name: Name = uri.parse().expect("name");
        Request::new(Interest::new(name), None, incoming, 2, true)
    }

    #[test]
    fn prefixes_parse_to_two_components() {
        assert_eq!(prefix(LOCAL_PREFIX).to_string(), LOCAL_PREFIX);
        assert_eq!(prefix(NON_LOCAL_PREFIX).len(), 2);
    }

    #[test]
    fn components_are_located_after_prefix() {
        let request = request("/localhost/nfd/faces/list/extra", None);
        assert_eq!(request.module().map(ToString::to_string).as_deref(), Some("faces"));
        assert_eq!(request.verb().map(ToString::to_string).as_deref(), Some("list"));
        assert!(request.has_suffix());
    }

    #[test]
    fn missing_parameters_are_a_bad_request() {
        let err = request("/localhost/nfd/faces/create", None)
            .control_parameters()
            .expect_err("no parameters");
        assert_eq!(err.status_code, status::BAD_REQUEST);
    }

    #[test]
    fn garbage_parameters_are_a_bad_request() {
        let err = request("/localhost/nfd/faces/create/junk", None)
            .control_parameters()
            .expect_err("bad parameters");
        assert_eq!(err.status_code, status::BAD_REQUEST);
    }

    #[rstest]
    #[case(Some(5), Some(9), Ok(5))]
    #[case(Some(0), Some(9), Ok(9))]
    #[case(None, Some(9), Ok(9))]
    #[case(None, None, Err(status::BAD_REQUEST))]
    fn face_defaults_to_incoming(
        #[case] given: Option<u64>,
        #[case] incoming: Option<u64>,
        #[case] expected: Result<u64, u32>,
    ) {
        let request = request("/localhost/nfd/fib/add-nexthop", incoming);
        let got = request.face_or_incoming(given).map_err(|r| r.status_code);
        assert_eq!(got, expected);
    }
}
