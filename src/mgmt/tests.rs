//! Tests for command routing and the management modules.

use std::{sync::Arc, time::Duration};

use futures::{SinkExt, StreamExt};
use rstest::rstest;
use tokio::{
    io::{DuplexStream, duplex},
    sync::mpsc,
};
use tokio_util::{codec::Framed, sync::CancellationToken, task::TaskTracker};
use tracing_test::traced_test;

use super::*;
use crate::{
    backend::{BackendChannel, BackendMessage, JsonStream, JsonStreamCodec, NOTIFY_CLEAN},
    config::BridgeConfig,
    control::{ControlParameters, ControlResponse, status},
    ndn::{Component, Data, Interest, Name},
    tlv::Block,
    transport::{OutboundPacket, ResponseSink},
};

type Script = Box<dyn Fn(&BackendMessage) -> BackendMessage + Send + Sync>;

struct Harness {
    dispatcher: Dispatcher,
    outbound: mpsc::Receiver<OutboundPacket>,
    seen: mpsc::UnboundedReceiver<BackendMessage>,
    notifications: Option<mpsc::UnboundedReceiver<BackendMessage>>,
    backend_tx: mpsc::UnboundedSender<BackendMessage>,
    shutdown: CancellationToken,
}

impl Drop for Harness {
    fn drop(&mut self) { self.shutdown.cancel(); }
}

/// Serve every backend request with `script`; records may also be pushed
/// unsolicited through `Harness::backend_tx`.
fn spawn_backend(
    stream: DuplexStream,
    script: Script,
    seen: mpsc::UnboundedSender<BackendMessage>,
    mut pushed: mpsc::UnboundedReceiver<BackendMessage>,
) {
    tokio::spawn(async move {
        let mut framed = Framed::new(stream, JsonStreamCodec::<BackendMessage>::default());
        loop {
            tokio::select! {
                request = framed.next() => {
                    let Some(Ok(request)) = request else { break };
                    let reply = script(&request);
                    let _ = seen.send(request);
                    if framed.send(reply).await.is_err() {
                        break;
                    }
                }
                Some(record) = pushed.recv() => {
                    if framed.send(record).await.is_err() {
                        break;
                    }
                }
            }
        }
    });
}

fn harness(script: Script) -> Harness {
    let (ours, theirs) = duplex(256 * 1024);
    let (seen_tx, seen) = mpsc::unbounded_channel();
    let (backend_tx, pushed) = mpsc::unbounded_channel();
    spawn_backend(theirs, script, seen_tx, pushed);

    let shutdown = CancellationToken::new();
    let (queue, notifications) = NotificationQueue::new();
    let backend = BackendChannel::spawn(
        JsonStream(ours),
        Arc::new(queue),
        Some(Duration::from_secs(5)),
        &TaskTracker::new(),
        shutdown.clone(),
    );
    let (sink, outbound) = ResponseSink::channel(64);
    let ctx = Arc::new(MgmtContext::new(
        backend,
        sink,
        &BridgeConfig::default().segment_size(100),
    ));
    Harness {
        dispatcher: Dispatcher::new(ctx),
        outbound,
        seen,
        notifications: Some(notifications),
        backend_tx,
        shutdown,
    }
}

fn ok_backend() -> Script { Box::new(|_| BackendMessage::response()) }

fn name(uri: &str) -> Name { uri.parse().expect("name") }

fn command(uri: &str, params: Option<&ControlParameters>) -> Interest {
    let mut name = name(uri);
    if let Some(params) = params {
        name = name.append(params.to_component());
    }
    Interest::new(name)
}

fn packet(interest: &Interest, incoming_face_id: Option<u64>) -> InboundPacket {
    InboundPacket {
        block: interest.encode(),
        pit_token: Some(bytes::Bytes::from_static(b"\x01\x02")),
        incoming_face_id,
        congestion_mark: None,
    }
}

impl Harness {
    async fn handle(&self, interest: &Interest, incoming_face_id: Option<u64>) {
        let request = self
            .dispatcher
            .route(packet(interest, incoming_face_id))
            .expect("routable command");
        self.dispatcher
            .modules
            .handle(self.dispatcher.context(), &request)
            .await;
    }

    fn next_data(&mut self) -> (OutboundPacket, Data) {
        let out = self.outbound.try_recv().expect("a response was sent");
        let (block, _) = Block::decode(&out.wire).expect("block");
        let data = Data::decode(&block).expect("data");
        (out, data)
    }

    fn next_response(&mut self) -> ControlResponse {
        let (_, data) = self.next_data();
        let (block, _) = Block::decode(data.content()).expect("response block");
        ControlResponse::decode(&block).expect("control response")
    }
}

#[rstest]
#[case::data(Data::new(name("/localhost/nfd/faces/list"), &b""[..]).encode())]
#[case::foreign_prefix(Interest::new(name("/unknown/nfd/faces/create")).encode())]
#[case::short_name(Interest::new(name("/localhost/nfd/faces")).encode())]
#[case::not_a_packet(Block::new(0x80, &b"x"[..]))]
#[tokio::test]
async fn unroutable_packets_are_dropped(#[case] block: Block) {
    let harness = harness(ok_backend());
    let inbound = InboundPacket {
        block,
        pit_token: None,
        incoming_face_id: None,
        congestion_mark: None,
    };
    assert!(harness.dispatcher.route(inbound).is_none());
}

#[traced_test]
#[tokio::test]
async fn foreign_prefix_drop_is_logged() {
    let harness = harness(ok_backend());
    let interest = command("/example/nfd/faces/list", None);
    assert!(harness.dispatcher.route(packet(&interest, None)).is_none());
    assert!(logs_contain("command has unexpected prefix"));
}

#[tokio::test]
async fn localhop_commands_are_routed_as_non_local() {
    let harness = harness(ok_backend());
    let request = harness
        .dispatcher
        .route(packet(&command("/localhop/nfd/rib/register", None), Some(3)))
        .expect("routed");
    assert!(!request.is_local());
    assert_eq!(request.incoming_face_id(), Some(3));
}

#[tokio::test]
async fn unknown_module_is_not_implemented() {
    let mut harness = harness(ok_backend());
    let interest = command("/localhost/nfd/bogus/list", None);
    harness.handle(&interest, Some(1)).await;
    let (out, data) = harness.next_data();
    assert_eq!(data.name(), interest.name());
    assert_eq!(out.pit_token.as_deref(), Some(&b"\x01\x02"[..]));
    assert_eq!(out.next_hop_face_id, Some(1));

    let (block, _) = Block::decode(data.content()).expect("block");
    let response = ControlResponse::decode(&block).expect("response");
    assert_eq!(response.status_code, status::NOT_IMPLEMENTED);
    assert_eq!(response.status_text, "Unknown module");
}

#[tokio::test]
async fn unknown_verb_is_not_implemented() {
    let mut harness = harness(ok_backend());
    harness.handle(&command("/localhost/nfd/cs/erase", None), None).await;
    let response = harness.next_response();
    assert_eq!(response.status_code, status::NOT_IMPLEMENTED);
    assert_eq!(response.status_text, "Unknown verb");
}

#[tokio::test]
async fn non_local_face_commands_are_dropped() {
    let mut harness = harness(ok_backend());
    harness.handle(&command("/localhop/nfd/faces/list", None), None).await;
    assert!(harness.outbound.try_recv().is_err());
}

#[rstest]
#[case::create_without_parameters("/localhost/nfd/faces/create", None, status::BAD_REQUEST)]
#[case::create_without_uri(
    "/localhost/nfd/faces/create",
    Some(ControlParameters { face_id: Some(1), ..ControlParameters::default() }),
    status::BAD_REQUEST
)]
#[case::flags_without_mask(
    "/localhost/nfd/faces/create",
    Some(ControlParameters {
        uri: Some("udp4://192.0.2.1:6363".to_owned()),
        flags: Some(1),
        ..ControlParameters::default()
    }),
    status::CONFLICT
)]
#[case::uncanonizable_uri(
    "/localhost/nfd/faces/create",
    Some(ControlParameters {
        uri: Some("udp4://[2001:db8::1]".to_owned()),
        ..ControlParameters::default()
    }),
    status::NOT_ACCEPTABLE
)]
#[case::unknown_scheme(
    "/localhost/nfd/faces/create",
    Some(ControlParameters {
        uri: Some("gopher://192.0.2.1".to_owned()),
        ..ControlParameters::default()
    }),
    status::NOT_ACCEPTABLE
)]
#[case::destroy_without_face("/localhost/nfd/faces/destroy", Some(ControlParameters::default()), status::BAD_REQUEST)]
#[case::unset_root(
    "/localhost/nfd/strategy-choice/unset",
    Some(ControlParameters { name: Some(Name::root()), ..ControlParameters::default() }),
    status::BAD_REQUEST
)]
#[tokio::test]
async fn malformed_commands_never_reach_the_backend(
    #[case] uri: &str,
    #[case] params: Option<ControlParameters>,
    #[case] expected: u32,
) {
    let mut harness = harness(ok_backend());
    harness.handle(&command(uri, params.as_ref()), None).await;
    assert_eq!(harness.next_response().status_code, expected);
    assert!(harness.seen.try_recv().is_err());
}

#[tokio::test]
async fn face_create_relays_the_forwarder_response() {
    let mut harness = harness(Box::new(|request| BackendMessage {
        control_response: Some(ControlResponse::ok(ControlParameters {
            face_id: Some(262),
            ..request.control_params.clone().unwrap_or_default()
        })),
        ..BackendMessage::response()
    }));
    let params = ControlParameters {
        uri: Some("udp4://192.0.2.1:6363".to_owned()),
        ..ControlParameters::default()
    };
    harness
        .handle(&command("/localhost/nfd/faces/create", Some(&params)), Some(1))
        .await;

    let response = harness.next_response();
    assert_eq!(response.status_code, status::OK);
    assert_eq!(response.body.and_then(|body| body.face_id), Some(262));
    let sent = harness.seen.try_recv().expect("backend request");
    assert_eq!(sent.command, "createface");
    assert_eq!(sent.control_params, Some(params));
}

#[tokio::test]
async fn face_create_forwards_the_canonical_uri() {
    let mut harness = harness(ok_backend());
    let params = ControlParameters {
        uri: Some("udp://192.0.2.1".to_owned()),
        ..ControlParameters::default()
    };
    harness
        .handle(&command("/localhost/nfd/faces/create", Some(&params)), None)
        .await;
    let _ = harness.next_response();
    let sent = harness.seen.try_recv().expect("backend request");
    assert_eq!(
        sent.control_params.and_then(|params| params.uri).as_deref(),
        Some("udp4://192.0.2.1:6363")
    );
}

#[tokio::test]
async fn face_create_without_embedded_response_is_internal_error() {
    let mut harness = harness(ok_backend());
    let params = ControlParameters {
        uri: Some("udp4://192.0.2.1:6363".to_owned()),
        ..ControlParameters::default()
    };
    harness
        .handle(&command("/localhost/nfd/faces/create", Some(&params)), None)
        .await;
    assert_eq!(harness.next_response().status_code, status::INTERNAL_ERROR);
}

#[tokio::test]
async fn status_versions_increase_by_one() {
    let mut harness = harness(Box::new(|_| BackendMessage {
        dataset: bytes::Bytes::from_static(b"\x80\x00"),
        ..BackendMessage::response()
    }));
    let interest = command("/localhost/nfd/status/general", None);
    harness.handle(&interest, Some(1)).await;
    harness.handle(&interest, Some(1)).await;

    let versions: Vec<u64> = (0..2)
        .map(|_| {
            let (_, data) = harness.next_data();
            assert_eq!(data.content().as_ref(), b"\x80\x00");
            data.name()
                .get(4)
                .and_then(Component::as_version)
                .expect("version component")
        })
        .collect();
    assert_eq!(versions[1], versions[0] + 1);
    assert_eq!(harness.seen.try_recv().expect("request").command, "forwarderstatus");
}

#[tokio::test]
async fn dataset_requests_with_suffix_are_ignored() {
    let mut harness = harness(ok_backend());
    harness
        .handle(&command("/localhost/nfd/faces/list/v=3", None), None)
        .await;
    assert!(harness.outbound.try_recv().is_err());
    assert!(harness.seen.try_recv().is_err());
}

#[tokio::test]
async fn large_datasets_are_segmented() {
    let mut harness = harness(Box::new(|_| BackendMessage {
        dataset: bytes::Bytes::from(vec![9_u8; 250]),
        ..BackendMessage::response()
    }));
    harness.handle(&command("/localhost/nfd/fib/list", None), None).await;
    let mut total = 0;
    for index in 0..3_u64 {
        let (_, data) = harness.next_data();
        assert_eq!(data.name().last().and_then(Component::as_segment), Some(index));
        assert_eq!(data.final_block_id().and_then(Component::as_segment), Some(2));
        total += data.content().len();
    }
    assert_eq!(total, 250);
}

fn face_checking_backend(valid_face: u64) -> Script {
    Box::new(move |request| BackendMessage {
        valid: request.command == "faceid" && request.face_id == valid_face,
        ..BackendMessage::response()
    })
}

#[tokio::test]
async fn rib_register_defaults_and_records_route() {
    let mut harness = harness(face_checking_backend(7));
    let params = ControlParameters {
        name: Some(name("/ndn/app")),
        ..ControlParameters::default()
    };
    harness
        .handle(&command("/localhost/nfd/rib/register", Some(&params)), Some(7))
        .await;

    let body = harness.next_response().body.expect("body");
    assert_eq!(body.face_id, Some(7));
    assert_eq!(body.origin, Some(0));
    assert_eq!(body.cost, Some(0));
    assert_eq!(body.flags, Some(1));

    let commands: Vec<String> = std::iter::from_fn(|| harness.seen.try_recv().ok())
        .map(|m| m.command)
        .collect();
    assert_eq!(commands, ["faceid", "insert"]);
    assert_eq!(harness.dispatcher.context().rib().routes(&name("/ndn/app")).len(), 1);
}

#[tokio::test]
async fn rib_register_on_unknown_face_is_gone() {
    let mut harness = harness(face_checking_backend(7));
    let params = ControlParameters {
        name: Some(name("/ndn/app")),
        face_id: Some(8),
        ..ControlParameters::default()
    };
    harness
        .handle(&command("/localhop/nfd/rib/register", Some(&params)), Some(7))
        .await;
    assert_eq!(harness.next_response().status_code, status::GONE);
    assert!(harness.dispatcher.context().rib().is_empty());
}

#[tokio::test]
async fn rib_unregister_clears_the_fib_entry() {
    let mut harness = harness(face_checking_backend(7));
    let params = ControlParameters {
        name: Some(name("/ndn/app")),
        ..ControlParameters::default()
    };
    harness
        .handle(&command("/localhost/nfd/rib/register", Some(&params)), Some(7))
        .await;
    harness
        .handle(&command("/localhost/nfd/rib/unregister", Some(&params)), Some(7))
        .await;

    assert_eq!(harness.next_response().status_code, status::OK);
    assert_eq!(harness.next_response().status_code, status::OK);
    let commands: Vec<String> = std::iter::from_fn(|| harness.seen.try_recv().ok())
        .map(|m| m.command)
        .collect();
    assert_eq!(commands, ["faceid", "insert", "remove", "clear"]);
    assert!(harness.dispatcher.context().rib().is_empty());
}

#[tokio::test]
async fn strategy_set_appends_highest_version() {
    let mut harness = harness(Box::new(|request| BackendMessage {
        versions: if request.command == "versions" { vec![1, 3, 2] } else { Vec::new() },
        ..BackendMessage::response()
    }));
    let params = ControlParameters {
        name: Some(name("/ndn")),
        strategy: Some(name("/localhost/nfd/strategy/best-route")),
        ..ControlParameters::default()
    };
    harness
        .handle(&command("/localhost/nfd/strategy-choice/set", Some(&params)), None)
        .await;

    let body = harness.next_response().body.expect("body");
    assert_eq!(
        body.strategy.map(|s| s.to_string()).as_deref(),
        Some("/localhost/nfd/strategy/best-route/v=3")
    );
    let _versions = harness.seen.try_recv().expect("versions");
    let set = harness.seen.try_recv().expect("setstrategy");
    assert_eq!(set.command, "setstrategy");
    assert_eq!(set.param_name, "/ndn");
}

#[tokio::test]
async fn backend_errors_become_control_responses() {
    let mut harness = harness(Box::new(|_| BackendMessage {
        error_code: 404,
        error_message: "no such face".to_owned(),
        ..BackendMessage::response()
    }));
    let params = ControlParameters {
        face_id: Some(9),
        ..ControlParameters::default()
    };
    harness
        .handle(&command("/localhost/nfd/faces/destroy", Some(&params)), None)
        .await;
    let response = harness.next_response();
    assert_eq!(response.status_code, 404);
    assert_eq!(response.status_text, "no such face");
}

#[tokio::test]
async fn clean_notification_withdraws_routes_and_publishes_event() {
    let mut harness = harness(face_checking_backend(5));
    let params = ControlParameters {
        name: Some(name("/ndn/app")),
        ..ControlParameters::default()
    };
    harness
        .handle(&command("/localhost/nfd/rib/register", Some(&params)), Some(5))
        .await;
    let _registered = harness.next_response();

    let ctx = Arc::clone(harness.dispatcher.context());
    let notifications = harness.notifications.take().expect("receiver");
    let consumer = tokio::spawn(process_notifications(
        Arc::clone(&ctx),
        notifications,
        harness.shutdown.clone(),
    ));
    harness
        .backend_tx
        .send(BackendMessage {
            command: NOTIFY_CLEAN.to_owned(),
            face_id: 5,
            uri: "udp4://192.0.2.5:6363".to_owned(),
            ..BackendMessage::default()
        })
        .expect("push notification");

    let out = tokio::time::timeout(Duration::from_secs(5), harness.outbound.recv())
        .await
        .expect("event in time")
        .expect("event");
    let (block, _) = Block::decode(&out.wire).expect("block");
    let data = Data::decode(&block).expect("data");
    assert_eq!(data.name().to_string(), "/localhost/nfd/faces/events/seq=1");
    assert_eq!(out.next_hop_face_id, None);
    assert!(ctx.rib().is_empty());
    assert_eq!(ctx.face_events().last().map(|event| event.face_id), Some(5));

    harness.shutdown.cancel();
    consumer.await.expect("consumer");
}

#[rstest]
#[case::latest_with_can_be_prefix(true, None, true)]
#[case::latest_without_can_be_prefix(false, None, false)]
#[case::by_sequence(false, Some(1), true)]
#[case::unknown_sequence(false, Some(42), false)]
#[tokio::test]
async fn face_events_are_served_from_the_log(
    #[case] can_be_prefix: bool,
    #[case] seq: Option<u64>,
    #[case] answered: bool,
) {
    let mut harness = harness(ok_backend());
    harness.dispatcher.context().face_events().record(
        FaceEventKind::Destroyed,
        4,
        String::new(),
        String::new(),
    );
    let mut name = name("/localhost/nfd/faces/events");
    if let Some(seq) = seq {
        name = name.append(Component::sequence_num(seq));
    }
    let interest = Interest::new(name).with_can_be_prefix(can_be_prefix);
    harness.handle(&interest, None).await;

    match harness.outbound.try_recv() {
        Ok(out) => {
            assert!(answered);
            let (block, _) = Block::decode(&out.wire).expect("block");
            let data = Data::decode(&block).expect("data");
            assert_eq!(data.name().to_string(), "/localhost/nfd/faces/events/seq=1");
        }
        Err(_) => assert!(!answered),
    }
}

#[tokio::test]
async fn backend_disconnect_is_unavailable() {
    let (ours, theirs) = duplex(1024);
    drop(theirs);
    let shutdown = CancellationToken::new();
    let (queue, _notifications) = NotificationQueue::new();
    let backend = BackendChannel::spawn(
        JsonStream(ours),
        Arc::new(queue),
        None,
        &TaskTracker::new(),
        shutdown.clone(),
    );
    let (sink, mut outbound) = ResponseSink::channel(8);
    let ctx = Arc::new(MgmtContext::new(backend, sink, &BridgeConfig::default()));
    let dispatcher = Dispatcher::new(Arc::clone(&ctx));

    let request = dispatcher
        .route(packet(&command("/localhost/nfd/status/general", None), None))
        .expect("routed");
    dispatcher.modules.handle(&ctx, &request).await;

    let out = outbound.try_recv().expect("response");
    let (block, _) = Block::decode(&out.wire).expect("block");
    let data = Data::decode(&block).expect("data");
    let (block, _) = Block::decode(data.content()).expect("response block");
    let response = ControlResponse::decode(&block).expect("response");
    assert_eq!(response.status_code, status::UNAVAILABLE);
    shutdown.cancel();
}

#[tokio::test]
async fn run_dispatches_until_the_link_closes() {
    let mut harness = harness(ok_backend());
    let (mut forwarder, link) = duplex(4096);
    let mut receiver = LinkReceiver::new(link, 8800, crate::lp::ReassemblyConfig::default());
    let wire = command("/localhost/nfd/bogus/list", None).encode().to_bytes();
    tokio::io::AsyncWriteExt::write_all(&mut forwarder, &wire)
        .await
        .expect("write");
    drop(forwarder);

    let tracker = TaskTracker::new();
    harness
        .dispatcher
        .run(&mut receiver, &tracker, harness.shutdown.clone())
        .await;
    tracker.close();
    tracker.wait().await;

    let response = harness.next_response();
    assert_eq!(response.status_code, status::NOT_IMPLEMENTED);
}
