//! End-to-end command handling over the link socket.

use std::time::Duration;

use ndnmgmt::{
    backend::BackendMessage,
    control::{ControlParameters, ControlResponse, status},
};
use ndnmgmt_testing::{BridgeHarness, FakeForwarder, command, ok_script};
use rstest::rstest;

#[tokio::test]
async fn face_create_returns_the_assigned_face_id() {
    let mut harness = BridgeHarness::start(Box::new(|request| BackendMessage {
        control_response: Some(ControlResponse::ok(ControlParameters {
            face_id: Some(300),
            ..request.control_params.clone().unwrap_or_default()
        })),
        ..BackendMessage::response()
    }));
    let params = ControlParameters {
        uri: Some("tcp4://192.0.2.9:6363".to_owned()),
        ..ControlParameters::default()
    };
    let interest = command("/localhost/nfd/faces/create", Some(&params));
    harness.forwarder.send(&interest, Some(1)).await;

    let (frame, data) = harness.forwarder.next_data().await;
    assert_eq!(data.name(), interest.name());
    assert_eq!(frame.pit_token(), Some(&FakeForwarder::pit_token()));
    assert_eq!(frame.next_hop_face_id(), Some(1));

    let request = harness.backend.next_request().await;
    assert_eq!(request.command, "createface");
    assert_eq!(
        request.control_params.and_then(|p| p.uri).as_deref(),
        Some("tcp4://192.0.2.9:6363")
    );
    harness.shutdown().await;
}

#[tokio::test]
async fn face_create_response_body_carries_face_id() {
    let mut harness = BridgeHarness::start(Box::new(|_| BackendMessage {
        control_response: Some(ControlResponse::ok(ControlParameters {
            face_id: Some(300),
            ..ControlParameters::default()
        })),
        ..BackendMessage::response()
    }));
    let params = ControlParameters {
        uri: Some("tcp4://192.0.2.9:6363".to_owned()),
        ..ControlParameters::default()
    };
    harness
        .forwarder
        .send(&command("/localhost/nfd/faces/create", Some(&params)), None)
        .await;
    let response = harness.forwarder.next_response().await;
    assert_eq!(response.status_code, status::OK);
    assert_eq!(response.body.and_then(|body| body.face_id), Some(300));
    harness.shutdown().await;
}

#[rstest]
#[case::foreign_prefix("/unknown/nfd/faces/create")]
#[case::too_short("/localhost/nfd/faces")]
#[case::local_only_module_over_localhop("/localhop/nfd/faces/list")]
#[tokio::test]
async fn unroutable_commands_get_no_response(#[case] uri: &str) {
    let mut harness = BridgeHarness::start(ok_script());
    harness.forwarder.send(&command(uri, None), None).await;
    assert!(harness.forwarder.is_silent_for(Duration::from_millis(200)).await);
    assert!(harness.backend.drain_requests().is_empty());
    harness.shutdown().await;
}

#[rstest]
#[case::unknown_module("/localhost/nfd/bogus/list", status::NOT_IMPLEMENTED, "Unknown module")]
#[case::unknown_verb("/localhost/nfd/fib/bogus", status::NOT_IMPLEMENTED, "Unknown verb")]
#[case::missing_parameters(
    "/localhost/nfd/faces/create",
    status::BAD_REQUEST,
    "ControlParameters is incorrect"
)]
#[tokio::test]
async fn protocol_errors_are_answered(
    #[case] uri: &str,
    #[case] code: u32,
    #[case] text: &str,
) {
    let mut harness = BridgeHarness::start(ok_script());
    harness.forwarder.send(&command(uri, None), None).await;
    let response = harness.forwarder.next_response().await;
    assert_eq!(response.status_code, code);
    assert_eq!(response.status_text, text);
    harness.shutdown().await;
}

#[tokio::test]
async fn garbage_on_the_link_does_not_stop_dispatch() {
    let mut harness = BridgeHarness::start(ok_script());
    harness.forwarder.send_raw(&[0x64, 0x03, 0x51, 0x01, 0x00]).await;
    harness
        .forwarder
        .send(&command("/localhost/nfd/bogus/list", None), None)
        .await;
    let response = harness.forwarder.next_response().await;
    assert_eq!(response.status_code, status::NOT_IMPLEMENTED);
    harness.shutdown().await;
}

#[tokio::test]
async fn concurrent_commands_are_each_answered() {
    let mut harness = BridgeHarness::start(Box::new(|request| BackendMessage {
        valid: true,
        face_id: request.face_id,
        ..BackendMessage::response()
    }));
    for face in 1..=16_u64 {
        let params = ControlParameters {
            name: Some(format!("/app/{face}").parse().expect("name")),
            face_id: Some(face),
            cost: Some(face),
            ..ControlParameters::default()
        };
        harness
            .forwarder
            .send(&command("/localhost/nfd/fib/add-nexthop", Some(&params)), None)
            .await;
    }

    let mut faces = Vec::new();
    for _ in 0..16 {
        let response = harness.forwarder.next_response().await;
        assert_eq!(response.status_code, status::OK);
        let body = response.body.expect("body");
        assert_eq!(body.face_id, body.cost);
        faces.push(body.face_id.expect("face"));
    }
    faces.sort_unstable();
    assert_eq!(faces, (1..=16).collect::<Vec<_>>());
    harness.shutdown().await;
}
