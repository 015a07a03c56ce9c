//! The bridge against a backend on a seqpacket socket.

use std::time::Duration;

use bytes::Bytes;
use ndnmgmt::{BridgeConfig, backend::BackendMessage};
use ndnmgmt_testing::{FakeForwarder, command};
use tokio::{io::duplex, sync::oneshot};
use tokio_seqpacket::UnixSeqpacket;

async fn recv_message(socket: &UnixSeqpacket) -> BackendMessage {
    let mut buf = vec![0_u8; 64 * 1024];
    let len = socket.recv(&mut buf).await.expect("datagram");
    serde_json::from_slice(&buf[..len]).expect("one object per datagram")
}

async fn send_message(socket: &UnixSeqpacket, message: &BackendMessage) {
    let datagram = serde_json::to_vec(message).expect("encode");
    socket.send(&datagram).await.expect("send");
}

#[tokio::test]
async fn dataset_round_trips_through_datagrams() {
    let (ours, backend) = UnixSeqpacket::pair().expect("socket pair");
    let (forwarder_end, link) = duplex(256 * 1024);
    let (stop, stopped) = oneshot::channel::<()>();
    let bridge = tokio::spawn(async move {
        ndnmgmt::serve(&BridgeConfig::default(), link, ours, async {
            let _ = stopped.await;
        })
        .await;
    });
    let mut forwarder = FakeForwarder::new(forwarder_end);

    forwarder
        .send(&command("/localhost/nfd/status/general", None), Some(4))
        .await;
    let request = recv_message(&backend).await;
    assert_eq!(request.command, "forwarderstatus");
    send_message(
        &backend,
        &BackendMessage {
            dataset: Bytes::from_static(b"\x80\x02\x01\x02"),
            ..BackendMessage::response()
        },
    )
    .await;

    let (frame, data) = forwarder.next_data().await;
    assert_eq!(data.content().as_ref(), b"\x80\x02\x01\x02");
    assert_eq!(frame.next_hop_face_id(), Some(4));

    let _ = stop.send(());
    tokio::time::timeout(Duration::from_secs(5), bridge)
        .await
        .expect("bridge stops")
        .expect("join");
}

#[tokio::test]
async fn notifications_arrive_as_datagrams() {
    let (ours, backend) = UnixSeqpacket::pair().expect("socket pair");
    let (forwarder_end, link) = duplex(256 * 1024);
    let (stop, stopped) = oneshot::channel::<()>();
    let bridge = tokio::spawn(async move {
        ndnmgmt::serve(&BridgeConfig::default(), link, ours, async {
            let _ = stopped.await;
        })
        .await;
    });
    let mut forwarder = FakeForwarder::new(forwarder_end);

    send_message(
        &backend,
        &BackendMessage {
            command: "clean".to_owned(),
            face_id: 12,
            ..BackendMessage::default()
        },
    )
    .await;
    let (_, event) = forwarder.next_data().await;
    assert_eq!(event.name().to_string(), "/localhost/nfd/faces/events/seq=1");

    let _ = stop.send(());
    tokio::time::timeout(Duration::from_secs(5), bridge)
        .await
        .expect("bridge stops")
        .expect("join");
}
