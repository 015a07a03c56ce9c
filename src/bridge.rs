//! Wiring of the bridge's long-lived tasks.
//!
//! One task reads the forwarder link and dispatches commands, one writes
//! responses back, one reads the backend channel and further tasks apply
//! notifications and expire routes. All of them share one
//! [`TaskTracker`] and one [`CancellationToken`].

use std::{future::Future, path::Path, sync::Arc};

use log::{info, warn};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::UnixStream,
    select,
};
use tokio_seqpacket::UnixSeqpacket;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::{
    backend::{BackendChannel, BackendTransport},
    config::BridgeConfig,
    error::BridgeError,
    mgmt::{
        Dispatcher,
        MgmtContext,
        NotificationQueue,
        modules::rib::{EXPIRY_SWEEP_INTERVAL, expire_routes},
        process_notifications,
    },
    transport::{DEFAULT_SEND_QUEUE_CAPACITY, LinkReceiver, ResponseSink, write_loop},
};

/// Run the bridge over already connected streams until `shutdown` resolves
/// or the forwarder closes its link.
///
/// Commands still in flight when the bridge stops are allowed to finish
/// before this returns.
#[expect(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! expands to modulus internally"
)]
pub async fn serve<F, B, S>(config: &BridgeConfig, forwarder: F, backend: B, shutdown: S)
where
    F: AsyncRead + AsyncWrite + Send + 'static,
    B: BackendTransport,
    S: Future<Output = ()> + Send,
{
    let token = CancellationToken::new();
    let tracker = TaskTracker::new();

    let (queue, notifications) = NotificationQueue::new();
    let backend = BackendChannel::spawn(
        backend,
        Arc::new(queue),
        config.backend_timeout,
        &tracker,
        token.clone(),
    );

    let (read_half, write_half) = tokio::io::split(forwarder);
    let (sink, outbound) = ResponseSink::channel(DEFAULT_SEND_QUEUE_CAPACITY);
    tracker.spawn(write_loop(
        outbound,
        write_half,
        config.max_packet_size,
        token.clone(),
    ));

    let ctx = Arc::new(MgmtContext::new(backend, sink, config));
    tracker.spawn(process_notifications(
        Arc::clone(&ctx),
        notifications,
        token.clone(),
    ));
    tracker.spawn(expire_routes(
        Arc::clone(&ctx),
        EXPIRY_SWEEP_INTERVAL,
        token.clone(),
    ));

    let dispatcher = Dispatcher::new(ctx);
    let mut receiver = LinkReceiver::new(read_half, config.max_packet_size, config.reassembly);
    info!("management bridge running");

    select! {
        () = shutdown => info!("shutdown requested"),
        () = dispatcher.run(&mut receiver, &tracker, token.clone()) => {
            warn!("forwarder link closed; stopping");
        }
    }

    token.cancel();
    tracker.close();
    tracker.wait().await;
    info!("management bridge stopped");
}

/// Connect both sockets named in `config` and [`serve`] them.
///
/// The forwarder link is a stream socket; the backend listens on a
/// seqpacket socket.
///
/// # Errors
///
/// Returns [`BridgeError::Connect`] when either socket cannot be reached.
pub async fn connect_and_serve<S>(config: &BridgeConfig, shutdown: S) -> Result<(), BridgeError>
where
    S: Future<Output = ()> + Send,
{
    let forwarder = UnixStream::connect(&config.forwarder_socket)
        .await
        .map_err(|source| connect_error(&config.forwarder_socket, source))?;
    let backend = UnixSeqpacket::connect(&config.backend_socket)
        .await
        .map_err(|source| connect_error(&config.backend_socket, source))?;
    info!(
        "connected: forwarder={}, backend={}",
        config.forwarder_socket.display(),
        config.backend_socket.display()
    );
    serve(config, forwarder, backend, shutdown).await;
    Ok(())
}

fn connect_error(path: &Path, source: std::io::Error) -> BridgeError {
    BridgeError::Connect {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::{io::duplex, sync::oneshot};

    use super::*;
    use crate::backend::JsonStream;

    #[tokio::test]
    async fn stops_when_the_forwarder_link_closes() {
        let (forwarder, ours) = duplex(1024);
        let (_backend, backend_ours) = duplex(1024);
        drop(forwarder);
        tokio::time::timeout(
            Duration::from_secs(5),
            serve(
                &BridgeConfig::default(),
                ours,
                JsonStream(backend_ours),
                std::future::pending(),
            ),
        )
        .await
        .expect("bridge stops on link close");
    }

    #[tokio::test]
    async fn stops_on_shutdown() {
        let (_forwarder, ours) = duplex(1024);
        let (_backend, backend_ours) = duplex(1024);
        let (tx, rx) = oneshot::channel::<()>();
        let bridge = tokio::spawn(async move {
            serve(&BridgeConfig::default(), ours, JsonStream(backend_ours), async {
                let _ = rx.await;
            })
            .await;
        });
        let _ = tx.send(());
        tokio::time::timeout(Duration::from_secs(5), bridge)
            .await
            .expect("bridge stops on signal")
            .expect("join");
    }

    #[tokio::test]
    async fn missing_socket_is_a_connect_error() {
        let config = BridgeConfig::default().forwarder_socket("/nonexistent/ndnmgmt-test.sock");
        let err = connect_and_serve(&config, async {})
            .await
            .expect_err("no socket");
        assert!(matches!(err, BridgeError::Connect { .. }));
    }

    #[tokio::test]
    async fn backend_must_be_a_seqpacket_listener() {
        let dir = std::env::temp_dir().join(format!("ndnmgmt-bridge-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let forwarder_path = dir.join("forwarder.sock");
        let backend_path = dir.join("backend.sock");
        let _ = std::fs::remove_file(&forwarder_path);
        let _ = std::fs::remove_file(&backend_path);
        let _forwarder = tokio::net::UnixListener::bind(&forwarder_path).expect("forwarder");
        // A stream listener on the backend path refuses a seqpacket connect.
        let _backend = tokio::net::UnixListener::bind(&backend_path).expect("backend");

        let config = BridgeConfig::default()
            .forwarder_socket(&forwarder_path)
            .backend_socket(&backend_path);
        let err = connect_and_serve(&config, async {})
            .await
            .expect_err("socket type mismatch");
        assert!(matches!(err, BridgeError::Connect { ref path, .. } if *path == backend_path));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
