//! Utilities for driving an `ndnmgmt` bridge over in-memory streams during
//! tests.
//!
//! [`BridgeHarness`] runs [`ndnmgmt::serve`] between a [`FakeForwarder`],
//! which writes command Interests and reads back link frames, and a
//! [`FakeBackend`], which answers backend commands from a script.
//!
//! ```rust
//! use ndnmgmt_testing::{BridgeHarness, command, ok_script};
//!
//! # async fn example() {
//! let mut harness = BridgeHarness::start(ok_script());
//! harness.forwarder.send(&command("/localhost/nfd/bogus/list", None), None).await;
//! let response = harness.forwarder.next_response().await;
//! assert_eq!(response.status_code, 501);
//! # }
//! ```

pub mod backend;
pub mod forwarder;
pub mod packets;

use ndnmgmt::{BridgeConfig, backend::JsonStream};
use tokio::{io::duplex, sync::oneshot, task::JoinHandle};

pub use backend::{FakeBackend, Script, ok_script};
pub use forwarder::FakeForwarder;
pub use packets::{command, link_frame};

const STREAM_CAPACITY: usize = 256 * 1024;

/// A running bridge with both of its peers.
pub struct BridgeHarness {
    /// Forwarder side of the link socket.
    pub forwarder: FakeForwarder,
    /// Scripted backend.
    pub backend: FakeBackend,
    stop: Option<oneshot::Sender<()>>,
    bridge: JoinHandle<()>,
}

impl BridgeHarness {
    /// Start a bridge with the default configuration.
    #[must_use]
    pub fn start(script: Script) -> Self { Self::start_with(BridgeConfig::default(), script) }

    /// Start a bridge with `config`.
    #[must_use]
    pub fn start_with(config: BridgeConfig, script: Script) -> Self {
        let (forwarder, forwarder_link) = duplex(STREAM_CAPACITY);
        let (backend, backend_link) = duplex(STREAM_CAPACITY);
        let (stop, stopped) = oneshot::channel::<()>();
        let bridge = tokio::spawn(async move {
            ndnmgmt::serve(&config, forwarder_link, JsonStream(backend_link), async {
                let _ = stopped.await;
            })
            .await;
        });
        Self {
            forwarder: FakeForwarder::new(forwarder),
            backend: FakeBackend::spawn(backend, script),
            stop: Some(stop),
            bridge,
        }
    }

    /// Signal shutdown and wait for the bridge to stop.
    ///
    /// # Panics
    ///
    /// Panics if the bridge task panicked.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        (&mut self.bridge).await.expect("bridge task panicked");
    }
}
