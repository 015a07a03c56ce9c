//! Utilities for working with panic payloads.
//!
//! Request tasks run under `catch_unwind`; these helpers turn the payload into
//! something a log line can carry.

use std::{any::Any, fmt, panic::AssertUnwindSafe};

use futures::FutureExt;
use log::error;
use tokio_util::task::TaskTracker;

/// Wrapper that formats a panic payload when logged or displayed.
///
/// The payload is downcast to `String` or `&'static str` if possible and falls
/// back to `Debug` formatting otherwise.
///
/// ```
/// use ndnmgmt::panic::format_panic;
/// assert_eq!(format_panic(Box::new("boom")).to_string(), "boom");
/// assert_eq!(
///     format_panic(Box::new(String::from("boom"))).to_string(),
///     "boom"
/// );
/// assert!(format_panic(Box::new(5_u32)).to_string().contains("Any"));
/// ```
#[derive(Debug)]
#[must_use]
pub struct PanicMessage(Box<dyn Any + Send>);

impl fmt::Display for PanicMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(s) = self.0.downcast_ref::<String>() {
            f.write_str(s)
        } else if let Some(s) = self.0.downcast_ref::<&'static str>() {
            f.write_str(s)
        } else {
            write!(f, "{:?}", self.0)
        }
    }
}

/// Create a [`PanicMessage`] for the given payload.
pub fn format_panic(panic: Box<dyn Any + Send>) -> PanicMessage { PanicMessage(panic) }

/// Spawn `future` on `tracker`, logging and counting a panic instead of
/// letting it tear down the runtime.
///
/// `task` names the work in the log line; `context` is a free-form label such
/// as the request name.
pub fn spawn_guarded<F>(tracker: &TaskTracker, task: &'static str, context: String, future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tracker.spawn(async move {
        if let Err(panic) = AssertUnwindSafe(future).catch_unwind().await {
            crate::metrics::inc_task_panics();
            let panic_msg = format_panic(panic);
            // Emit via both `log` and `tracing` for tests that capture either.
            error!("{task} task panicked: panic={panic_msg}, context={context}");
            tracing::error!(panic = %panic_msg, %context, "{task} task panicked");
        }
    });
}
