//! Metric helpers for `ndnmgmt`.
//!
//! This module defines metric names and simple helper functions
//! wrapping the [`metrics`](https://docs.rs/metrics) crate. With the
//! `metrics` feature disabled every helper compiles to a no-op.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the counter tracking link frames read or written.
pub const FRAMES_PROCESSED: &str = "ndnmgmt_frames_processed_total";
/// Name of the counter tracking inbound units dropped before dispatch.
pub const FRAMES_DROPPED: &str = "ndnmgmt_frames_dropped_total";
/// Name of the counter tracking Control Responses and dataset segments sent.
pub const RESPONSES_SENT: &str = "ndnmgmt_responses_sent_total";
/// Name of the counter tracking backend requests issued.
pub const BACKEND_CALLS: &str = "ndnmgmt_backend_calls_total";
/// Name of the counter tracking failed backend requests.
pub const BACKEND_ERRORS: &str = "ndnmgmt_backend_errors_total";
/// Name of the gauge tracking backend requests awaiting a response.
pub const BACKEND_PENDING: &str = "ndnmgmt_backend_pending";
/// Name of the counter tracking panics in request tasks.
pub const TASK_PANICS: &str = "ndnmgmt_task_panics_total";

/// Direction of frame processing.
#[derive(Clone, Copy)]
pub enum Direction {
    /// Frames read from the forwarder.
    Inbound,
    /// Frames written to the forwarder.
    Outbound,
}

impl Direction {
    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Record a processed frame for the given direction.
pub fn inc_frames(direction: Direction) {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_PROCESSED, "direction" => direction.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = direction;
}

/// Record an inbound unit dropped for `reason`.
pub fn inc_dropped(reason: &'static str) {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_DROPPED, "reason" => reason).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = reason;
}

/// Record a response sent by `module`.
pub fn inc_responses(module: &'static str) {
    #[cfg(feature = "metrics")]
    counter!(RESPONSES_SENT, "module" => module).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = module;
}

/// Record a backend request and bump the pending gauge.
pub fn backend_call_started() {
    #[cfg(feature = "metrics")]
    {
        counter!(BACKEND_CALLS).increment(1);
        gauge!(BACKEND_PENDING).increment(1.0);
    }
}

/// Lower the pending gauge once a backend request resolves.
pub fn backend_call_finished() {
    #[cfg(feature = "metrics")]
    gauge!(BACKEND_PENDING).decrement(1.0);
}

/// Record a failed backend request.
pub fn inc_backend_errors(kind: &'static str) {
    #[cfg(feature = "metrics")]
    counter!(BACKEND_ERRORS, "kind" => kind).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = kind;
}

/// Record a panic caught in a spawned task.
pub fn inc_task_panics() {
    #[cfg(feature = "metrics")]
    counter!(TASK_PANICS).increment(1);
}
