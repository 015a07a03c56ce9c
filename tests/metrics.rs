#![cfg(feature = "metrics")]
//! Tests for `ndnmgmt` metrics helpers.
//!
//! These tests verify that counters and gauges update as expected using
//! `metrics_util::debugging::DebuggingRecorder`.
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use ndnmgmt::metrics::{self, Direction};
use rstest::rstest;

fn debugging_recorder_setup() -> (Snapshotter, DebuggingRecorder) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    (snapshotter, recorder)
}

fn has_labelled_counter(snapshotter: &Snapshotter, name: &str, label: (&str, &str)) -> bool {
    snapshotter.snapshot().into_vec().iter().any(|(k, _, _, v)| {
        k.key().name() == name
            && k.key()
                .labels()
                .any(|l| l.key() == label.0 && l.value() == label.1)
            && matches!(v, DebugValue::Counter(c) if *c > 0)
    })
}

#[rstest]
#[case(Direction::Inbound, "inbound")]
#[case(Direction::Outbound, "outbound")]
fn frame_metric_is_labelled_by_direction(#[case] direction: Direction, #[case] label: &str) {
    let (snapshotter, recorder) = debugging_recorder_setup();
    ::metrics::with_local_recorder(&recorder, || metrics::inc_frames(direction));
    assert!(has_labelled_counter(
        &snapshotter,
        metrics::FRAMES_PROCESSED,
        ("direction", label)
    ));
}

#[test]
fn drops_are_labelled_by_reason() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    ::metrics::with_local_recorder(&recorder, || metrics::inc_dropped("foreign_prefix"));
    assert!(has_labelled_counter(
        &snapshotter,
        metrics::FRAMES_DROPPED,
        ("reason", "foreign_prefix")
    ));
}

#[test]
fn responses_are_labelled_by_module() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    ::metrics::with_local_recorder(&recorder, || metrics::inc_responses("faces"));
    assert!(has_labelled_counter(
        &snapshotter,
        metrics::RESPONSES_SENT,
        ("module", "faces")
    ));
}

#[test]
fn pending_gauge_returns_to_zero() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    ::metrics::with_local_recorder(&recorder, || {
        metrics::backend_call_started();
        metrics::backend_call_started();
        metrics::backend_call_finished();
        metrics::backend_call_finished();
    });
    let snapshot = snapshotter.snapshot().into_vec();
    let gauge = snapshot
        .iter()
        .find(|(k, _, _, _)| k.key().name() == metrics::BACKEND_PENDING)
        .map(|(_, _, _, v)| v.clone());
    assert!(matches!(gauge, Some(DebugValue::Gauge(g)) if g.into_inner() == 0.0));
    assert_counter_eq(&snapshotter, metrics::BACKEND_CALLS, 2);
}

#[rstest]
#[case(1)]
#[case(2)]
fn task_panics_are_counted(#[case] expected: u64) {
    let (snapshotter, recorder) = debugging_recorder_setup();
    ::metrics::with_local_recorder(&recorder, || {
        (0..expected).for_each(|_| metrics::inc_task_panics());
    });
    assert_counter_eq(&snapshotter, metrics::TASK_PANICS, expected);
}

fn assert_counter_eq(snapshotter: &Snapshotter, name: &str, expected: u64) {
    let metrics = snapshotter.snapshot().into_vec();
    assert!(
        metrics.iter().any(|(key, _, _, value)| {
            key.key().name() == name && matches!(value, DebugValue::Counter(c) if *c == expected)
        }),
        "expected {name} == {expected}, got {metrics:#?}"
    );
}
