//! Backend selection tests.

mod support;

use std::sync::Arc;

use chime_core::scheduling::ports::AlarmBoundary;
use chime_infra::create_scheduler;
use support::{CountingSink, MemoryCounterStore, RecordingBoundary};

#[tokio::test(flavor = "multi_thread")]
async fn persistent_boundary_selects_the_delegating_backend() {
    let boundary: Arc<dyn AlarmBoundary> = RecordingBoundary::persistent();
    let scheduler = create_scheduler(Some(boundary), CountingSink::new(), MemoryCounterStore::new())
        .expect("scheduler created");
    assert!(scheduler.is_persistent());
}

#[tokio::test(flavor = "multi_thread")]
async fn non_persistent_boundary_falls_back_to_local_timers() {
    let boundary: Arc<dyn AlarmBoundary> = RecordingBoundary::new();
    let scheduler = create_scheduler(Some(boundary), CountingSink::new(), MemoryCounterStore::new())
        .expect("scheduler created");
    assert!(!scheduler.is_persistent());
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_boundary_falls_back_to_local_timers() {
    let scheduler = create_scheduler(None, CountingSink::new(), MemoryCounterStore::new())
        .expect("scheduler created");
    assert!(!scheduler.is_persistent());
}
