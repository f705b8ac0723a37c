//! Backend selection.
//!
//! The backend is chosen exactly once, at construction, by probing whether
//! a persistent external scheduler is available on this platform. No call
//! ever re-inspects the backend type at runtime.

use std::sync::Arc;

use chime_core::scheduling::ports::{
    AlarmBoundary, CounterStore, ReminderSink, SoundTaskScheduler,
};
use chime_domain::Result;
use tracing::info;

use super::delegating::DelegatingScheduler;
use super::local::LocalTimerScheduler;

/// Build the scheduler for this platform.
///
/// A boundary that probes as persistent selects the delegating backend;
/// everything else (no boundary at all, or a non-persistent one) selects
/// the in-process timer backend, which renders fires through `sink`.
pub fn create_scheduler(
    boundary: Option<Arc<dyn AlarmBoundary>>,
    sink: Arc<dyn ReminderSink>,
    store: Arc<dyn CounterStore>,
) -> Result<Arc<dyn SoundTaskScheduler>> {
    match boundary {
        Some(boundary) if boundary.is_persistent() => {
            info!("persistent boundary available: using delegating scheduler");
            Ok(Arc::new(DelegatingScheduler::new(boundary, store)?))
        }
        _ => {
            info!("no persistent boundary: using in-process timer scheduler");
            Ok(Arc::new(LocalTimerScheduler::new(sink)))
        }
    }
}
