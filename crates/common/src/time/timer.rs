//! Cancellable one-shot and recurring timers
//!
//! Timers are spawned onto the tokio runtime and observed through a
//! [`TimerHandle`]. Cancelling the handle prevents any further callback
//! invocation; a callback that is already executing is allowed to finish.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

/// Handle used to cancel a spawned timer.
///
/// Handles are cheap to clone; all clones observe the same cancellation
/// flag. Cancellation is idempotent.
#[derive(Debug, Clone, Default)]
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
}

impl TimerHandle {
    /// Create a fresh, not-yet-cancelled handle.
    pub fn new() -> Self {
        Self { cancelled: Arc::new(AtomicBool::new(false)) }
    }

    /// Cancel the timer. Pending wake-ups for this handle become no-ops.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check whether the timer has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Spawn a one-shot timer that runs `callback` after `delay`.
///
/// The callback is skipped when the returned handle is cancelled before the
/// delay elapses. The cancellation flag is re-checked after the sleep, so a
/// cancel that lands while the timer is pending always wins.
pub fn one_shot<F, Fut>(delay: Duration, callback: F) -> TimerHandle
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let handle = TimerHandle::new();
    let observed = handle.clone();

    tokio::spawn(async move {
        sleep(delay).await;
        if !observed.is_cancelled() {
            callback().await;
        }
    });

    handle
}

/// Spawn a recurring timer that runs `callback` every `period`.
///
/// The first tick fires one full period after the call, not immediately.
/// The loop exits as soon as the returned handle is cancelled.
pub fn recurring<F, Fut>(period: Duration, mut callback: F) -> TimerHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let handle = TimerHandle::new();
    let observed = handle.clone();

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        interval.tick().await; // consume the immediate first tick

        while !observed.is_cancelled() {
            interval.tick().await;
            if observed.is_cancelled() {
                break;
            }
            callback().await;
        }
    });

    handle
}
