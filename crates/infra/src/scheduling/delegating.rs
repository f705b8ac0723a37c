//! Delegating scheduler (external persistent boundary).
//!
//! Forwards every arm/cancel/query to the platform's always-on alarm
//! scheduler and keeps only enough local bookkeeping to stay consistent
//! with it: the live-id set (inside the monotonic allocator), an
//! interval-id subset kept for diagnostics, and one auto-release timer per
//! fixed task.
//!
//! The boundary cannot report back when a fixed task's wake-up has been
//! delivered, so each fixed id is released locally once its due time plus a
//! grace period has elapsed without an explicit cancel. The grace path
//! releases the id only: by then the boundary has re-armed itself for the
//! next day and must not be canceled. The explicit-cancel path, in
//! contrast, always calls the boundary.
//!
//! Ids are monotonic and the counter is persisted after every allocation,
//! so a process restart can never arm a new task under an id the external
//! scheduler still remembers as an old one.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chime_common::time::timer::{one_shot, TimerHandle};
use chime_common::{Clock, SystemClock};
use chime_core::scheduling::ids::MonotonicIdAllocator;
use chime_core::scheduling::ports::{AlarmBoundary, CounterStore, SoundTaskScheduler};
use chime_core::scheduling::{params, window};
use chime_domain::constants::{FIXED_RELEASE_GRACE_MS, MIN_ARM_DELAY_MS, NOTIFICATION_TITLE};
use chime_domain::{ArmRequest, ChimeError, Result, SoundTask, TaskId, TaskShape};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::observability::LogStream;

/// Configuration for the delegating scheduler.
#[derive(Debug, Clone)]
pub struct DelegatingSchedulerConfig {
    /// How long after a fixed task's due time the local id bookkeeping is
    /// released without boundary confirmation.
    pub fixed_release_grace: Duration,
    /// Floor applied to the first-fire delay of interval tasks started
    /// inside their window.
    pub min_arm_delay: Duration,
}

impl Default for DelegatingSchedulerConfig {
    fn default() -> Self {
        Self {
            fixed_release_grace: Duration::from_millis(FIXED_RELEASE_GRACE_MS as u64),
            min_arm_delay: Duration::from_millis(MIN_ARM_DELAY_MS as u64),
        }
    }
}

struct BookState {
    ids: MonotonicIdAllocator,
    /// Interval-task subset of the live ids; diagnostics only.
    interval_ids: HashSet<TaskId>,
    /// Pending auto-release timers, fixed tasks only.
    release_timers: HashMap<TaskId, TimerHandle>,
}

struct Book {
    state: Mutex<BookState>,
    clock: Arc<dyn Clock>,
    log: LogStream,
    config: DelegatingSchedulerConfig,
}

impl Book {
    /// Drop every trace of `id`: release timer, interval membership, live
    /// set. One critical section; idempotent.
    fn clear_local(&self, id: TaskId) {
        let mut state = self.state.lock();
        if let Some(timer) = state.release_timers.remove(&id) {
            timer.cancel();
        }
        state.interval_ids.remove(&id);
        state.ids.release(id);
    }
}

/// Scheduler backend B: forwards to the external alarm boundary.
pub struct DelegatingScheduler {
    boundary: Arc<dyn AlarmBoundary>,
    book: Arc<Book>,
}

impl DelegatingScheduler {
    /// Scheduler with the default configuration and the system clock.
    pub fn new(boundary: Arc<dyn AlarmBoundary>, store: Arc<dyn CounterStore>) -> Result<Self> {
        Self::with_config(
            DelegatingSchedulerConfig::default(),
            boundary,
            store,
            Arc::new(SystemClock),
        )
    }

    /// Scheduler with a custom configuration and clock.
    pub fn with_config(
        config: DelegatingSchedulerConfig,
        boundary: Arc<dyn AlarmBoundary>,
        store: Arc<dyn CounterStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let ids = MonotonicIdAllocator::new(store)?;
        Ok(Self {
            boundary,
            book: Arc::new(Book {
                state: Mutex::new(BookState {
                    ids,
                    interval_ids: HashSet::new(),
                    release_timers: HashMap::new(),
                }),
                clock,
                log: LogStream::new(),
                config,
            }),
        })
    }

    /// Subscribe to the diagnostic log-line stream.
    pub fn subscribe_logs(&self) -> broadcast::Receiver<String> {
        self.book.log.subscribe()
    }

    /// Number of locally tracked live ids (diagnostics).
    pub fn tracked_ids(&self) -> usize {
        self.book.state.lock().ids.active_count()
    }

    /// Number of locally tracked interval ids (diagnostics).
    pub fn tracked_interval_ids(&self) -> usize {
        self.book.state.lock().interval_ids.len()
    }

    fn allocate(&self) -> Result<TaskId> {
        self.book.state.lock().ids.allocate()
    }

    fn release(&self, id: TaskId) {
        self.book.state.lock().ids.release(id);
    }
}

/// Arm the local one-shot that releases a fixed task's id once its due time
/// plus the grace period has passed.
///
/// Releases local bookkeeping only; the boundary is deliberately left
/// alone. Replaces any previous timer for the same id.
fn arm_auto_release(book: &Arc<Book>, id: TaskId, trigger_at_ms: i64) {
    let now = book.clock.epoch_millis();
    let delay_ms = (trigger_at_ms - now).max(0) + book.config.fixed_release_grace.as_millis() as i64;

    let fired = Arc::clone(book);
    let handle = one_shot(Duration::from_millis(delay_ms as u64), move || async move {
        {
            let mut state = fired.state.lock();
            state.release_timers.remove(&id);
            state.interval_ids.remove(&id);
            state.ids.release(id);
        }
        fired.log.emit(format!("[delegating] auto-release id={id}"));
        debug!(%id, "fixed task id auto-released");
    });

    let mut state = book.state.lock();
    if let Some(old) = state.release_timers.insert(id, handle) {
        old.cancel();
    }
}

#[async_trait]
impl SoundTaskScheduler for DelegatingScheduler {
    fn is_persistent(&self) -> bool {
        true
    }

    async fn ensure(&self) -> Result<()> {
        let outcome = self.boundary.ensure_permissions().await;
        self.book.log.emit(match &outcome {
            Ok(()) => "[delegating] ensure: ok".to_string(),
            Err(err) => format!("[delegating] ensure: {err}"),
        });
        outcome
    }

    #[instrument(skip(self, sound, text))]
    async fn start_fixed(
        &self,
        sound: &str,
        text: &str,
        fixed_time_ms: i64,
        volume: f32,
    ) -> Result<TaskId> {
        let shape = params::fixed_shape_from_ms(fixed_time_ms)?;
        let TaskShape::Fixed { at } = shape else {
            return Err(ChimeError::Internal("fixed shape expected".into()));
        };
        let task = SoundTask::new(sound, NOTIFICATION_TITLE, text, volume);

        let id = self.allocate()?;
        let now = self.book.clock.epoch_millis();
        let first = window::next_fixed_fire_ms(now, at);

        let request =
            ArmRequest { id, trigger_at_ms: first, shape: TaskShape::Fixed { at }, task };
        // boundary call runs outside the bookkeeping lock
        if let Err(err) = self.boundary.arm(&request).await {
            self.release(id);
            warn!(%id, error = %err, "boundary arm failed; id released");
            self.book.log.emit(format!("[delegating] arm failed id={id}: {err}"));
            return Err(err);
        }

        arm_auto_release(&self.book, id, first);
        self.book.log.emit(format!("[delegating] start fixed id={id} at={at} first={first}"));
        info!(%id, %at, "fixed task armed at boundary");
        Ok(id)
    }

    #[instrument(skip(self, sound, text))]
    async fn start_interval(
        &self,
        sound: &str,
        text: &str,
        start_ms: i64,
        end_ms: i64,
        period_secs: i64,
        volume: f32,
    ) -> Result<TaskId> {
        let shape = params::interval_shape_from_ms(start_ms, end_ms, period_secs)?;
        let TaskShape::Interval { start, end, period } = shape else {
            return Err(ChimeError::Internal("interval shape expected".into()));
        };
        let task = SoundTask::new(sound, NOTIFICATION_TITLE, text, volume);

        let id = self.allocate()?;
        let now = self.book.clock.epoch_millis();
        let min_delay = self.book.config.min_arm_delay.as_millis() as i64;
        let first = window::first_interval_fire_ms(now, start, end).max(now + min_delay);

        let request = ArmRequest {
            id,
            trigger_at_ms: first,
            shape: TaskShape::Interval { start, end, period },
            task,
        };
        if let Err(err) = self.boundary.arm(&request).await {
            self.release(id);
            warn!(%id, error = %err, "boundary arm failed; id released");
            self.book.log.emit(format!("[delegating] arm failed id={id}: {err}"));
            return Err(err);
        }

        self.book.state.lock().interval_ids.insert(id);
        self.book
            .log
            .emit(format!("[delegating] start interval id={id} window={start}-{end} every={period_secs}s"));
        info!(%id, %start, %end, period_secs, "interval task armed at boundary");
        Ok(id)
    }

    async fn schedule(&self, request: ArmRequest) -> Result<()> {
        if !request.id.is_valid() {
            return Err(ChimeError::InvalidInput("task id must be positive".into()));
        }
        if let TaskShape::Interval { period, .. } = &request.shape {
            if period.is_zero() {
                return Err(ChimeError::InvalidInput("interval period must be positive".into()));
            }
        }

        let id = request.id;
        let outcome = self.boundary.arm(&request).await;
        self.book.log.emit(match &outcome {
            Ok(()) => format!("[delegating] schedule id={id} mode={}", request.shape.mode_tag()),
            Err(err) => format!("[delegating] schedule failed id={id}: {err}"),
        });
        outcome
    }

    async fn cancel(&self, id: TaskId) -> bool {
        // explicit cancel always goes to the boundary
        let outcome = self.boundary.cancel(id).await;
        // ...and local bookkeeping is cleared no matter what came back:
        // the boundary is authoritative and losing local tracking is
        // recoverable, a stuck release timer is not
        self.book.clear_local(id);

        match outcome {
            Ok(()) => {
                self.book.log.emit(format!("[delegating] cancel id={id}"));
                debug!(%id, "task canceled at boundary");
                true
            }
            Err(err) => {
                self.book.log.emit(format!("[delegating] cancel failed id={id}: {err}"));
                warn!(%id, error = %err, "boundary cancel failed; local bookkeeping cleared");
                false
            }
        }
    }

    async fn cancel_all(&self, ids: &[TaskId]) -> bool {
        if ids.is_empty() {
            return true;
        }

        let outcome = self.boundary.cancel_all(ids).await;
        {
            // one critical section for the whole set
            let mut state = self.book.state.lock();
            for id in ids {
                if let Some(timer) = state.release_timers.remove(id) {
                    timer.cancel();
                }
                state.interval_ids.remove(id);
                state.ids.release(*id);
            }
        }

        match outcome {
            Ok(()) => {
                self.book.log.emit(format!("[delegating] cancelAll count={}", ids.len()));
                true
            }
            Err(err) => {
                self.book.log.emit(format!("[delegating] cancelAll failed: {err}"));
                warn!(error = %err, "boundary cancelAll failed; local bookkeeping cleared");
                false
            }
        }
    }

    async fn is_scheduled(&self, id: TaskId) -> bool {
        // fails closed: an unreachable boundary reads as "not scheduled"
        match self.boundary.is_scheduled(id).await {
            Ok(scheduled) => scheduled,
            Err(err) => {
                warn!(%id, error = %err, "isScheduled query failed");
                false
            }
        }
    }

    async fn next_fire_at(&self, id: TaskId) -> i64 {
        // fails closed: an unreachable boundary reads as "unknown"
        match self.boundary.next_fire_at(id).await {
            Ok(at_ms) => at_ms,
            Err(err) => {
                warn!(%id, error = %err, "nextFireAt query failed");
                0
            }
        }
    }

    async fn set_enabled(&self, enabled: bool) -> Result<()> {
        let outcome = self.boundary.set_globally_enabled(enabled).await;
        self.book.log.emit(match &outcome {
            Ok(()) => format!("[delegating] enabled={enabled}"),
            Err(err) => format!("[delegating] setEnabled failed: {err}"),
        });
        outcome
    }
}

impl Drop for DelegatingScheduler {
    fn drop(&mut self) {
        let mut state = self.book.state.lock();
        for (_, timer) in state.release_timers.drain() {
            timer.cancel();
        }
    }
}
