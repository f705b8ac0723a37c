//! In-process timer scheduler (no persistence).
//!
//! Drives every task with its own tokio timers: one pending one-shot per
//! task, plus a repeating check timer for interval tasks that corrects the
//! one-shot when the window arithmetic and the period drift apart. Nothing
//! survives process death; callers re-create their tasks on startup.
//!
//! Per-task state machine: `Unarmed -> Armed -> (Fired -> Armed)* ->
//! Canceled`. `Armed` means exactly one pending wake-up is outstanding for
//! the id. A wake-up that finds its record gone, or superseded by a newer
//! arming, is a silent no-op.
//!
//! All bookkeeping (record table + id allocator) sits behind one
//! `parking_lot::Mutex`; window arithmetic and sound delivery run outside
//! it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chime_common::time::timer::{recurring, TimerHandle};
use chime_common::{Clock, SystemClock};
use chime_core::scheduling::ids::RecyclingIdAllocator;
use chime_core::scheduling::ports::{ReminderSink, SoundTaskScheduler};
use chime_core::scheduling::{params, window};
use chime_domain::constants::{
    INTERVAL_CHECK_TOLERANCE_MS, MIN_ARM_DELAY_MS, NOTIFICATION_TITLE,
};
use chime_domain::{ArmRequest, ChimeError, ReminderFire, Result, SoundTask, TaskId, TaskShape};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::observability::LogStream;

/// Configuration for the in-process scheduler.
#[derive(Debug, Clone)]
pub struct LocalSchedulerConfig {
    /// Slack when the repeating interval check decides whether a computed
    /// fire instant counts as due.
    pub check_tolerance: Duration,
    /// Floor applied to every arm delay, so a freshly created task never
    /// fires in the same event-loop turn.
    pub min_arm_delay: Duration,
}

impl Default for LocalSchedulerConfig {
    fn default() -> Self {
        Self {
            check_tolerance: Duration::from_millis(INTERVAL_CHECK_TOLERANCE_MS as u64),
            min_arm_delay: Duration::from_millis(MIN_ARM_DELAY_MS as u64),
        }
    }
}

/// Per-task record. Destroyed together with its timer handles, in the same
/// critical section.
struct TaskState {
    task: SoundTask,
    shape: TaskShape,
    /// Next scheduled instant, epoch ms. 0 while unarmed.
    next_at_ms: i64,
    /// The pending one-shot wake-up.
    one_shot: TimerHandle,
    /// Repeating window check, interval tasks only.
    repeating: Option<TimerHandle>,
    /// Arming generation this record was last armed under. Wake-ups carry
    /// the generation they were armed with, so a stale one can be told
    /// apart even when its id has been recycled in the meantime.
    arm_seq: u64,
}

impl TaskState {
    fn cancel_timers(&self) {
        self.one_shot.cancel();
        if let Some(repeating) = &self.repeating {
            repeating.cancel();
        }
    }
}

struct Table {
    records: HashMap<TaskId, TaskState>,
    ids: RecyclingIdAllocator,
}

struct Inner {
    table: Mutex<Table>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn ReminderSink>,
    log: LogStream,
    enabled: AtomicBool,
    /// Scheduler-wide arming generation counter.
    arm_counter: AtomicU64,
    config: LocalSchedulerConfig,
}

/// Scheduler backend A: in-process tokio timers.
pub struct LocalTimerScheduler {
    inner: Arc<Inner>,
}

impl LocalTimerScheduler {
    /// Scheduler with the default configuration and the system clock.
    pub fn new(sink: Arc<dyn ReminderSink>) -> Self {
        Self::with_config(LocalSchedulerConfig::default(), sink, Arc::new(SystemClock))
    }

    /// Scheduler with a custom configuration and clock.
    pub fn with_config(
        config: LocalSchedulerConfig,
        sink: Arc<dyn ReminderSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                table: Mutex::new(Table {
                    records: HashMap::new(),
                    ids: RecyclingIdAllocator::new(),
                }),
                clock,
                sink,
                log: LogStream::new(),
                enabled: AtomicBool::new(true),
                arm_counter: AtomicU64::new(0),
                config,
            }),
        }
    }

    /// Subscribe to the diagnostic log-line stream.
    pub fn subscribe_logs(&self) -> broadcast::Receiver<String> {
        self.inner.log.subscribe()
    }

    /// Number of live tasks (diagnostics).
    pub fn task_count(&self) -> usize {
        self.inner.table.lock().records.len()
    }

    fn insert_record(&self, id: TaskId, shape: TaskShape, task: SoundTask) {
        let mut table = self.inner.table.lock();
        table.records.insert(
            id,
            TaskState {
                task,
                shape,
                next_at_ms: 0,
                one_shot: TimerHandle::new(),
                repeating: None,
                arm_seq: 0,
            },
        );
    }

    fn attach_interval_check(&self, id: TaskId, period: Duration) {
        let check = arm_interval_check(&self.inner, id, period);
        let mut table = self.inner.table.lock();
        match table.records.get_mut(&id) {
            Some(record) => record.repeating = Some(check),
            // canceled between insert and here: tear the check down again
            None => check.cancel(),
        }
    }
}

/// Replace the pending one-shot of `id` with one firing at `at_ms`.
///
/// No-op when the record no longer exists. The previous one-shot handle is
/// cancelled under the lock, so at most one wake-up stays outstanding.
fn arm_one_shot(inner: &Arc<Inner>, id: TaskId, at_ms: i64) {
    let now = inner.clock.epoch_millis();
    let delay_ms = (at_ms - now).max(inner.config.min_arm_delay.as_millis() as i64);
    let handle = TimerHandle::new();

    let seq = inner.arm_counter.fetch_add(1, Ordering::SeqCst) + 1;
    {
        let mut table = inner.table.lock();
        let Some(record) = table.records.get_mut(&id) else { return };
        record.one_shot.cancel();
        record.one_shot = handle.clone();
        record.next_at_ms = at_ms;
        record.arm_seq = seq;
    }

    inner.log.emit(format!("[local] armed id={id} in={delay_ms}ms at={at_ms}"));
    debug!(%id, delay_ms, at_ms, "armed one-shot");

    let inner = Arc::clone(inner);
    tokio::spawn(async move {
        sleep(Duration::from_millis(delay_ms.max(0) as u64)).await;
        if handle.is_cancelled() {
            return;
        }
        on_fire(&inner, id, seq).await;
    });
}

/// One-shot wake-up: deliver, recompute, re-arm.
async fn on_fire(inner: &Arc<Inner>, id: TaskId, seq: u64) {
    let snapshot = {
        let table = inner.table.lock();
        match table.records.get(&id) {
            Some(record) if record.arm_seq == seq => {
                Some((record.task.clone(), record.shape.clone()))
            }
            _ => None,
        }
    };
    let Some((task, shape)) = snapshot else {
        // canceled or re-armed while this wake-up was in flight
        debug!(%id, "stale wake-up ignored");
        return;
    };

    let fired_at = inner.clock.epoch_millis();
    deliver(inner, id, &task, fired_at).await;

    let now = inner.clock.epoch_millis();
    let next = match &shape {
        TaskShape::Fixed { at } => window::next_fixed_fire_ms(now, *at),
        TaskShape::Interval { start, end, period } => {
            match window::next_interval_fire_ms(now, *start, *end, *period) {
                Ok(next) => next,
                Err(err) => {
                    warn!(%id, error = %err, "could not compute next interval fire");
                    return;
                }
            }
        }
    };
    // re-checks record existence under the lock; a cancel that landed
    // during delivery wins and nothing is re-armed
    arm_one_shot(inner, id, next);
}

/// Render one fire through the sink, honoring the kill switch.
async fn deliver(inner: &Arc<Inner>, id: TaskId, task: &SoundTask, at_ms: i64) {
    if !inner.enabled.load(Ordering::SeqCst) {
        debug!(%id, "fire suppressed: scheduler disabled");
        inner.log.emit(format!("[local] fire suppressed id={id}"));
        return;
    }

    inner.log.emit(format!("[local] fire id={id} sound={} vol={:.2}", task.sound, task.volume));
    info!(%id, sound = %task.sound, "reminder fired");

    let fire = ReminderFire { id, task: task.clone(), at_ms };
    if let Err(err) = inner.sink.deliver(&fire).await {
        warn!(%id, error = %err, "reminder delivery failed");
        inner.log.emit(format!("[local] delivery failed id={id}: {err}"));
    }
}

/// Repeating window check for interval tasks: delivers when a fire is due
/// within the tolerance, otherwise corrects the pending one-shot.
fn arm_interval_check(inner: &Arc<Inner>, id: TaskId, period: Duration) -> TimerHandle {
    let inner = Arc::clone(inner);
    recurring(period.max(Duration::from_secs(1)), move || {
        let inner = Arc::clone(&inner);
        async move { on_interval_check(&inner, id).await }
    })
}

async fn on_interval_check(inner: &Arc<Inner>, id: TaskId) {
    let snapshot = {
        let table = inner.table.lock();
        table.records.get(&id).map(|record| (record.task.clone(), record.shape.clone()))
    };
    let Some((task, TaskShape::Interval { start, end, period })) = snapshot else { return };

    let now = inner.clock.epoch_millis();
    let tolerance = inner.config.check_tolerance.as_millis() as i64;
    match window::next_interval_fire_ms(now, start, end, period) {
        Ok(next) if next <= now + tolerance => deliver(inner, id, &task, now).await,
        Ok(next) => arm_one_shot(inner, id, next),
        Err(err) => warn!(%id, error = %err, "interval check failed"),
    }
}

#[async_trait]
impl SoundTaskScheduler for LocalTimerScheduler {
    fn is_persistent(&self) -> bool {
        false
    }

    async fn ensure(&self) -> Result<()> {
        // nothing to set up without a platform boundary
        Ok(())
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

        let id = self.inner.table.lock().ids.allocate();
        let now = self.inner.clock.epoch_millis();
        let first = window::next_fixed_fire_ms(now, at);

        self.insert_record(id, TaskShape::Fixed { at }, task);
        arm_one_shot(&self.inner, id, first);

        self.inner.log.emit(format!("[local] start fixed id={id} at={at} first={first}"));
        info!(%id, %at, "fixed task started");
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

        let id = self.inner.table.lock().ids.allocate();
        let now = self.inner.clock.epoch_millis();
        let first = window::first_interval_fire_ms(now, start, end);

        self.insert_record(id, TaskShape::Interval { start, end, period }, task);
        arm_one_shot(&self.inner, id, first);
        self.attach_interval_check(id, period);

        self.inner
            .log
            .emit(format!("[local] start interval id={id} window={start}-{end} every={period_secs}s"));
        info!(%id, %start, %end, period_secs, "interval task started");
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
        // replace any prior task armed under this id
        {
            let mut table = self.inner.table.lock();
            if let Some(old) = table.records.remove(&id) {
                old.cancel_timers();
            }
        }

        let now = self.inner.clock.epoch_millis();
        let first = if request.trigger_at_ms > now {
            request.trigger_at_ms
        } else {
            match &request.shape {
                TaskShape::Fixed { at } => window::next_fixed_fire_ms(now, *at),
                TaskShape::Interval { start, end, .. } => {
                    window::first_interval_fire_ms(now, *start, *end)
                }
            }
        };

        self.insert_record(id, request.shape.clone(), request.task);
        arm_one_shot(&self.inner, id, first);
        if let TaskShape::Interval { period, .. } = &request.shape {
            self.attach_interval_check(id, *period);
        }

        self.inner.log.emit(format!(
            "[local] schedule id={id} mode={} first={first}",
            request.shape.mode_tag()
        ));
        Ok(())
    }

    async fn cancel(&self, id: TaskId) -> bool {
        {
            let mut table = self.inner.table.lock();
            if let Some(record) = table.records.remove(&id) {
                record.cancel_timers();
            }
            // unknown ids fall through: release is an idempotent no-op
            table.ids.release(id);
        }
        self.inner.log.emit(format!("[local] cancel id={id}"));
        debug!(%id, "task canceled");
        true
    }

    async fn cancel_all(&self, ids: &[TaskId]) -> bool {
        // one lock acquisition: no partial application is observable
        {
            let mut table = self.inner.table.lock();
            for id in ids {
                if let Some(record) = table.records.remove(id) {
                    record.cancel_timers();
                }
                table.ids.release(*id);
            }
        }
        self.inner.log.emit(format!("[local] cancelAll count={}", ids.len()));
        true
    }

    async fn is_scheduled(&self, id: TaskId) -> bool {
        self.inner.table.lock().records.contains_key(&id)
    }

    async fn next_fire_at(&self, id: TaskId) -> i64 {
        self.inner.table.lock().records.get(&id).map_or(0, |record| record.next_at_ms)
    }

    async fn set_enabled(&self, enabled: bool) -> Result<()> {
        self.inner.enabled.store(enabled, Ordering::SeqCst);
        self.inner.log.emit(format!("[local] enabled={enabled}"));
        info!(enabled, "delivery toggled");
        Ok(())
    }
}

impl Drop for LocalTimerScheduler {
    fn drop(&mut self) {
        let mut table = self.inner.table.lock();
        if !table.records.is_empty() {
            warn!(live = table.records.len(), "scheduler dropped with live tasks; cancelling");
        }
        for (_, record) in table.records.drain() {
            record.cancel_timers();
        }
    }
}
