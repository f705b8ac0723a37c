//! Port interfaces for the scheduling engine
//!
//! These traits define the boundaries between core scheduling logic and
//! infrastructure implementations: the external platform scheduler, the
//! sound/notification renderer, and counter persistence.

use async_trait::async_trait;
use chime_domain::{ArmRequest, ReminderFire, Result, TaskId};

/// The external, always-on platform scheduler ("the boundary").
///
/// All calls are bounded and fail fast when the boundary is unreachable;
/// callers treat query failures as closed (`false` / `0`).
#[async_trait]
pub trait AlarmBoundary: Send + Sync {
    /// Arm a wake-up with the full task parameters.
    async fn arm(&self, request: &ArmRequest) -> Result<()>;

    /// Cancel the wake-up armed under `id`.
    async fn cancel(&self, id: TaskId) -> Result<()>;

    /// Cancel every wake-up in `ids`.
    async fn cancel_all(&self, ids: &[TaskId]) -> Result<()>;

    /// Whether a wake-up is currently armed under `id`.
    async fn is_scheduled(&self, id: TaskId) -> Result<bool>;

    /// Next fire instant of `id` in epoch milliseconds, 0 when unknown.
    async fn next_fire_at(&self, id: TaskId) -> Result<i64>;

    /// Orthogonal kill switch; not part of any per-task lifecycle.
    async fn set_globally_enabled(&self, enabled: bool) -> Result<()>;

    /// Request notification/wake-up permissions from the platform.
    async fn ensure_permissions(&self) -> Result<()>;

    /// Capability probe: does this boundary survive process death?
    fn is_persistent(&self) -> bool;
}

/// Renders the sound/notification side effect of a fire.
///
/// Implemented by the presentation/platform layer; the in-process backend
/// calls it outside its bookkeeping lock.
#[async_trait]
pub trait ReminderSink: Send + Sync {
    /// Render one fire.
    async fn deliver(&self, fire: &ReminderFire) -> Result<()>;
}

/// Persistence for the monotonic id counter.
///
/// Writes happen synchronously after every allocation; see
/// [`MonotonicIdAllocator`](super::ids::MonotonicIdAllocator).
pub trait CounterStore: Send + Sync {
    /// Last persisted counter value, `None` when nothing was stored yet.
    fn load(&self) -> Result<Option<i64>>;

    /// Persist `next` as the next id to hand out.
    fn save(&self, next: i64) -> Result<()>;
}

/// The scheduler facade: one surface regardless of backend.
///
/// Backends: the in-process timer scheduler and the delegating scheduler
/// that forwards to an [`AlarmBoundary`]. Selected once at construction,
/// not per call.
#[async_trait]
pub trait SoundTaskScheduler: Send + Sync {
    /// Whether armed tasks survive process death (delegating backend).
    fn is_persistent(&self) -> bool;

    /// Permission/setup pass-through; a no-op for the in-process backend.
    async fn ensure(&self) -> Result<()>;

    /// Start a daily fixed task. The daily time is the local wall-clock
    /// time of `fixed_time_ms`; the first fire instant is computed from it.
    ///
    /// On failure the allocated id is released before the error returns.
    async fn start_fixed(
        &self,
        sound: &str,
        text: &str,
        fixed_time_ms: i64,
        volume: f32,
    ) -> Result<TaskId>;

    /// Start an interval task firing every `period_secs` inside the window
    /// derived from `start_ms`/`end_ms` (zero = unset; see
    /// [`interval_shape_from_ms`](super::params::interval_shape_from_ms)).
    ///
    /// On failure the allocated id is released before the error returns.
    async fn start_interval(
        &self,
        sound: &str,
        text: &str,
        start_ms: i64,
        end_ms: i64,
        period_secs: i64,
        volume: f32,
    ) -> Result<TaskId>;

    /// Arm under a caller-provided id, replacing any prior state for it.
    async fn schedule(&self, request: ArmRequest) -> Result<()>;

    /// Cancel `id`. Unknown ids are a successful no-op; the result is
    /// `false` only when a boundary call failed.
    async fn cancel(&self, id: TaskId) -> bool;

    /// Cancel every id in `ids` as one atomic bookkeeping operation. An
    /// empty set is a successful no-op.
    async fn cancel_all(&self, ids: &[TaskId]) -> bool;

    /// Whether `id` has a pending wake-up. Fails closed.
    async fn is_scheduled(&self, id: TaskId) -> bool;

    /// Next fire instant of `id` in epoch milliseconds, 0 when unknown.
    /// Fails closed.
    async fn next_fire_at(&self, id: TaskId) -> i64;

    /// Global kill switch: suppress delivery without touching schedules.
    async fn set_enabled(&self, enabled: bool) -> Result<()>;
}
