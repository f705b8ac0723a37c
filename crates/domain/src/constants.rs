//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

/// Notification title shown with every fire.
pub const NOTIFICATION_TITLE: &str = "Chime";

/// First task id handed out by either allocator. Chosen well above the
/// request codes used by unrelated platform components so a task id can
/// never collide with one of theirs.
pub const TASK_ID_BASE: i32 = 777_001;

/// Grace period after a fixed task's due time before the delegating backend
/// releases its local id bookkeeping without boundary confirmation.
pub const FIXED_RELEASE_GRACE_MS: i64 = 60_000;

/// Tolerance when the repeating interval check decides whether a computed
/// fire instant counts as "due now".
pub const INTERVAL_CHECK_TOLERANCE_MS: i64 = 50;

/// Minimum delay before a freshly armed task may fire. Keeps an
/// inside-the-window interval start from firing in the same event-loop turn
/// it was created in.
pub const MIN_ARM_DELAY_MS: i64 = 250;

/// Shortest supported interval period.
pub const MIN_PERIOD_MS: i64 = 1_000;
