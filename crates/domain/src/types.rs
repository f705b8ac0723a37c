//! Common data types used throughout the application

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

/// Identifier of a live sound task.
///
/// Positive and unique among currently-live tasks of a scheduler instance.
/// Allocation starts at [`crate::constants::TASK_ID_BASE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i32);

impl TaskId {
    /// Wrap a raw id value.
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// The raw integer value, as forwarded across the platform boundary.
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Ids are positive; zero and negative values mark "no task".
    pub const fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Local wall-clock time of day (hour and minute).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    /// Build a time of day, clamping the hour to 0-23 and the minute to
    /// 0-59.
    pub fn new(hour: u32, minute: u32) -> Self {
        Self { hour: hour.min(23) as u8, minute: minute.min(59) as u8 }
    }

    /// Parse an `"HH:MM"` string.
    ///
    /// Forgiving by design: out-of-range components are clamped and
    /// unparsable components read as 0, so `"7:5"`, `"99:99"` and `"xx:30"`
    /// all yield a usable value. A string without a `:` separator is
    /// midnight.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        let mut parts = trimmed.splitn(2, ':');
        let hour = parts.next().and_then(|p| p.trim().parse::<u32>().ok()).unwrap_or(0);
        let minute = parts.next().and_then(|p| p.trim().parse::<u32>().ok()).unwrap_or(0);
        Self::new(hour, minute)
    }

    /// The time of day of `instant` in that instant's timezone.
    pub fn of<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self {
        Self::new(instant.hour(), instant.minute())
    }

    /// Hour component, 0-23.
    pub const fn hour(self) -> u32 {
        self.hour as u32
    }

    /// Minute component, 0-59.
    pub const fn minute(self) -> u32 {
        self.minute as u32
    }

    /// Minutes past midnight.
    pub const fn minutes_from_midnight(self) -> u32 {
        self.hour as u32 * 60 + self.minute as u32
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// The two supported triggering shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TaskShape {
    /// Fires once per day at `at`, forever until canceled.
    Fixed {
        /// Daily fire time.
        at: TimeOfDay,
    },
    /// Fires every `period` while the local clock lies inside
    /// `[start, end)`. `end <= start` (equality included) spans midnight;
    /// `start == end` is a full-day window.
    Interval {
        /// Window start.
        start: TimeOfDay,
        /// Window end (exclusive).
        end: TimeOfDay,
        /// Spacing between fires.
        period: Duration,
    },
}

impl TaskShape {
    /// Wire tag forwarded to the platform boundary.
    pub const fn mode_tag(&self) -> &'static str {
        match self {
            Self::Fixed { .. } => "fixed",
            Self::Interval { .. } => "interval",
        }
    }

    /// True for the interval shape.
    pub const fn is_interval(&self) -> bool {
        matches!(self, Self::Interval { .. })
    }

    /// Period in whole seconds; 0 for fixed tasks.
    pub const fn period_secs(&self) -> i64 {
        match self {
            Self::Fixed { .. } => 0,
            Self::Interval { period, .. } => period.as_secs() as i64,
        }
    }
}

/// Delivery payload of a task: which sound to render, how loud, and the
/// notification text shown alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundTask {
    /// Sound reference (bare name, file path or URL) resolved by the
    /// rendering layer.
    pub sound: String,
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub body: String,
    /// Playback volume in `[0.0, 1.0]`.
    pub volume: f32,
}

impl SoundTask {
    /// Build a payload, clamping `volume` into `[0.0, 1.0]`. Non-finite
    /// input becomes full volume.
    pub fn new(
        sound: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        volume: f32,
    ) -> Self {
        let volume = if volume.is_finite() { volume.clamp(0.0, 1.0) } else { 1.0 };
        Self { sound: sound.into(), title: title.into(), body: body.into(), volume }
    }
}

/// Full arming parameters forwarded to a scheduler backend or across the
/// platform boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmRequest {
    /// Task id the wake-up is armed under.
    pub id: TaskId,
    /// First fire instant, epoch milliseconds.
    pub trigger_at_ms: i64,
    /// Triggering shape.
    pub shape: TaskShape,
    /// Delivery payload.
    pub task: SoundTask,
}

impl ArmRequest {
    /// `"HH:MM"` wire form of the fixed fire time. Interval requests carry
    /// midnight, matching what the boundary expects in that slot.
    pub fn fixed_time_str(&self) -> String {
        match &self.shape {
            TaskShape::Fixed { at } => at.to_string(),
            TaskShape::Interval { .. } => TimeOfDay::new(0, 0).to_string(),
        }
    }

    /// `"HH:MM"` wire form of the window start; empty for fixed requests.
    pub fn start_time_str(&self) -> String {
        match &self.shape {
            TaskShape::Fixed { .. } => String::new(),
            TaskShape::Interval { start, .. } => start.to_string(),
        }
    }

    /// `"HH:MM"` wire form of the window end; empty for fixed requests.
    pub fn end_time_str(&self) -> String {
        match &self.shape {
            TaskShape::Fixed { .. } => String::new(),
            TaskShape::Interval { end, .. } => end.to_string(),
        }
    }
}

/// A single fire delivered to the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderFire {
    /// Task that fired.
    pub id: TaskId,
    /// Payload to render.
    pub task: SoundTask,
    /// Fire instant, epoch milliseconds.
    pub at_ms: i64,
}
