//! Scheduling engine core
//!
//! - **[`window`]**: pure next-fire arithmetic for both task shapes
//! - **[`ids`]**: task id allocation and reclamation
//! - **[`params`]**: facade parameter validation (shape construction)
//! - **[`ports`]**: traits at the seams to infrastructure

pub mod ids;
pub mod params;
pub mod ports;
pub mod window;

pub use ids::{MonotonicIdAllocator, RecyclingIdAllocator};
pub use params::{fixed_shape_from_ms, interval_shape_from_ms};
pub use ports::{AlarmBoundary, CounterStore, ReminderSink, SoundTaskScheduler};
