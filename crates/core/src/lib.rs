//! # Chime Core
//!
//! Business logic of the scheduling engine.
//!
//! This crate contains:
//! - Window arithmetic (pure next-fire computations)
//! - Task id allocators (recycling and monotonic policies)
//! - Port traits implemented by infrastructure (`AlarmBoundary`,
//!   `ReminderSink`, `CounterStore`) and the `SoundTaskScheduler` facade
//!
//! ## Architecture
//! - Depends only on `chime-domain`
//! - No I/O; all side effects live behind the port traits

pub mod scheduling;

// Re-export commonly used items
pub use scheduling::ids::{MonotonicIdAllocator, RecyclingIdAllocator};
pub use scheduling::ports::{AlarmBoundary, CounterStore, ReminderSink, SoundTaskScheduler};
