//! Time utilities
//!
//! - **Clock abstractions**: re-exported from [`crate::testing::time`] so
//!   production code can depend on `time` without pulling in test helpers
//! - **[`timer`]**: cancellable one-shot and recurring timers

pub mod timer;

pub use timer::{one_shot, recurring, TimerHandle};

// Re-export Clock abstractions from the testing module
pub use crate::testing::time::{Clock, MockClock, SystemClock};
