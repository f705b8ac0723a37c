//! Scheduler backends
//!
//! Two implementations of the `SoundTaskScheduler` facade:
//! - [`local`]: in-process tokio timers, no persistence
//! - [`delegating`]: forwards arming to the external alarm boundary
//!
//! [`factory`] selects between them once, at construction. Both backends
//! keep their mutable bookkeeping behind a single `parking_lot::Mutex` and
//! run boundary calls, window arithmetic and sound delivery outside it.

pub mod delegating;
pub mod error;
pub mod factory;
pub mod local;

pub use delegating::{DelegatingScheduler, DelegatingSchedulerConfig};
pub use error::{SchedulerError, SchedulerResult};
pub use factory::create_scheduler;
pub use local::{LocalTimerScheduler, LocalSchedulerConfig};
