//! Time abstraction for testability
//!
//! Provides a trait-based approach to wall-clock reads so code can run
//! against either real system time or a mock that tests advance manually.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use chime_common::testing::{Clock, MockClock, SystemClock};
//!
//! // Use the system clock in production
//! let clock = SystemClock;
//! let _ = clock.epoch_millis();
//!
//! // Use the mock clock in tests
//! let mock = MockClock::at_epoch_millis(1_000);
//! mock.advance(Duration::from_secs(5));
//! assert_eq!(mock.epoch_millis(), 6_000);
//! ```

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Trait for wall-clock reads.
///
/// Schedulers take this as `Arc<dyn Clock>` so tests can pin "now" without
/// waiting for real time to pass.
pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    fn system_time(&self) -> SystemTime;

    /// Milliseconds since the UNIX epoch.
    ///
    /// Saturates at 0 for clocks set before the epoch.
    fn epoch_millis(&self) -> i64 {
        self.system_time()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Real system clock. Use this in production code.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Mock clock for deterministic tests.
///
/// Starts at a fixed epoch offset and only moves when [`MockClock::advance`]
/// is called. Clones share the same underlying state.
#[derive(Debug, Clone)]
pub struct MockClock {
    base: SystemTime,
    elapsed: Arc<Mutex<Duration>>,
}

impl MockClock {
    /// Create a mock clock pinned at the current real time.
    pub fn new() -> Self {
        Self { base: SystemTime::now(), elapsed: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    /// Create a mock clock pinned at `ms` milliseconds past the UNIX epoch.
    pub fn at_epoch_millis(ms: u64) -> Self {
        Self {
            base: UNIX_EPOCH + Duration::from_millis(ms),
            elapsed: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Advance the clock by `duration` without real time passing.
    pub fn advance(&self, duration: Duration) {
        if let Ok(mut elapsed) = self.elapsed.lock() {
            *elapsed += duration;
        }
    }

    /// Total duration this clock has been advanced.
    pub fn elapsed(&self) -> Duration {
        self.elapsed.lock().map(|d| *d).unwrap_or(Duration::ZERO)
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn system_time(&self) -> SystemTime {
        self.base + self.elapsed()
    }
}
