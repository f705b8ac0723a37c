//! Scheduler error types

use chime_domain::{ChimeError, TaskId};
use thiserror::Error;

/// Backend-local errors, converted into [`ChimeError`] at the facade
/// surface.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Arming a task at the boundary failed
    #[error("Failed to arm task {id}: {reason}")]
    ArmFailed {
        /// Task the arm attempt was for
        id: TaskId,
        /// Boundary-reported reason
        reason: String,
    },

    /// The alarm boundary could not be reached
    #[error("Alarm boundary unavailable: {0}")]
    BoundaryUnavailable(String),

    /// Persisting or loading the id counter failed
    #[error("Counter persistence failed: {0}")]
    CounterPersistence(String),
}

impl From<std::io::Error> for SchedulerError {
    fn from(err: std::io::Error) -> Self {
        Self::CounterPersistence(err.to_string())
    }
}

impl From<serde_json::Error> for SchedulerError {
    fn from(err: serde_json::Error) -> Self {
        Self::CounterPersistence(err.to_string())
    }
}

impl From<SchedulerError> for ChimeError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::ArmFailed { .. } | SchedulerError::BoundaryUnavailable(_) => {
                ChimeError::Boundary(err.to_string())
            }
            SchedulerError::CounterPersistence(_) => ChimeError::Storage(err.to_string()),
        }
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
