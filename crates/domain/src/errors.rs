//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Chime
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ChimeError {
    /// The external alarm boundary could not be reached. Operations fail
    /// fast; the caller retries at the next user-visible trigger.
    #[error("Boundary error: {0}")]
    Boundary(String),

    /// Rejected before any id was allocated (bad period, half-set window,
    /// missing trigger time).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Persisting or loading the id counter failed.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Chime operations
pub type Result<T> = std::result::Result<T, ChimeError>;
