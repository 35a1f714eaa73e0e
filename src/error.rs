//! Error types for gazeflux

use crate::schema::ValidationError;
use thiserror::Error;

/// Errors that can occur during computation
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse recording: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid recording: {0}")]
    InvalidRecording(#[from] ValidationError),

    #[error("Invalid sample at index {index}: {reason}")]
    InvalidSample { index: usize, reason: String },

    #[error("Timestamps must be non-decreasing: sample {index} has {current} after {previous}")]
    NonMonotonicTimestamp {
        index: usize,
        previous: f64,
        current: f64,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid time window: {0}")]
    InvalidWindow(String),

    #[error("Insufficient trials: expected at least {expected}, got {actual}")]
    InsufficientTrials { expected: usize, actual: usize },

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
