//! Engine error types

use crate::engine::status::Status;
use thiserror::Error;

/// A failed engine call, carrying the status reported by the engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Engine error: {status}: {message}")]
pub struct EngineError {
    status: Status,
    message: String,
}

impl EngineError {
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Error whose message is the status description
    pub fn from_status(status: Status) -> Self {
        Self::new(status, status.message())
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result type for engine calls
pub type EngineResult<T> = Result<T, EngineError>;
