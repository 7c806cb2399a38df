//! Criteria error types
//!
//! Builder validation failures. These are raised by `build()` or by a setter
//! that detects a conflicting call; a built criteria never fails afterwards.

use thiserror::Error;

/// Errors that can occur while building criteria
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CriteriaError {
    /// A mandatory builder field was never set
    #[error("Missing required field: [{0}] parameter is required")]
    MissingRequiredField(&'static str),

    /// Neither `from` nor `to` was set on a criteria that needs a range
    #[error("Missing range: [from] and [to] are mandatory parameters")]
    MissingRange,

    /// A setter was called in a state that does not allow it
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A setter argument can not be encoded
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type for criteria operations
pub type CriteriaResult<T> = Result<T, CriteriaError>;
