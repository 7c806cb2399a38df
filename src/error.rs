//! Crate-level error type

use crate::cursor::DecodeError;
use crate::engine::EngineError;
use crate::query::CriteriaError;
use thiserror::Error;

/// Errors returned by sessions and cursors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Criteria error: {0}")]
    Criteria(#[from] CriteriaError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("{0}")]
    Engine(#[from] EngineError),

    /// A stream was used after `close()`
    #[error("Stream is closed")]
    StreamClosed,

    /// A sample was rejected before reaching the engine
    #[error("Invalid sample: {0}")]
    InvalidSample(String),
}

/// Result type for sessions and cursors
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Status;

    #[test]
    fn test_conversions() {
        let err: Error = CriteriaError::MissingRange.into();
        assert!(matches!(err, Error::Criteria(CriteriaError::MissingRange)));

        let err: Error = EngineError::new(Status::Busy, "try later").into();
        assert_eq!(err.to_string(), "Engine error: Device is busy (3): try later");
    }
}
