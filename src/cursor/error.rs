//! Row decode error types

use thiserror::Error;

/// Errors raised while decoding a series line
///
/// A decode error only affects the current row; the stream can still be
/// advanced or closed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The suffix after `:` is not an aggregate function name
    #[error("Unknown aggregate function '{name}' in series '{series}'")]
    UnknownAggregate { name: String, series: String },

    /// A tag token has no `=`
    #[error("Malformed tag '{token}' in series '{series}'")]
    MalformedTag { token: String, series: String },
}

/// Result type for row decoding
pub type DecodeResult<T> = Result<T, DecodeError>;
