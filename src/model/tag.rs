//! Series tags
//!
//! A series is identified by its metric name plus a set of `name=value`
//! tags. Tags are only ever produced by decoding a series line.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single `name=value` dimension of a series
///
/// Ordering is by name first, then value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tag {
    name: String,
    value: String,
}

impl Tag {
    /// Create a new tag
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Tag key
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tag value
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}
