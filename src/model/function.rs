//! Closed vocabularies used by criteria and result rows

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reduction applied over a value range
///
/// Declaration order is significant: group-aggregate requests list their
/// functions in this order, and the store answers in the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFunction {
    /// Number of data points
    Count,
    /// Maximum value
    Max,
    /// Minimum value
    Min,
    /// Arithmetic mean
    Mean,
    /// Sum of values
    Sum,
    /// Timestamp of the minimum value
    MinTimestamp,
    /// Timestamp of the maximum value
    MaxTimestamp,
    /// First value in the range
    First,
    /// Last value in the range
    Last,
}

impl AggregateFunction {
    /// Get all functions in declaration order
    pub fn all() -> &'static [AggregateFunction] {
        &[
            Self::Count,
            Self::Max,
            Self::Min,
            Self::Mean,
            Self::Sum,
            Self::MinTimestamp,
            Self::MaxTimestamp,
            Self::First,
            Self::Last,
        ]
    }

    /// Wire name, as it appears in requests and series lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Max => "max",
            Self::Min => "min",
            Self::Mean => "mean",
            Self::Sum => "sum",
            Self::MinTimestamp => "min_timestamp",
            Self::MaxTimestamp => "max_timestamp",
            Self::First => "first",
            Self::Last => "last",
        }
    }

    /// Parse a wire name. Matching is exact and case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "count" => Some(Self::Count),
            "max" => Some(Self::Max),
            "min" => Some(Self::Min),
            "mean" => Some(Self::Mean),
            "sum" => Some(Self::Sum),
            "min_timestamp" => Some(Self::MinTimestamp),
            "max_timestamp" => Some(Self::MaxTimestamp),
            "first" => Some(Self::First),
            "last" => Some(Self::Last),
            _ => None,
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison used by value filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Predicate {
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
}

impl Predicate {
    /// Two-letter code used inside the `filter` clause
    pub fn wire_code(&self) -> &'static str {
        match self {
            Self::GreaterThan => "gt",
            Self::GreaterOrEqual => "ge",
            Self::LessThan => "lt",
            Self::LessOrEqual => "le",
        }
    }

    /// Parse a two-letter wire code
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "gt" => Some(Self::GreaterThan),
            "ge" => Some(Self::GreaterOrEqual),
            "lt" => Some(Self::LessThan),
            "le" => Some(Self::LessOrEqual),
            _ => None,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_code())
    }
}

/// Order of data points in a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderBy {
    /// By series name first, then by timestamp
    Series,
    /// By timestamp first, then by series name
    Time,
}

impl OrderBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Series => "series",
            Self::Time => "time",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "series" => Some(Self::Series),
            "time" => Some(Self::Time),
            _ => None,
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_function_names() {
        for function in AggregateFunction::all() {
            assert_eq!(AggregateFunction::from_name(function.as_str()), Some(*function));
        }

        assert_eq!(AggregateFunction::MinTimestamp.to_string(), "min_timestamp");
        assert_eq!(AggregateFunction::from_name("MAX"), None);
        assert_eq!(AggregateFunction::from_name("avg"), None);
    }

    #[test]
    fn test_aggregate_function_declaration_order() {
        let mut shuffled = vec![
            AggregateFunction::Sum,
            AggregateFunction::Count,
            AggregateFunction::Last,
            AggregateFunction::Max,
        ];
        shuffled.sort();

        assert_eq!(
            shuffled,
            vec![
                AggregateFunction::Count,
                AggregateFunction::Max,
                AggregateFunction::Sum,
                AggregateFunction::Last,
            ]
        );
    }

    #[test]
    fn test_predicate_codes() {
        assert_eq!(Predicate::GreaterThan.wire_code(), "gt");
        assert_eq!(Predicate::GreaterOrEqual.wire_code(), "ge");
        assert_eq!(Predicate::LessThan.wire_code(), "lt");
        assert_eq!(Predicate::LessOrEqual.wire_code(), "le");

        assert_eq!(Predicate::from_code("le"), Some(Predicate::LessOrEqual));
        assert_eq!(Predicate::from_code("eq"), None);
    }

    #[test]
    fn test_order_by_names() {
        assert_eq!(OrderBy::Series.as_str(), "series");
        assert_eq!(OrderBy::from_name("time"), Some(OrderBy::Time));
        assert_eq!(OrderBy::from_name("Time"), None);
    }
}
