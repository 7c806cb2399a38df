//! Value-comparison filters

use crate::model::function::Predicate;
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single value bound attached to a criteria
///
/// Two filters combine into a bounded range (e.g. `gt` + `lt`).
/// Equality and hashing compare the value bitwise, so filters can be
/// used as map keys.
#[derive(Debug, Clone, Serialize)]
pub struct Filter {
    metric: Option<String>,
    predicate: Predicate,
    value: f64,
}

impl Filter {
    /// Create a filter that applies to every metric of the query
    pub fn new(predicate: Predicate, value: f64) -> Self {
        Self {
            metric: None,
            predicate,
            value,
        }
    }

    /// Create a filter bound to one metric
    pub fn for_metric(metric: impl Into<String>, predicate: Predicate, value: f64) -> Self {
        Self {
            metric: Some(metric.into()),
            predicate,
            value,
        }
    }

    pub fn metric(&self) -> Option<&str> {
        self.metric.as_deref()
    }

    pub fn predicate(&self) -> Predicate {
        self.predicate
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl PartialEq for Filter {
    fn eq(&self, other: &Self) -> bool {
        self.metric == other.metric
            && self.predicate == other.predicate
            && self.value.to_bits() == other.value.to_bits()
    }
}

impl Eq for Filter {}

impl Hash for Filter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.metric.hash(state);
        self.predicate.hash(state);
        self.value.to_bits().hash(state);
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.metric {
            Some(metric) => write!(f, "{} {} {}", metric, self.predicate, self.value),
            None => write!(f, "{} {}", self.predicate, self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_filter_equality() {
        let a = Filter::new(Predicate::GreaterThan, 10.0);
        let b = Filter::new(Predicate::GreaterThan, 10.0);
        let c = Filter::for_metric("cpu", Predicate::GreaterThan, 10.0);
        let d = Filter::new(Predicate::GreaterOrEqual, 10.0);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_filter_as_set_key() {
        let mut set = HashSet::new();
        set.insert(Filter::new(Predicate::LessThan, 1.5));
        set.insert(Filter::new(Predicate::LessThan, 1.5));
        set.insert(Filter::new(Predicate::LessThan, 2.5));

        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(Filter::new(Predicate::LessOrEqual, 20.5).to_string(), "le 20.5");
        assert_eq!(
            Filter::for_metric("cpu", Predicate::GreaterThan, 1.0).to_string(),
            "cpu gt 1"
        );
    }
}
