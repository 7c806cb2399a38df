//! Value filter state carried by criteria builders
//!
//! A criteria holds at most two value filters, set exactly once:
//!
//! ```text
//! Unfiltered --filter()-------> Single
//! Unfiltered --filter_range()--> Range
//! Single / Range --any filter call--> InvalidState
//! ```

use crate::model::{Filter, Predicate};
use crate::query::error::{CriteriaError, CriteriaResult};

/// Value filters attached to a criteria
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FilterSet {
    /// No value filter
    #[default]
    Unfiltered,
    /// One bound
    Single(Filter),
    /// Two bounds forming a range
    Range(Filter, Filter),
}

impl FilterSet {
    /// Attach a single bound
    pub fn with_single(self, predicate: Predicate, value: f64) -> CriteriaResult<Self> {
        match self {
            Self::Unfiltered => Ok(Self::Single(Filter::new(predicate, check_value(value)?))),
            _ => Err(already_filtered()),
        }
    }

    /// Attach two bounds at once
    pub fn with_range(
        self,
        first: (Predicate, f64),
        second: (Predicate, f64),
    ) -> CriteriaResult<Self> {
        if !self.is_empty() {
            return Err(already_filtered());
        }
        // both bounds share one JSON object, so their codes must differ
        if first.0 == second.0 {
            return Err(CriteriaError::InvalidArgument(format!(
                "range filter needs two different predicates, got {} twice",
                first.0
            )));
        }
        Ok(Self::Range(
            Filter::new(first.0, check_value(first.1)?),
            Filter::new(second.0, check_value(second.1)?),
        ))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Unfiltered)
    }

    /// Filters in the order they were declared
    pub fn filters(&self) -> Vec<&Filter> {
        match self {
            Self::Unfiltered => Vec::new(),
            Self::Single(filter) => vec![filter],
            Self::Range(first, second) => vec![first, second],
        }
    }
}

fn check_value(value: f64) -> CriteriaResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CriteriaError::InvalidArgument(format!(
            "filter value must be finite, got {}",
            value
        )))
    }
}

fn already_filtered() -> CriteriaError {
    CriteriaError::InvalidState("value filter is already set, at most two filters may be set once".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_then_single_is_rejected() {
        let set = FilterSet::default()
            .with_single(Predicate::GreaterThan, 1.0)
            .unwrap();

        let err = set.with_single(Predicate::LessThan, 5.0).unwrap_err();
        assert!(matches!(err, CriteriaError::InvalidState(_)));
    }

    #[test]
    fn test_single_then_range_is_rejected() {
        let set = FilterSet::default()
            .with_single(Predicate::GreaterThan, 1.0)
            .unwrap();

        let err = set
            .with_range((Predicate::GreaterThan, 1.0), (Predicate::LessThan, 5.0))
            .unwrap_err();
        assert!(matches!(err, CriteriaError::InvalidState(_)));
    }

    #[test]
    fn test_range_then_anything_is_rejected() {
        let set = FilterSet::default()
            .with_range((Predicate::GreaterThan, 1.0), (Predicate::LessThan, 5.0))
            .unwrap();

        assert!(set.clone().with_single(Predicate::GreaterThan, 2.0).is_err());
        assert!(set
            .with_range((Predicate::GreaterThan, 1.0), (Predicate::LessThan, 5.0))
            .is_err());
    }

    #[test]
    fn test_filters_keep_declaration_order() {
        let set = FilterSet::default()
            .with_range((Predicate::LessThan, 5.0), (Predicate::GreaterOrEqual, 1.0))
            .unwrap();

        let filters = set.filters();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].predicate(), Predicate::LessThan);
        assert_eq!(filters[1].predicate(), Predicate::GreaterOrEqual);
    }

    #[test]
    fn test_range_with_same_predicate_is_rejected() {
        let err = FilterSet::default()
            .with_range((Predicate::GreaterThan, 1.0), (Predicate::GreaterThan, 5.0))
            .unwrap_err();
        assert!(matches!(err, CriteriaError::InvalidArgument(_)));
    }

    #[test]
    fn test_non_finite_value_is_rejected() {
        let err = FilterSet::default()
            .with_single(Predicate::GreaterThan, f64::NAN)
            .unwrap_err();
        assert!(matches!(err, CriteriaError::InvalidArgument(_)));
    }
}
