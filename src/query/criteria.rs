//! Criteria capability and the shared request grammar
//!
//! Every criteria variant compiles to one JSON object. The defining clause
//! comes first, followed by the optional clauses in a fixed order:
//!
//! ```text
//! {<select|aggregate|group-aggregate|join>, range, where,
//!  group-by-tag, pivot-by-tag, order-by, filter, limit, offset}
//! ```
//!
//! Clauses are only emitted when their backing field is set.

use crate::model::{to_epoch, OrderBy};
use crate::query::error::{CriteriaError, CriteriaResult};
use crate::query::filter::FilterSet;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

/// A built, immutable query description
///
/// Implementations compile once and hand back the cached document on
/// every later call, so `compile` is cheap and returns identical bytes.
pub trait Criteria: fmt::Debug + Send + Sync {
    /// Start of the time range in nanoseconds since the epoch, 0 when unset
    fn from(&self) -> i64;

    /// End of the time range in nanoseconds since the epoch, 0 when unset
    fn to(&self) -> i64;

    /// Short name of the criteria variant
    fn kind(&self) -> &'static str;

    /// The request document
    fn compile(&self) -> &str;
}

/// Optional clauses shared by the criteria variants
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clauses {
    pub(crate) from: i64,
    pub(crate) to: i64,
    pub(crate) tag_name: Option<String>,
    pub(crate) tag_values: Vec<String>,
    pub(crate) group_by_tag: Vec<String>,
    pub(crate) pivot_by_tag: Vec<String>,
    pub(crate) order_by: Option<OrderBy>,
    pub(crate) filters: FilterSet,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
}

impl Clauses {
    pub fn from(&self) -> i64 {
        self.from
    }

    pub fn to(&self) -> i64 {
        self.to
    }

    /// Tag name of the `where` clause
    pub fn tag_name(&self) -> Option<&str> {
        self.tag_name.as_deref()
    }

    /// Distinct tag values of the `where` clause
    pub fn tag_values(&self) -> &[String] {
        &self.tag_values
    }

    pub fn group_by_tag(&self) -> &[String] {
        &self.group_by_tag
    }

    pub fn pivot_by_tag(&self) -> &[String] {
        &self.pivot_by_tag
    }

    pub fn order_by(&self) -> Option<OrderBy> {
        self.order_by
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Fail with `InvalidArgument` if a `where`, group-by or pivot tag
    /// name is blank
    pub(crate) fn validate_tags(&self) -> CriteriaResult<()> {
        let names = self
            .tag_name
            .iter()
            .chain(&self.group_by_tag)
            .chain(&self.pivot_by_tag);
        for name in names {
            if name.trim().is_empty() {
                return Err(CriteriaError::InvalidArgument(
                    "tag name must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Fail with `MissingRange` unless `from` or `to` is set
    pub(crate) fn require_range(&self) -> CriteriaResult<()> {
        if self.from <= 0 && self.to <= 0 {
            return Err(CriteriaError::MissingRange);
        }
        Ok(())
    }
}

/// Builds a request document clause by clause, keeping insertion order
#[derive(Debug, Default)]
pub(crate) struct RequestWriter {
    root: Map<String, Value>,
}

impl RequestWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a top-level field
    pub(crate) fn field(mut self, key: &str, value: Value) -> Self {
        self.root.insert(key.to_string(), value);
        self
    }

    /// Append every optional clause that is set, in grammar order
    pub(crate) fn clauses(self, clauses: &Clauses) -> Self {
        self.range(clauses.from, clauses.to)
            .where_tag(clauses.tag_name.as_deref(), &clauses.tag_values)
            .string_list("group-by-tag", &clauses.group_by_tag)
            .string_list("pivot-by-tag", &clauses.pivot_by_tag)
            .order_by(clauses.order_by)
            .filter(&clauses.filters)
            .count("limit", clauses.limit)
            .count("offset", clauses.offset)
    }

    fn range(mut self, from: i64, to: i64) -> Self {
        if from <= 0 {
            return self;
        }
        let mut range = Map::new();
        range.insert("from".to_string(), Value::from(from));
        if to > 0 {
            range.insert("to".to_string(), Value::from(to));
        }
        self.root.insert("range".to_string(), Value::Object(range));
        self
    }

    pub(crate) fn where_tag(mut self, tag_name: Option<&str>, tag_values: &[String]) -> Self {
        if let Some(name) = tag_name {
            if !tag_values.is_empty() {
                let mut clause = Map::new();
                clause.insert(name.to_string(), string_array(tag_values));
                self.root.insert("where".to_string(), Value::Object(clause));
            }
        }
        self
    }

    fn string_list(mut self, key: &str, values: &[String]) -> Self {
        if !values.is_empty() {
            self.root.insert(key.to_string(), string_array(values));
        }
        self
    }

    fn order_by(mut self, order_by: Option<OrderBy>) -> Self {
        if let Some(order) = order_by {
            self.root
                .insert("order-by".to_string(), Value::from(order.as_str()));
        }
        self
    }

    fn filter(mut self, filters: &FilterSet) -> Self {
        if filters.is_empty() {
            return self;
        }
        let mut clause = Map::new();
        for filter in filters.filters() {
            clause.insert(
                filter.predicate().wire_code().to_string(),
                Value::from(filter.value()),
            );
        }
        self.root.insert("filter".to_string(), Value::Object(clause));
        self
    }

    fn count(mut self, key: &str, value: Option<u64>) -> Self {
        if let Some(n) = value {
            self.root.insert(key.to_string(), Value::from(n));
        }
        self
    }

    /// Serialize the document
    pub(crate) fn finish(self) -> String {
        Value::Object(self.root).to_string()
    }
}

/// JSON array of strings
pub(crate) fn string_array(values: &[String]) -> Value {
    Value::Array(values.iter().cloned().map(Value::String).collect())
}

/// Return the cached document, encoding it on first use
pub(crate) fn compile_once<'a>(
    cell: &'a OnceLock<String>,
    kind: &'static str,
    encode: impl FnOnce() -> String,
) -> &'a str {
    cell.get_or_init(|| {
        let document = encode();
        tracing::debug!(kind, %document, "Compiled request document");
        document
    })
}

/// Distinct values in first-seen order
pub(crate) fn distinct<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(Into::into)
        .filter(|item: &String| seen.insert(item.clone()))
        .collect()
}

/// Nanosecond epoch of a calendar instant, for builder setters
pub(crate) fn epoch_of(instant: &DateTime<Utc>) -> CriteriaResult<i64> {
    to_epoch(instant).ok_or_else(|| {
        CriteriaError::InvalidArgument(format!(
            "{} is outside the nanosecond epoch range",
            instant.to_rfc3339()
        ))
    })
}

/// `from`, `to` and their calendar-instant forms
macro_rules! range_setters {
    () => {
        /// Start of the time range, in nanoseconds since the epoch
        ///
        /// If `from` is greater than `to` the data points are returned in
        /// descending order.
        pub fn from(mut self, from: i64) -> Self {
            self.clauses.from = from;
            self
        }

        /// End of the time range, in nanoseconds since the epoch
        pub fn to(mut self, to: i64) -> Self {
            self.clauses.to = to;
            self
        }

        /// Start of the time range as a calendar instant
        pub fn from_datetime(
            mut self,
            from: chrono::DateTime<chrono::Utc>,
        ) -> $crate::query::CriteriaResult<Self> {
            self.clauses.from = $crate::query::criteria::epoch_of(&from)?;
            Ok(self)
        }

        /// End of the time range as a calendar instant
        pub fn to_datetime(
            mut self,
            to: chrono::DateTime<chrono::Utc>,
        ) -> $crate::query::CriteriaResult<Self> {
            self.clauses.to = $crate::query::criteria::epoch_of(&to)?;
            Ok(self)
        }
    };
}

/// Tag filter: the `where` clause
macro_rules! where_setter {
    () => {
        /// Limit the series to those whose `tag_name` tag takes one of
        /// `tag_values`. Duplicate values are dropped, first-seen order kept.
        pub fn where_tag<I, S>(mut self, tag_name: impl Into<String>, tag_values: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            self.clauses.tag_name = Some(tag_name.into());
            self.clauses.tag_values = $crate::query::criteria::distinct(tag_values);
            self
        }
    };
}

/// `group-by-tag` and `pivot-by-tag`
macro_rules! tag_grouping_setters {
    () => {
        /// Remove the listed tags from series names, merging series that
        /// become equal
        pub fn group_by_tag<I, S>(mut self, tags: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            self.clauses.group_by_tag = $crate::query::criteria::distinct(tags);
            self
        }

        /// Keep only the listed tags in series names, merging series that
        /// become equal
        pub fn pivot_by_tag<I, S>(mut self, tags: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            self.clauses.pivot_by_tag = $crate::query::criteria::distinct(tags);
            self
        }
    };
}

/// `order-by`, value filters, `limit` and `offset`
macro_rules! output_setters {
    () => {
        /// Order of the data points in the result set
        pub fn order_by(mut self, order_by: $crate::model::OrderBy) -> Self {
            self.clauses.order_by = Some(order_by);
            self
        }

        /// Keep only data points whose value satisfies one bound
        ///
        /// Fails with `InvalidState` if a filter was already set.
        pub fn filter(
            mut self,
            predicate: $crate::model::Predicate,
            value: f64,
        ) -> $crate::query::CriteriaResult<Self> {
            self.clauses.filters = std::mem::take(&mut self.clauses.filters)
                .with_single(predicate, value)?;
            Ok(self)
        }

        /// Keep only data points whose value lies inside two bounds
        ///
        /// Fails with `InvalidState` if a filter was already set.
        pub fn filter_range(
            mut self,
            first: $crate::model::Predicate,
            first_value: f64,
            second: $crate::model::Predicate,
            second_value: f64,
        ) -> $crate::query::CriteriaResult<Self> {
            self.clauses.filters = std::mem::take(&mut self.clauses.filters)
                .with_range((first, first_value), (second, second_value))?;
            Ok(self)
        }

        /// Maximum number of rows to return
        pub fn limit(mut self, limit: u64) -> Self {
            self.clauses.limit = Some(limit);
            self
        }

        /// Number of rows to skip at the start of the output
        pub fn offset(mut self, offset: u64) -> Self {
            self.clauses.offset = Some(offset);
            self
        }
    };
}

pub(crate) use {output_setters, range_setters, tag_grouping_setters, where_setter};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Predicate;

    #[test]
    fn test_blank_tag_names_rejected() {
        let mut clauses = Clauses {
            tag_name: Some("host".to_string()),
            group_by_tag: vec!["dc".to_string()],
            ..Clauses::default()
        };
        assert!(clauses.validate_tags().is_ok());

        clauses.pivot_by_tag = vec![" ".to_string()];
        assert!(matches!(
            clauses.validate_tags(),
            Err(CriteriaError::InvalidArgument(_))
        ));

        clauses.pivot_by_tag.clear();
        clauses.tag_name = Some(String::new());
        assert!(matches!(
            clauses.validate_tags(),
            Err(CriteriaError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_distinct_keeps_first_seen_order() {
        assert_eq!(distinct(["a", "b", "a", "c"]), vec!["a", "b", "c"]);
        assert!(distinct(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn test_writer_emits_clauses_in_grammar_order() {
        let clauses = Clauses {
            from: 10,
            to: 20,
            tag_name: Some("host".to_string()),
            tag_values: vec!["a".to_string()],
            group_by_tag: vec!["dc".to_string()],
            pivot_by_tag: vec!["rack".to_string()],
            order_by: Some(OrderBy::Time),
            filters: FilterSet::default()
                .with_range((Predicate::GreaterThan, 1.0), (Predicate::LessThan, 2.5))
                .unwrap(),
            limit: Some(5),
            offset: Some(0),
        };

        let document = RequestWriter::new()
            .field("select", Value::from("cpu"))
            .clauses(&clauses)
            .finish();

        assert_eq!(
            document,
            r#"{"select":"cpu","range":{"from":10,"to":20},"where":{"host":["a"]},"group-by-tag":["dc"],"pivot-by-tag":["rack"],"order-by":"time","filter":{"gt":1.0,"lt":2.5},"limit":5,"offset":0}"#
        );
    }

    #[test]
    fn test_writer_range_variants() {
        let only_from = Clauses {
            from: 10,
            ..Default::default()
        };
        assert_eq!(
            RequestWriter::new().clauses(&only_from).finish(),
            r#"{"range":{"from":10}}"#
        );

        let only_to = Clauses {
            to: 10,
            ..Default::default()
        };
        assert_eq!(RequestWriter::new().clauses(&only_to).finish(), "{}");
    }

    #[test]
    fn test_writer_skips_where_without_values() {
        let clauses = Clauses {
            tag_name: Some("host".to_string()),
            ..Default::default()
        };
        assert_eq!(RequestWriter::new().clauses(&clauses).finish(), "{}");
    }

    #[test]
    fn test_require_range() {
        assert_eq!(
            Clauses::default().require_range(),
            Err(CriteriaError::MissingRange)
        );
        let clauses = Clauses {
            to: 5,
            ..Default::default()
        };
        assert!(clauses.require_range().is_ok());
    }
}
