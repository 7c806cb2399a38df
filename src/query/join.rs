//! Join criteria: several metrics aligned by series and timestamp

use crate::query::criteria::{
    compile_once, distinct, output_setters, range_setters, string_array, where_setter, Clauses,
    Criteria, RequestWriter,
};
use crate::query::error::{CriteriaError, CriteriaResult};
use std::sync::OnceLock;

/// Reads several metrics at once
///
/// Each result row carries one value per metric, in the order the metrics
/// were given. Rows are named by a compound series line such as
/// `cpu|mem host=a`.
#[derive(Debug, Clone)]
pub struct JoinCriteria {
    metrics: Vec<String>,
    clauses: Clauses,
    document: OnceLock<String>,
}

impl JoinCriteria {
    pub fn builder() -> JoinBuilder {
        JoinBuilder::new()
    }

    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    pub fn clauses(&self) -> &Clauses {
        &self.clauses
    }

    fn encode(&self) -> String {
        RequestWriter::new()
            .field("join", string_array(&self.metrics))
            .clauses(&self.clauses)
            .finish()
    }
}

impl Criteria for JoinCriteria {
    fn from(&self) -> i64 {
        self.clauses.from
    }

    fn to(&self) -> i64 {
        self.clauses.to
    }

    fn kind(&self) -> &'static str {
        "join"
    }

    fn compile(&self) -> &str {
        compile_once(&self.document, self.kind(), || self.encode())
    }
}

/// Builder for [`JoinCriteria`]
#[derive(Debug, Clone, Default)]
pub struct JoinBuilder {
    metrics: Vec<String>,
    clauses: Clauses,
}

impl JoinBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metrics to align. Duplicates are dropped, first-seen order kept.
    pub fn join<I, S>(mut self, metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metrics = distinct(metrics);
        self
    }

    range_setters!();
    where_setter!();
    output_setters!();

    pub fn build(self) -> CriteriaResult<JoinCriteria> {
        if self.metrics.is_empty() {
            return Err(CriteriaError::MissingRequiredField("metrics"));
        }
        if self.metrics.iter().any(|metric| metric.trim().is_empty()) {
            return Err(CriteriaError::InvalidArgument(
                "metric name must not be empty".to_string(),
            ));
        }
        self.clauses.validate_tags()?;
        self.clauses.require_range()?;

        Ok(JoinCriteria {
            metrics: self.metrics,
            clauses: self.clauses,
            document: OnceLock::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OrderBy, Predicate};

    #[test]
    fn test_join_document() {
        let criteria = JoinCriteria::builder()
            .join(["hdd.usage", "cpu.usage", "mem.usage", "cpu.usage"])
            .from(10)
            .to(20)
            .where_tag("location", ["xyz"])
            .order_by(OrderBy::Series)
            .filter(Predicate::LessThan, 90.0)
            .unwrap()
            .offset(3)
            .build()
            .unwrap();

        assert_eq!(
            criteria.compile(),
            r#"{"join":["hdd.usage","cpu.usage","mem.usage"],"range":{"from":10,"to":20},"where":{"location":["xyz"]},"order-by":"series","filter":{"lt":90.0},"offset":3}"#
        );
    }

    #[test]
    fn test_join_requires_metrics_and_range() {
        let err = JoinCriteria::builder().from(1).build().unwrap_err();
        assert_eq!(err, CriteriaError::MissingRequiredField("metrics"));

        let err = JoinCriteria::builder().join(["a", "b"]).build().unwrap_err();
        assert_eq!(err, CriteriaError::MissingRange);
    }

    #[test]
    fn test_compile_is_cached() {
        let criteria = JoinCriteria::builder()
            .join(["a", "b"])
            .to(5)
            .build()
            .unwrap();

        assert!(std::ptr::eq(criteria.compile(), criteria.compile()));
        assert_eq!(criteria.compile(), r#"{"join":["a","b"]}"#);
    }

    #[test]
    fn test_blank_tag_name() {
        let err = JoinCriteria::builder()
            .join(["cpu", "mem"])
            .from(1)
            .where_tag("", ["a"])
            .build()
            .unwrap_err();
        assert!(matches!(err, CriteriaError::InvalidArgument(_)));
    }
}
