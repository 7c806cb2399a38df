//! Select criteria: raw data points of one metric

use crate::query::criteria::{
    compile_once, output_setters, range_setters, where_setter, Clauses, Criteria, RequestWriter,
};
use crate::query::error::{CriteriaError, CriteriaResult};
use serde_json::Value;
use std::sync::OnceLock;

/// Returns every data point of a metric in a time range
///
/// Both ends of the range are optional individually, but at least one
/// must be set. A `from` greater than `to` returns points newest first.
#[derive(Debug, Clone)]
pub struct SelectCriteria {
    metric: String,
    clauses: Clauses,
    document: OnceLock<String>,
}

impl SelectCriteria {
    pub fn builder() -> SelectBuilder {
        SelectBuilder::new()
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn clauses(&self) -> &Clauses {
        &self.clauses
    }

    fn encode(&self) -> String {
        RequestWriter::new()
            .field("select", Value::from(self.metric.as_str()))
            .clauses(&self.clauses)
            .finish()
    }
}

impl Criteria for SelectCriteria {
    fn from(&self) -> i64 {
        self.clauses.from
    }

    fn to(&self) -> i64 {
        self.clauses.to
    }

    fn kind(&self) -> &'static str {
        "select"
    }

    fn compile(&self) -> &str {
        compile_once(&self.document, self.kind(), || self.encode())
    }
}

/// Builder for [`SelectCriteria`]
#[derive(Debug, Clone, Default)]
pub struct SelectBuilder {
    metric: Option<String>,
    clauses: Clauses,
}

impl SelectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metric to read
    pub fn select(mut self, metric: impl Into<String>) -> Self {
        self.metric = Some(metric.into());
        self
    }

    range_setters!();
    where_setter!();
    output_setters!();

    pub fn build(self) -> CriteriaResult<SelectCriteria> {
        let metric = self
            .metric
            .ok_or(CriteriaError::MissingRequiredField("metric"))?;
        if metric.trim().is_empty() {
            return Err(CriteriaError::InvalidArgument(
                "metric name must not be empty".to_string(),
            ));
        }
        self.clauses.validate_tags()?;
        self.clauses.require_range()?;

        Ok(SelectCriteria {
            metric,
            clauses: self.clauses,
            document: OnceLock::new(),
        })
    }
}
