//! Group-aggregate criteria: downsampling into fixed-width bins
//!
//! The time range is split into bins of `step` width and every requested
//! function is computed per bin and per series. Functions are an unordered
//! set on the builder; the request lists them in `AggregateFunction`
//! declaration order, which is also the order of the values in each row.

use crate::model::AggregateFunction;
use crate::query::criteria::{
    compile_once, distinct, output_setters, range_setters, string_array, tag_grouping_setters,
    where_setter, Clauses, Criteria, RequestWriter,
};
use crate::query::error::{CriteriaError, CriteriaResult};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::OnceLock;
use std::time::Duration;

/// Downsampling query over one or more metrics
#[derive(Debug, Clone)]
pub struct GroupAggregateCriteria {
    metrics: Vec<String>,
    step_nanos: i64,
    functions: BTreeSet<AggregateFunction>,
    clauses: Clauses,
    document: OnceLock<String>,
}

impl GroupAggregateCriteria {
    pub fn builder() -> GroupAggregateBuilder {
        GroupAggregateBuilder::new()
    }

    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    /// Bin width in nanoseconds
    pub fn step_nanos(&self) -> i64 {
        self.step_nanos
    }

    /// Requested functions in declaration order
    pub fn functions(&self) -> impl Iterator<Item = AggregateFunction> + '_ {
        self.functions.iter().copied()
    }

    pub fn clauses(&self) -> &Clauses {
        &self.clauses
    }

    fn encode(&self) -> String {
        let functions: Vec<Value> = self
            .functions
            .iter()
            .map(|function| Value::from(function.as_str()))
            .collect();

        let mut group = Map::new();
        group.insert("metric".to_string(), string_array(&self.metrics));
        group.insert("step".to_string(), Value::from(self.step_nanos));
        group.insert("func".to_string(), Value::Array(functions));

        RequestWriter::new()
            .field("group-aggregate", Value::Object(group))
            .clauses(&self.clauses)
            .finish()
    }
}

impl Criteria for GroupAggregateCriteria {
    fn from(&self) -> i64 {
        self.clauses.from
    }

    fn to(&self) -> i64 {
        self.clauses.to
    }

    fn kind(&self) -> &'static str {
        "group-aggregate"
    }

    fn compile(&self) -> &str {
        compile_once(&self.document, self.kind(), || self.encode())
    }
}

/// Builder for [`GroupAggregateCriteria`]
#[derive(Debug, Clone, Default)]
pub struct GroupAggregateBuilder {
    metrics: Vec<String>,
    step: Option<Duration>,
    functions: BTreeSet<AggregateFunction>,
    clauses: Clauses,
}

impl GroupAggregateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metrics to downsample, the bin width and the functions to compute
    pub fn group_aggregate<I, S, F>(mut self, metrics: I, step: Duration, functions: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: IntoIterator<Item = AggregateFunction>,
    {
        self.metrics = distinct(metrics);
        self.step = Some(step);
        self.functions = functions.into_iter().collect();
        self
    }

    range_setters!();
    where_setter!();
    tag_grouping_setters!();
    output_setters!();

    pub fn build(self) -> CriteriaResult<GroupAggregateCriteria> {
        if self.metrics.is_empty() {
            return Err(CriteriaError::MissingRequiredField("metrics"));
        }
        if self.metrics.iter().any(|metric| metric.trim().is_empty()) {
            return Err(CriteriaError::InvalidArgument(
                "metric name must not be empty".to_string(),
            ));
        }
        if self.functions.is_empty() {
            return Err(CriteriaError::MissingRequiredField("functions"));
        }
        let step = self.step.ok_or(CriteriaError::MissingRequiredField("step"))?;
        let step_nanos = step_nanos(step)?;
        self.clauses.validate_tags()?;
        self.clauses.require_range()?;

        Ok(GroupAggregateCriteria {
            metrics: self.metrics,
            step_nanos,
            functions: self.functions,
            clauses: self.clauses,
            document: OnceLock::new(),
        })
    }
}

fn step_nanos(step: Duration) -> CriteriaResult<i64> {
    match i64::try_from(step.as_nanos()) {
        Ok(0) => Err(CriteriaError::InvalidArgument(
            "step must be greater than zero".to_string(),
        )),
        Ok(nanos) => Ok(nanos),
        Err(_) => Err(CriteriaError::InvalidArgument(format!(
            "step {:?} does not fit in a nanosecond epoch",
            step
        ))),
    }
}
