//! Aggregate criteria: one reduced value per series

use crate::model::AggregateFunction;
use crate::query::criteria::{
    compile_once, range_setters, tag_grouping_setters, where_setter, Clauses, Criteria,
    RequestWriter,
};
use crate::query::error::{CriteriaError, CriteriaResult};
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Applies one aggregate function to every series of a metric
///
/// Produces exactly one row per series. The time range is optional; when
/// it is missing the whole series is aggregated.
#[derive(Debug, Clone)]
pub struct AggregateCriteria {
    metric: String,
    function: AggregateFunction,
    clauses: Clauses,
    document: OnceLock<String>,
}

impl AggregateCriteria {
    pub fn builder() -> AggregateBuilder {
        AggregateBuilder::new()
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn function(&self) -> AggregateFunction {
        self.function
    }

    pub fn clauses(&self) -> &Clauses {
        &self.clauses
    }

    fn encode(&self) -> String {
        let mut aggregate = Map::new();
        aggregate.insert(self.metric.clone(), Value::from(self.function.as_str()));

        RequestWriter::new()
            .field("aggregate", Value::Object(aggregate))
            .clauses(&self.clauses)
            .finish()
    }
}

impl Criteria for AggregateCriteria {
    fn from(&self) -> i64 {
        self.clauses.from
    }

    fn to(&self) -> i64 {
        self.clauses.to
    }

    fn kind(&self) -> &'static str {
        "aggregate"
    }

    fn compile(&self) -> &str {
        compile_once(&self.document, self.kind(), || self.encode())
    }
}

/// Builder for [`AggregateCriteria`]
#[derive(Debug, Clone, Default)]
pub struct AggregateBuilder {
    metric: Option<String>,
    function: Option<AggregateFunction>,
    clauses: Clauses,
}

impl AggregateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metric to aggregate and the function to apply
    pub fn aggregate(mut self, metric: impl Into<String>, function: AggregateFunction) -> Self {
        self.metric = Some(metric.into());
        self.function = Some(function);
        self
    }

    range_setters!();
    where_setter!();
    tag_grouping_setters!();

    pub fn build(self) -> CriteriaResult<AggregateCriteria> {
        let metric = self
            .metric
            .ok_or(CriteriaError::MissingRequiredField("metric"))?;
        if metric.trim().is_empty() {
            return Err(CriteriaError::InvalidArgument(
                "metric name must not be empty".to_string(),
            ));
        }
        let function = self
            .function
            .ok_or(CriteriaError::MissingRequiredField("function"))?;
        self.clauses.validate_tags()?;

        Ok(AggregateCriteria {
            metric,
            function,
            clauses: self.clauses,
            document: OnceLock::new(),
        })
    }
}
