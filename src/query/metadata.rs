//! Metadata criteria: series-name enumeration

use crate::query::criteria::{compile_once, where_setter, Clauses, RequestWriter};
use crate::query::error::{CriteriaError, CriteriaResult};
use serde_json::Value;
use std::sync::OnceLock;

const NAMES_SELECTOR: &str = "meta:names";

/// Lists the series names known to the store
///
/// Without a metric every series is listed. A tag filter narrows the list
/// and requires a metric. Metadata requests travel on their own engine
/// call, so this type is not a [`Criteria`](crate::query::Criteria) and
/// cannot be passed to `Session::query`:
///
/// ```compile_fail
/// use tsquery::query::MetadataCriteria;
/// use tsquery::{MemoryEngine, Session};
///
/// let session = Session::new(MemoryEngine::new());
/// let _ = session.query(&MetadataCriteria::all());
/// ```
///
/// Use `Session::metadata` instead:
///
/// ```
/// use tsquery::query::MetadataCriteria;
/// use tsquery::{MemoryEngine, Session};
///
/// let session = Session::new(MemoryEngine::new());
/// session.add(1, "cpu host=a", 1.0).unwrap();
/// let names: Vec<String> = session
///     .metadata(&MetadataCriteria::all())
///     .unwrap()
///     .unwrap()
///     .collect::<tsquery::Result<_>>()
///     .unwrap();
/// assert_eq!(names, ["cpu host=a"]);
/// ```
#[derive(Debug, Clone)]
pub struct MetadataCriteria {
    metric: Option<String>,
    clauses: Clauses,
    document: OnceLock<String>,
}

impl MetadataCriteria {
    pub fn builder() -> MetadataBuilder {
        MetadataBuilder::new()
    }

    /// Every series in the store
    pub fn all() -> Self {
        Self {
            metric: None,
            clauses: Clauses::default(),
            document: OnceLock::new(),
        }
    }

    pub fn metric(&self) -> Option<&str> {
        self.metric.as_deref()
    }

    pub fn tag_name(&self) -> Option<&str> {
        self.clauses.tag_name()
    }

    pub fn tag_values(&self) -> &[String] {
        self.clauses.tag_values()
    }

    /// The `select` value, `meta:names` or `meta:names:<metric>`
    pub fn selector(&self) -> String {
        match &self.metric {
            Some(metric) => format!("{}:{}", NAMES_SELECTOR, metric),
            None => NAMES_SELECTOR.to_string(),
        }
    }

    /// The request document, encoded once and cached
    pub fn compile(&self) -> &str {
        compile_once(&self.document, "metadata", || self.encode())
    }

    fn encode(&self) -> String {
        RequestWriter::new()
            .field("select", Value::from(self.selector()))
            .where_tag(self.clauses.tag_name(), self.clauses.tag_values())
            .finish()
    }
}

/// Builder for [`MetadataCriteria`]
#[derive(Debug, Clone, Default)]
pub struct MetadataBuilder {
    metric: Option<String>,
    clauses: Clauses,
}

impl MetadataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only list series of this metric
    pub fn metric(mut self, metric: impl Into<String>) -> Self {
        self.metric = Some(metric.into());
        self
    }

    where_setter!();

    pub fn build(self) -> CriteriaResult<MetadataCriteria> {
        if let Some(metric) = &self.metric {
            if metric.trim().is_empty() {
                return Err(CriteriaError::InvalidArgument(
                    "metric name must not be empty".to_string(),
                ));
            }
        }

        if let Some(tag) = self.clauses.tag_name() {
            if self.metric.is_none() {
                return Err(CriteriaError::MissingRequiredField("metric"));
            }
            self.clauses.validate_tags()?;
            if self.clauses.tag_values().is_empty() {
                return Err(CriteriaError::InvalidArgument(format!(
                    "tag [{}] needs at least one value",
                    tag
                )));
            }
        }

        Ok(MetadataCriteria {
            metric: self.metric,
            clauses: self.clauses,
            document: OnceLock::new(),
        })
    }
}
