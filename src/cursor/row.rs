//! Decoded result rows
//!
//! A `Row` wraps the engine's row buffer and derives metric names,
//! aggregate functions and tags from the series line on first access.
//! Derived fields are cached until the buffer is overwritten by the next
//! advance, at which point the whole cache is dropped at once.

use crate::cursor::error::DecodeResult;
use crate::cursor::series;
use crate::engine::RowBuffer;
use crate::model::{from_epoch, AggregateFunction, Tag};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cell::OnceCell;

#[derive(Debug, Clone, Default)]
struct RowCache {
    /// Length of the first metric name and the function of the first spec
    head: OnceCell<(usize, Option<AggregateFunction>)>,
    metrics: OnceCell<(Vec<String>, Vec<AggregateFunction>)>,
    tags: OnceCell<Vec<Tag>>,
}

/// Run `decode` once per row; failures are not cached
fn memoize<T>(cell: &OnceCell<T>, decode: impl FnOnce() -> DecodeResult<T>) -> DecodeResult<&T> {
    if let Some(value) = cell.get() {
        return Ok(value);
    }
    let value = decode()?;
    Ok(cell.get_or_init(|| value))
}

/// The current row of a stream
#[derive(Debug, Clone, Default)]
pub struct Row {
    buffer: RowBuffer,
    cache: RowCache,
}

impl Row {
    /// Row over a standalone line, mostly useful outside a stream
    pub fn new(line: &str, timestamp: i64, values: &[f64]) -> Self {
        let mut row = Self::default();
        row.load(line, timestamp, values);
        row
    }

    /// Replace the row contents, reusing its buffers
    pub fn load(&mut self, line: &str, timestamp: i64, values: &[f64]) {
        self.buffer_mut().fill(line, timestamp, values);
    }

    /// Buffer for the engine to fill; drops every derived field
    pub(crate) fn buffer_mut(&mut self) -> &mut RowBuffer {
        self.cache = RowCache::default();
        &mut self.buffer
    }

    pub(crate) fn clear(&mut self) {
        self.buffer_mut().clear();
    }

    /// Raw series line
    pub fn series(&self) -> &str {
        self.buffer.line()
    }

    /// Timestamp in nanoseconds since the epoch
    pub fn timestamp(&self) -> i64 {
        self.buffer.timestamp()
    }

    pub fn datetime(&self) -> DateTime<Utc> {
        from_epoch(self.buffer.timestamp())
    }

    /// First value, or `NaN` for rows without values
    pub fn value(&self) -> f64 {
        self.buffer.values().first().copied().unwrap_or(f64::NAN)
    }

    pub fn values(&self) -> &[f64] {
        self.buffer.values()
    }

    fn head(&self) -> DecodeResult<&(usize, Option<AggregateFunction>)> {
        memoize(&self.cache.head, || {
            series::first_metric(self.series()).map(|(metric, function)| (metric.len(), function))
        })
    }

    /// Name of the first metric, without its aggregate suffix
    pub fn metric(&self) -> DecodeResult<&str> {
        let (len, _) = *self.head()?;
        Ok(&self.series()[..len])
    }

    /// Function of the first metric, for aggregate rows
    pub fn aggregate_function(&self) -> DecodeResult<Option<AggregateFunction>> {
        Ok(self.head()?.1)
    }

    fn metric_specs(&self) -> DecodeResult<&(Vec<String>, Vec<AggregateFunction>)> {
        memoize(&self.cache.metrics, || series::parse_metrics(self.series()))
    }

    /// Every metric of a compound row, in line order
    pub fn metrics(&self) -> DecodeResult<&[String]> {
        Ok(&self.metric_specs()?.0)
    }

    /// Functions of the metric specs that carry one, in line order
    pub fn aggregate_functions(&self) -> DecodeResult<&[AggregateFunction]> {
        Ok(&self.metric_specs()?.1)
    }

    /// Value computed by `function`, or `NaN` if the row has none
    pub fn value_of(&self, function: AggregateFunction) -> DecodeResult<f64> {
        let value = self
            .aggregate_functions()?
            .iter()
            .position(|candidate| *candidate == function)
            .and_then(|index| self.values().get(index).copied())
            .unwrap_or(f64::NAN);
        Ok(value)
    }

    pub fn tags(&self) -> DecodeResult<&[Tag]> {
        memoize(&self.cache.tags, || series::parse_tags(self.series())).map(Vec::as_slice)
    }

    /// Owned, serializable copy of the decoded row
    pub fn snapshot(&self) -> DecodeResult<DecodedRow> {
        Ok(DecodedRow {
            series: self.series().to_string(),
            timestamp: self.timestamp(),
            datetime: self.datetime(),
            metrics: self.metrics()?.to_vec(),
            aggregate_functions: self.aggregate_functions()?.to_vec(),
            tags: self.tags()?.to_vec(),
            values: self.values().to_vec(),
        })
    }
}

/// Fully decoded row detached from its stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedRow {
    pub series: String,
    pub timestamp: i64,
    pub datetime: DateTime<Utc>,
    pub metrics: Vec<String>,
    pub aggregate_functions: Vec<AggregateFunction>,
    pub tags: Vec<Tag>,
    pub values: Vec<f64>,
}
