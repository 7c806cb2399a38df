//! In-process engine
//!
//! `MemoryEngine` answers queries from scripted result sets and metadata
//! requests from the samples written to it. It records every document it
//! receives, which makes it the engine of choice for tests and for
//! replaying captured results through the CLI.
//!
//! Script CSV format, one row per record, no header:
//!
//! ```text
//! # series, timestamp, value[, value...]
//! cpu.user host=a,1700000000000000000,12.5
//! cpu.user:count|cpu.user:max host=a,2023-11-14T22:13:20Z,4,40
//! ```
//!
//! Timestamps are nanosecond epochs or RFC 3339 instants.

use crate::engine::{Engine, EngineError, EngineResult, RowBuffer, Status, StreamHandle};
use crate::model::to_epoch;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// One scripted result row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptedRow {
    pub series: String,
    pub timestamp: i64,
    pub values: Vec<f64>,
}

impl ScriptedRow {
    pub fn new(series: impl Into<String>, timestamp: i64, values: impl Into<Vec<f64>>) -> Self {
        Self {
            series: series.into(),
            timestamp,
            values: values.into(),
        }
    }
}

/// A data point written through [`Engine::add_sample`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub timestamp: i64,
    /// Canonical series name, tags sorted by name
    pub series: String,
    pub value: f64,
}

/// Errors raised while loading a script
#[derive(Error, Debug)]
pub enum ScriptError {
    /// The CSV reader failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A record could not be turned into a row
    #[error("Invalid script record at line {line}: {message}")]
    InvalidRecord { line: u64, message: String },
}

#[derive(Debug, Default)]
struct State {
    scripts: VecDeque<Vec<ScriptedRow>>,
    documents: Vec<String>,
    samples: Vec<Sample>,
    streams: HashMap<u64, VecDeque<ScriptedRow>>,
    next_handle: u64,
    failure: Option<Status>,
}

impl State {
    fn open(&mut self, rows: Vec<ScriptedRow>) -> Option<StreamHandle> {
        if rows.is_empty() {
            return None;
        }
        self.next_handle += 1;
        self.streams.insert(self.next_handle, rows.into());
        Some(StreamHandle::new(self.next_handle))
    }

    fn take_failure(&mut self) -> EngineResult<()> {
        match self.failure.take() {
            Some(status) => Err(EngineError::from_status(status)),
            None => Ok(()),
        }
    }

    fn stream(&mut self, handle: StreamHandle) -> EngineResult<&mut VecDeque<ScriptedRow>> {
        self.streams.get_mut(&handle.id()).ok_or_else(|| {
            EngineError::new(Status::NotFound, format!("{} is not open", handle))
        })
    }
}

/// Engine backed by process memory
///
/// Not `Sync`; one engine serves one thread.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    state: RefCell<State>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result set of the next query. An empty set answers "no data".
    pub fn script<I>(&self, rows: I)
    where
        I: IntoIterator<Item = ScriptedRow>,
    {
        self.state
            .borrow_mut()
            .scripts
            .push_back(rows.into_iter().collect());
    }

    /// Queue a result set read from CSV, returning the number of rows
    pub fn script_from_reader<R: Read>(&self, reader: R) -> Result<usize, ScriptError> {
        let rows = read_rows(reader)?;
        let count = rows.len();
        self.script(rows);
        Ok(count)
    }

    /// Queue a result set read from a CSV file
    pub fn load_script_csv(&self, path: impl AsRef<Path>) -> Result<usize, ScriptError> {
        let rows = read_rows_path(path.as_ref())?;
        let count = rows.len();
        tracing::debug!(path = %path.as_ref().display(), rows = count, "Loaded script");
        self.script(rows);
        Ok(count)
    }

    /// Make the next stream call fail with `status`
    pub fn fail_next(&self, status: Status) {
        self.state.borrow_mut().failure = Some(status);
    }

    /// Every document received, in arrival order
    pub fn documents(&self) -> Vec<String> {
        self.state.borrow().documents.clone()
    }

    /// Every sample written, in arrival order
    pub fn samples(&self) -> Vec<Sample> {
        self.state.borrow().samples.clone()
    }

    /// Number of streams opened and not yet closed
    pub fn open_streams(&self) -> usize {
        self.state.borrow().streams.len()
    }

    /// Number of scripted result sets not yet consumed
    pub fn pending_scripts(&self) -> usize {
        self.state.borrow().scripts.len()
    }

    fn series_matching(&self, request: &MetadataRequest) -> Vec<ScriptedRow> {
        let state = self.state.borrow();
        let names: BTreeSet<&str> = state
            .samples
            .iter()
            .map(|sample| sample.series.as_str())
            .filter(|series| request.matches(series))
            .collect();

        names
            .into_iter()
            .map(|series| ScriptedRow::new(series, 0, Vec::<f64>::new()))
            .collect()
    }
}

impl Engine for MemoryEngine {
    fn open_query_stream(&self, document: &str) -> EngineResult<Option<StreamHandle>> {
        let mut state = self.state.borrow_mut();
        state.take_failure()?;
        state.documents.push(document.to_string());

        let rows = state.scripts.pop_front().unwrap_or_default();
        let handle = state.open(rows);
        tracing::debug!(?handle, "Opened query stream");
        Ok(handle)
    }

    fn open_metadata_stream(&self, document: &str) -> EngineResult<Option<StreamHandle>> {
        {
            let mut state = self.state.borrow_mut();
            state.take_failure()?;
            state.documents.push(document.to_string());
        }

        let request = MetadataRequest::parse(document)?;
        let rows = self.series_matching(&request);
        let handle = self.state.borrow_mut().open(rows);
        tracing::debug!(?handle, "Opened metadata stream");
        Ok(handle)
    }

    fn stream_has_next(&self, handle: StreamHandle) -> EngineResult<bool> {
        let mut state = self.state.borrow_mut();
        state.take_failure()?;
        Ok(!state.stream(handle)?.is_empty())
    }

    fn stream_advance(&self, handle: StreamHandle, row: &mut RowBuffer) -> EngineResult<bool> {
        let mut state = self.state.borrow_mut();
        state.take_failure()?;
        match state.stream(handle)?.pop_front() {
            Some(next) => {
                row.fill(&next.series, next.timestamp, &next.values);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn stream_close(&self, handle: StreamHandle) -> EngineResult<()> {
        let mut state = self.state.borrow_mut();
        state.take_failure()?;
        match state.streams.remove(&handle.id()) {
            Some(_) => Ok(()),
            None => Err(EngineError::new(
                Status::NotFound,
                format!("{} is not open", handle),
            )),
        }
    }

    fn add_sample(&self, timestamp: i64, series: &str, value: f64) -> EngineResult<()> {
        let series = canonical_series(series)?;
        let mut state = self.state.borrow_mut();
        state.take_failure()?;
        state.samples.push(Sample {
            timestamp,
            series,
            value,
        });
        Ok(())
    }
}

/// Metric followed by its tags sorted by name, single-space separated
fn canonical_series(series: &str) -> EngineResult<String> {
    let mut tokens = series.split_whitespace();
    let metric = tokens
        .next()
        .ok_or_else(|| EngineError::new(Status::BadData, "series name is empty"))?;

    let mut tags: Vec<(&str, &str)> = Vec::new();
    for token in tokens {
        let (name, value) = token.split_once('=').ok_or_else(|| {
            EngineError::new(
                Status::BadData,
                format!("tag '{}' of series '{}' has no value", token, series),
            )
        })?;
        tags.push((name, value));
    }
    tags.sort();

    let mut canonical = metric.to_string();
    for (name, value) in tags {
        canonical.push(' ');
        canonical.push_str(name);
        canonical.push('=');
        canonical.push_str(value);
    }
    Ok(canonical)
}

/// Decoded `{"select": "meta:names[:metric]", "where": {...}}` document
#[derive(Debug, Default)]
struct MetadataRequest {
    metric: Option<String>,
    tag: Option<(String, Vec<String>)>,
}

impl MetadataRequest {
    fn parse(document: &str) -> EngineResult<Self> {
        let parsed: Value = serde_json::from_str(document)
            .map_err(|e| EngineError::new(Status::QueryParseError, e.to_string()))?;

        let selector = parsed
            .get("select")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::new(Status::QueryParseError, "missing select field"))?;
        let metric = match selector.strip_prefix("meta:names") {
            Some("") => None,
            Some(rest) => match rest.strip_prefix(':') {
                Some(metric) => Some(metric.to_string()),
                None => return Err(unknown_selector(selector)),
            },
            None => return Err(unknown_selector(selector)),
        };

        let tag = match parsed.get("where").and_then(Value::as_object) {
            Some(clause) => clause.iter().next().map(|(name, values)| {
                let values = values
                    .as_array()
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                (name.clone(), values)
            }),
            None => None,
        };

        Ok(Self { metric, tag })
    }

    fn matches(&self, series: &str) -> bool {
        let mut tokens = series.split(' ');
        let metric = tokens.next().unwrap_or_default();
        if let Some(wanted) = &self.metric {
            if metric != wanted {
                return false;
            }
        }

        match &self.tag {
            Some((name, values)) => tokens
                .filter_map(|token| token.split_once('='))
                .any(|(tag, value)| tag == name && values.iter().any(|v| v == value)),
            None => true,
        }
    }
}

fn unknown_selector(selector: &str) -> EngineError {
    EngineError::new(
        Status::QueryParseError,
        format!("unknown metadata selector '{}'", selector),
    )
}

fn script_reader() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All);
    builder
}

/// Read `series,timestamp,value[,value...]` records
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<ScriptedRow>, ScriptError> {
    collect_rows(script_reader().from_reader(reader))
}

/// Read `series,timestamp,value[,value...]` records from a file
pub fn read_rows_path(path: &Path) -> Result<Vec<ScriptedRow>, ScriptError> {
    collect_rows(script_reader().from_path(path)?)
}

fn collect_rows<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<ScriptedRow>, ScriptError> {
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        rows.push(parse_record(&record, line)?);
    }
    Ok(rows)
}

fn parse_record(record: &csv::StringRecord, line: u64) -> Result<ScriptedRow, ScriptError> {
    let invalid = |message: String| ScriptError::InvalidRecord { line, message };

    if record.len() < 2 {
        return Err(invalid(format!(
            "expected series,timestamp[,value...], got {} field(s)",
            record.len()
        )));
    }
    let series = &record[0];
    if series.is_empty() {
        return Err(invalid("series is empty".to_string()));
    }
    let timestamp = parse_timestamp(&record[1]).map_err(invalid)?;

    let mut values = Vec::with_capacity(record.len() - 2);
    for field in record.iter().skip(2) {
        let value = field
            .parse::<f64>()
            .map_err(|e| invalid(format!("value '{}': {}", field, e)))?;
        values.push(value);
    }

    Ok(ScriptedRow::new(series, timestamp, values))
}

fn parse_timestamp(field: &str) -> Result<i64, String> {
    if let Ok(epoch) = field.parse::<i64>() {
        return Ok(epoch);
    }
    let instant = DateTime::parse_from_rfc3339(field)
        .map_err(|_| format!("timestamp '{}' is neither an epoch nor RFC 3339", field))?;
    to_epoch(&instant.with_timezone(&Utc))
        .ok_or_else(|| format!("timestamp '{}' is outside the nanosecond epoch range", field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_scripted_results_in_fifo_order() {
        let engine = MemoryEngine::new();
        engine.script(vec![ScriptedRow::new("a", 1, vec![1.0])]);
        engine.script(vec![
            ScriptedRow::new("b", 2, vec![2.0]),
            ScriptedRow::new("b", 3, vec![3.0]),
        ]);

        let first = engine.open_query_stream("{\"q\":1}").unwrap().unwrap();
        let second = engine.open_query_stream("{\"q\":2}").unwrap().unwrap();

        let mut row = RowBuffer::new();
        assert!(engine.stream_advance(first, &mut row).unwrap());
        assert_eq!(row.line(), "a");
        assert!(!engine.stream_has_next(first).unwrap());
        assert!(!engine.stream_advance(first, &mut row).unwrap());

        assert!(engine.stream_has_next(second).unwrap());
        assert!(engine.stream_advance(second, &mut row).unwrap());
        assert_eq!(row.timestamp(), 2);

        assert_eq!(engine.documents(), vec!["{\"q\":1}", "{\"q\":2}"]);
        assert_eq!(engine.open_streams(), 2);
        engine.stream_close(first).unwrap();
        engine.stream_close(second).unwrap();
        assert_eq!(engine.open_streams(), 0);
    }

    #[test]
    fn test_no_data() {
        let engine = MemoryEngine::new();
        assert_eq!(engine.open_query_stream("{}").unwrap(), None);

        engine.script(Vec::<ScriptedRow>::new());
        assert_eq!(engine.open_query_stream("{}").unwrap(), None);
        assert_eq!(engine.pending_scripts(), 0);
    }

    #[test]
    fn test_unknown_handle() {
        let engine = MemoryEngine::new();
        let err = engine.stream_has_next(StreamHandle::new(42)).unwrap_err();
        assert_eq!(err.status(), Status::NotFound);
        assert!(engine.stream_close(StreamHandle::new(42)).is_err());
    }

    #[test]
    fn test_injected_failure_is_consumed_once() {
        let engine = MemoryEngine::new();
        engine.fail_next(Status::Busy);

        let err = engine.open_query_stream("{}").unwrap_err();
        assert_eq!(err.status(), Status::Busy);
        assert!(engine.open_query_stream("{}").is_ok());
    }

    #[test]
    fn test_samples_are_canonical() {
        let engine = MemoryEngine::new();
        engine
            .add_sample(5, "cpu  server=1 location=xyz", 0.5)
            .unwrap();

        let samples = engine.samples();
        assert_eq!(samples[0].series, "cpu location=xyz server=1");

        let err = engine.add_sample(5, "cpu server", 0.5).unwrap_err();
        assert_eq!(err.status(), Status::BadData);
    }

    #[test]
    fn test_metadata_enumeration() {
        let engine = MemoryEngine::new();
        engine.add_sample(1, "cpu host=a", 1.0).unwrap();
        engine.add_sample(2, "cpu host=a", 2.0).unwrap();
        engine.add_sample(1, "cpu host=b", 1.0).unwrap();
        engine.add_sample(1, "mem host=a", 1.0).unwrap();

        let all = engine.open_metadata_stream(r#"{"select":"meta:names"}"#).unwrap().unwrap();
        let mut row = RowBuffer::new();
        let mut names = Vec::new();
        while engine.stream_advance(all, &mut row).unwrap() {
            assert!(row.values().is_empty());
            names.push(row.line().to_string());
        }
        assert_eq!(names, vec!["cpu host=a", "cpu host=b", "mem host=a"]);

        let filtered = engine
            .open_metadata_stream(r#"{"select":"meta:names:cpu","where":{"host":["b"]}}"#)
            .unwrap()
            .unwrap();
        assert!(engine.stream_advance(filtered, &mut row).unwrap());
        assert_eq!(row.line(), "cpu host=b");
        assert!(!engine.stream_has_next(filtered).unwrap());

        let none = engine
            .open_metadata_stream(r#"{"select":"meta:names:disk"}"#)
            .unwrap();
        assert_eq!(none, None);
    }

    #[test]
    fn test_bad_metadata_document() {
        let engine = MemoryEngine::new();
        let err = engine.open_metadata_stream("not json").unwrap_err();
        assert_eq!(err.status(), Status::QueryParseError);

        let err = engine
            .open_metadata_stream(r#"{"select":"meta:other"}"#)
            .unwrap_err();
        assert_eq!(err.status(), Status::QueryParseError);
    }

    #[test]
    fn test_script_from_reader() {
        let csv = "# series,timestamp,values\n\
                   cpu host=a,100,1.5\n\
                   cpu:count|cpu:max host=a,2023-11-14T22:13:20Z,4,40\n";
        let engine = MemoryEngine::new();
        assert_eq!(engine.script_from_reader(csv.as_bytes()).unwrap(), 2);

        let handle = engine.open_query_stream("{}").unwrap().unwrap();
        let mut row = RowBuffer::new();
        engine.stream_advance(handle, &mut row).unwrap();
        assert_eq!(row.line(), "cpu host=a");
        assert_eq!(row.values(), [1.5]);

        engine.stream_advance(handle, &mut row).unwrap();
        assert_eq!(row.timestamp(), 1_700_000_000_000_000_000);
        assert_eq!(row.values(), [4.0, 40.0]);
    }

    #[test]
    fn test_invalid_script_records() {
        let engine = MemoryEngine::new();
        assert!(matches!(
            engine.script_from_reader("cpu\n".as_bytes()),
            Err(ScriptError::InvalidRecord { .. })
        ));
        assert!(matches!(
            engine.script_from_reader("cpu,yesterday,1\n".as_bytes()),
            Err(ScriptError::InvalidRecord { .. })
        ));
        assert!(matches!(
            engine.script_from_reader("cpu,1,abc\n".as_bytes()),
            Err(ScriptError::InvalidRecord { .. })
        ));
        assert_eq!(engine.pending_scripts(), 0);
    }

    #[test]
    fn test_load_script_csv() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "mem server=1,10,3").unwrap();
        writeln!(file, "mem server=2,20,4").unwrap();

        let engine = MemoryEngine::new();
        assert_eq!(engine.load_script_csv(file.path()).unwrap(), 2);
        assert_eq!(engine.pending_scripts(), 1);
    }
}
