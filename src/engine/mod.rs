//! Engine boundary
//!
//! The store itself is an external collaborator reached through the
//! [`Engine`] trait:
//!
//! - **status**: closed status taxonomy carried by engine errors
//! - **error**: `EngineError`
//! - **memory**: `MemoryEngine`, an in-process engine for tests and replay
//!
//! Streams follow a pull protocol. The engine fills a caller-owned
//! [`RowBuffer`] in place on every advance so the hot path does not
//! allocate once the buffers are warm.

mod error;
mod memory;
mod status;

pub use error::{EngineError, EngineResult};
pub use memory::{read_rows, read_rows_path, MemoryEngine, Sample, ScriptError, ScriptedRow};
pub use status::Status;

use std::fmt;

/// Opaque handle of an open result stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamHandle(u64);

impl StreamHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream#{}", self.0)
    }
}

/// One result row as handed over by the engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowBuffer {
    line: String,
    values: Vec<f64>,
    timestamp: i64,
}

impl RowBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the buffer, reusing its allocations
    pub fn fill(&mut self, line: &str, timestamp: i64, values: &[f64]) {
        self.line.clear();
        self.line.push_str(line);
        self.values.clear();
        self.values.extend_from_slice(values);
        self.timestamp = timestamp;
    }

    pub fn clear(&mut self) {
        self.line.clear();
        self.values.clear();
        self.timestamp = 0;
    }

    /// Series line, e.g. `cpu.user:max host=a`
    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
    }
}

/// A time-series store that executes request documents
///
/// Calls take `&self`; an implementation that keeps mutable state uses
/// interior mutability. One reader drives one stream.
pub trait Engine {
    /// Execute a query document. `None` means the query matched no data.
    fn open_query_stream(&self, document: &str) -> EngineResult<Option<StreamHandle>>;

    /// Execute a metadata document. `None` means no series matched.
    fn open_metadata_stream(&self, document: &str) -> EngineResult<Option<StreamHandle>>;

    /// Whether the stream has another row, without consuming it
    fn stream_has_next(&self, handle: StreamHandle) -> EngineResult<bool>;

    /// Move to the next row and write it into `row`. Returns `false` when
    /// the stream is exhausted.
    fn stream_advance(&self, handle: StreamHandle, row: &mut RowBuffer) -> EngineResult<bool>;

    /// Release the stream
    fn stream_close(&self, handle: StreamHandle) -> EngineResult<()>;

    /// Write one data point
    fn add_sample(&self, timestamp: i64, series: &str, value: f64) -> EngineResult<()>;
}

impl<E: Engine + ?Sized> Engine for &E {
    fn open_query_stream(&self, document: &str) -> EngineResult<Option<StreamHandle>> {
        (**self).open_query_stream(document)
    }

    fn open_metadata_stream(&self, document: &str) -> EngineResult<Option<StreamHandle>> {
        (**self).open_metadata_stream(document)
    }

    fn stream_has_next(&self, handle: StreamHandle) -> EngineResult<bool> {
        (**self).stream_has_next(handle)
    }

    fn stream_advance(&self, handle: StreamHandle, row: &mut RowBuffer) -> EngineResult<bool> {
        (**self).stream_advance(handle, row)
    }

    fn stream_close(&self, handle: StreamHandle) -> EngineResult<()> {
        (**self).stream_close(handle)
    }

    fn add_sample(&self, timestamp: i64, series: &str, value: f64) -> EngineResult<()> {
        (**self).add_sample(timestamp, series, value)
    }
}
