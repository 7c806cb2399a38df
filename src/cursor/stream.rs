//! Result stream cursor
//!
//! ```text
//! Open --advance()--> Open ... --close()--> Closed
//! ```
//!
//! `has_next` asks the engine without consuming; `advance` overwrites the
//! current row. Both fail with `StreamClosed` once the cursor is closed.
//! Dropping an open cursor closes its stream.

use crate::cursor::row::Row;
use crate::engine::{Engine, EngineError, Status, StreamHandle};
use crate::error::{Error, Result};
use uuid::Uuid;

/// Pull cursor over one engine stream
pub struct Cursor<'e, E: Engine + ?Sized> {
    engine: &'e E,
    handle: Option<StreamHandle>,
    row: Row,
    query_id: Uuid,
    rows_read: u64,
}

impl<'e, E: Engine + ?Sized> Cursor<'e, E> {
    pub(crate) fn open(engine: &'e E, handle: StreamHandle, query_id: Uuid) -> Self {
        tracing::debug!(%query_id, %handle, "Opened stream");
        Self {
            engine,
            handle: Some(handle),
            row: Row::default(),
            query_id,
            rows_read: 0,
        }
    }

    /// Id recorded in every log line of this stream
    pub fn query_id(&self) -> Uuid {
        self.query_id
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    /// Rows consumed so far
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    fn handle(&self) -> Result<StreamHandle> {
        self.handle.ok_or(Error::StreamClosed)
    }

    /// Whether another row is available
    pub fn has_next(&self) -> Result<bool> {
        let handle = self.handle()?;
        Ok(self.engine.stream_has_next(handle)?)
    }

    /// Move to the next row
    ///
    /// Fails with a `NoData` engine error when the stream is exhausted.
    pub fn advance(&mut self) -> Result<()> {
        match self.next_row()? {
            Some(_) => Ok(()),
            None => Err(EngineError::new(Status::NoData, "stream is exhausted").into()),
        }
    }

    /// Move to the next row and return it, or `None` at the end
    pub fn next_row(&mut self) -> Result<Option<&Row>> {
        let handle = self.handle()?;
        if self.engine.stream_advance(handle, self.row.buffer_mut())? {
            self.rows_read += 1;
            Ok(Some(&self.row))
        } else {
            self.row.clear();
            Ok(None)
        }
    }

    /// The current row
    pub fn row(&self) -> &Row {
        &self.row
    }

    /// Release the stream. Closing twice is a no-op.
    ///
    /// The cursor stays open if the engine fails to release the stream,
    /// so the close can be retried.
    pub fn close(&mut self) -> Result<()> {
        if let Some(handle) = self.handle {
            self.engine.stream_close(handle)?;
            self.handle = None;
            tracing::debug!(
                query_id = %self.query_id,
                rows = self.rows_read,
                "Closed stream"
            );
        }
        Ok(())
    }
}

impl<E: Engine + ?Sized> Iterator for Cursor<'_, E> {
    type Item = Result<String>;

    /// Series line of each remaining row
    fn next(&mut self) -> Option<Self::Item> {
        if self.is_closed() {
            return None;
        }
        match self.next_row() {
            Ok(Some(row)) => Some(Ok(row.series().to_string())),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl<E: Engine + ?Sized> Drop for Cursor<'_, E> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(query_id = %self.query_id, error = %e, "Failed to close stream");
        }
    }
}

impl<E: Engine + ?Sized> std::fmt::Debug for Cursor<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("handle", &self.handle)
            .field("query_id", &self.query_id)
            .field("rows_read", &self.rows_read)
            .finish()
    }
}
