//! Metadata cursor: series names without values

use crate::cursor::error::DecodeResult;
use crate::cursor::stream::Cursor;
use crate::engine::Engine;
use crate::error::Result;
use crate::model::Tag;

/// Cursor over the series names returned by a metadata request
#[derive(Debug)]
pub struct MetadataCursor<'e, E: Engine + ?Sized> {
    inner: Cursor<'e, E>,
}

impl<'e, E: Engine + ?Sized> MetadataCursor<'e, E> {
    pub(crate) fn new(inner: Cursor<'e, E>) -> Self {
        Self { inner }
    }

    pub fn has_next(&self) -> Result<bool> {
        self.inner.has_next()
    }

    pub fn advance(&mut self) -> Result<()> {
        self.inner.advance()
    }

    /// Move to the next series and return its name, or `None` at the end
    pub fn next_series(&mut self) -> Result<Option<&str>> {
        Ok(self.inner.next_row()?.map(|row| row.series()))
    }

    /// Name of the current series
    pub fn series(&self) -> &str {
        self.inner.row().series()
    }

    pub fn metric(&self) -> DecodeResult<&str> {
        self.inner.row().metric()
    }

    pub fn tags(&self) -> DecodeResult<&[Tag]> {
        self.inner.row().tags()
    }

    pub fn close(&mut self) -> Result<()> {
        self.inner.close()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

impl<E: Engine + ?Sized> Iterator for MetadataCursor<'_, E> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}
