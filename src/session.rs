//! Session: criteria in, cursors out
//!
//! A session owns an engine, compiles criteria, opens streams and wraps
//! them in cursors. It also validates samples before writing them.

use crate::cursor::{Cursor, MetadataCursor};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::model::to_epoch;
use crate::query::{Criteria, MetadataCriteria};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Longest series name the store accepts, in bytes
pub const MAX_SERIES_LENGTH: usize = 1000;

/// Most tags a series name may carry
pub const MAX_TAGS: usize = 32;

/// Query and write access to one engine
#[derive(Debug)]
pub struct Session<E: Engine> {
    engine: E,
}

impl<E: Engine> Session<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn into_inner(self) -> E {
        self.engine
    }

    /// Run a criteria. `None` means the query matched no data.
    pub fn query<C>(&self, criteria: &C) -> Result<Option<Cursor<'_, E>>>
    where
        C: Criteria + ?Sized,
    {
        let query_id = Uuid::new_v4();
        let document = criteria.compile();
        tracing::debug!(%query_id, kind = criteria.kind(), "Executing query");

        let cursor = self
            .engine
            .open_query_stream(document)?
            .map(|handle| Cursor::open(&self.engine, handle, query_id));
        if cursor.is_none() {
            tracing::debug!(%query_id, "Query returned no data");
        }
        Ok(cursor)
    }

    /// List series names. `None` means no series matched.
    pub fn metadata(&self, criteria: &MetadataCriteria) -> Result<Option<MetadataCursor<'_, E>>> {
        let query_id = Uuid::new_v4();
        tracing::debug!(%query_id, selector = %criteria.selector(), "Executing metadata query");

        Ok(self
            .engine
            .open_metadata_stream(criteria.compile())?
            .map(|handle| MetadataCursor::new(Cursor::open(&self.engine, handle, query_id))))
    }

    /// Write one data point
    ///
    /// `series` is a metric followed by space-separated `name=value` tags.
    pub fn add(&self, timestamp: i64, series: &str, value: f64) -> Result<()> {
        validate_sample(timestamp, series)?;
        self.engine.add_sample(timestamp, series, value)?;
        tracing::debug!(timestamp, series, value, "Wrote sample");
        Ok(())
    }

    /// Write one data point stamped with a calendar instant
    pub fn add_at(&self, timestamp: DateTime<Utc>, series: &str, value: f64) -> Result<()> {
        let epoch = to_epoch(&timestamp).ok_or_else(|| {
            Error::InvalidSample(format!(
                "timestamp {} is outside the nanosecond epoch range",
                timestamp.to_rfc3339()
            ))
        })?;
        self.add(epoch, series, value)
    }
}

fn validate_sample(timestamp: i64, series: &str) -> Result<()> {
    if timestamp < 0 {
        return Err(Error::InvalidSample(format!(
            "timestamp must not be negative, got {}",
            timestamp
        )));
    }
    if series.trim().is_empty() {
        return Err(Error::InvalidSample("series is empty".to_string()));
    }
    if series.len() > MAX_SERIES_LENGTH {
        return Err(Error::InvalidSample(format!(
            "series length {} exceeds {}",
            series.len(),
            MAX_SERIES_LENGTH
        )));
    }
    let tags = series.split_whitespace().skip(1).count();
    if tags > MAX_TAGS {
        return Err(Error::InvalidSample(format!(
            "series has {} tags, at most {} are allowed",
            tags, MAX_TAGS
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{MemoryEngine, ScriptedRow, Status};
    use crate::model::{AggregateFunction, Tag};
    use crate::query::{AggregateCriteria, GroupAggregateCriteria, JoinCriteria, SelectCriteria};
    use chrono::TimeZone;
    use std::time::Duration;

    #[test]
    fn test_select_round_trip() {
        let session = Session::new(MemoryEngine::new());
        session.engine().script(vec![
            ScriptedRow::new("mem server=1", 10, vec![1.5]),
            ScriptedRow::new("mem server=2", 11, vec![2.5]),
        ]);

        let criteria = SelectCriteria::builder()
            .select("mem")
            .from(1)
            .to(100)
            .build()
            .unwrap();
        let mut cursor = session.query(&criteria).unwrap().unwrap();

        let mut values = Vec::new();
        while let Some(row) = cursor.next_row().unwrap() {
            assert_eq!(row.metric().unwrap(), "mem");
            values.push(row.value());
        }
        assert_eq!(values, vec![1.5, 2.5]);
        cursor.close().unwrap();

        assert_eq!(
            session.engine().documents(),
            vec![r#"{"select":"mem","range":{"from":1,"to":100}}"#]
        );
    }

    #[test]
    fn test_group_aggregate_rows() {
        let session = Session::new(MemoryEngine::new());
        session.engine().script(vec![ScriptedRow::new(
            "server.mem:count|server.mem:max|server.mem:min|server.mem:sum server=1",
            60,
            vec![2.0, 40.0, 20.0, 60.0],
        )]);

        let criteria = GroupAggregateCriteria::builder()
            .group_aggregate(
                ["server.mem"],
                Duration::from_secs(60),
                [
                    AggregateFunction::Sum,
                    AggregateFunction::Min,
                    AggregateFunction::Max,
                    AggregateFunction::Count,
                ],
            )
            .from(1)
            .to(1_000)
            .build()
            .unwrap();
        let mut cursor = session.query(&criteria).unwrap().unwrap();
        let row = cursor.next_row().unwrap().unwrap();

        assert_eq!(row.value_of(AggregateFunction::Sum).unwrap(), 60.0);
        assert_eq!(row.value_of(AggregateFunction::Count).unwrap(), 2.0);
        assert_eq!(row.tags().unwrap(), [Tag::new("server", "1")]);
    }

    #[test]
    fn test_join_rows_through_trait_object() {
        let session = Session::new(MemoryEngine::new());
        session.engine().script(vec![ScriptedRow::new(
            "hdd.usage|cpu.usage|mem.usage location=xyz",
            5,
            vec![10.0, 12.0, 14.0],
        )]);

        let criteria: Box<dyn Criteria> = Box::new(
            JoinCriteria::builder()
                .join(["hdd.usage", "cpu.usage", "mem.usage"])
                .from(1)
                .to(10)
                .build()
                .unwrap(),
        );
        let mut cursor = session.query(criteria.as_ref()).unwrap().unwrap();
        let row = cursor.next_row().unwrap().unwrap();

        assert_eq!(row.metrics().unwrap(), ["hdd.usage", "cpu.usage", "mem.usage"]);
        assert_eq!(row.values(), [10.0, 12.0, 14.0]);
    }

    #[test]
    fn test_no_data() {
        let session = Session::new(MemoryEngine::new());
        let criteria = AggregateCriteria::builder()
            .aggregate("mem", AggregateFunction::Max)
            .build()
            .unwrap();

        assert!(session.query(&criteria).unwrap().is_none());
    }

    #[test]
    fn test_engine_error_is_propagated() {
        let session = Session::new(MemoryEngine::new());
        session.engine().fail_next(Status::QueryParseError);
        let criteria = AggregateCriteria::builder()
            .aggregate("mem", AggregateFunction::Max)
            .build()
            .unwrap();

        let err = session.query(&criteria).unwrap_err();
        assert!(matches!(err, Error::Engine(ref e) if e.status() == Status::QueryParseError));
    }

    #[test]
    fn test_metadata_after_writes() {
        let session = Session::new(MemoryEngine::new());
        session.add(1, "mem server=1 location=xyz", 1.0).unwrap();
        session.add(2, "mem server=2 location=xyz", 1.0).unwrap();
        session.add(2, "cpu server=2", 1.0).unwrap();

        let criteria = MetadataCriteria::builder()
            .metric("mem")
            .where_tag("server", ["2"])
            .build()
            .unwrap();
        let names: Vec<String> = session
            .metadata(&criteria)
            .unwrap()
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(names, vec!["mem location=xyz server=2"]);

        assert!(session
            .metadata(&MetadataCriteria::builder().metric("disk").build().unwrap())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_add_validation() {
        let session = Session::new(MemoryEngine::new());

        assert!(matches!(session.add(-1, "mem a=1", 1.0), Err(Error::InvalidSample(_))));
        assert!(matches!(session.add(1, "  ", 1.0), Err(Error::InvalidSample(_))));

        let long = format!("mem tag={}", "x".repeat(MAX_SERIES_LENGTH));
        assert!(matches!(session.add(1, &long, 1.0), Err(Error::InvalidSample(_))));

        let many_tags: String = (0..=MAX_TAGS).map(|i| format!(" t{}=v", i)).collect();
        let series = format!("mem{}", many_tags);
        assert!(matches!(session.add(1, &series, 1.0), Err(Error::InvalidSample(_))));

        assert!(session.engine().samples().is_empty());
    }

    #[test]
    fn test_add_at() {
        let session = Session::new(MemoryEngine::new());
        let at = Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap();
        session.add_at(at, "mem server=1", 3.0).unwrap();

        assert_eq!(
            session.engine().samples()[0].timestamp,
            1_700_000_000_000_000_000
        );
    }
}
