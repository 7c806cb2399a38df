//! # tsquery
//!
//! Client-side query layer for tag-structured time-series stores. Typed
//! criteria compile to the store's JSON request documents; result streams
//! are decoded back into rows with metric, aggregate and tag accessors.
//!
//! ## Modules
//!
//! - [`model`]: tags, aggregate functions, predicates, epoch conversions
//! - [`query`]: criteria builders and the request encoder
//! - [`cursor`]: series-line decoding and the stream cursor
//! - [`engine`]: the engine boundary and an in-memory engine
//! - [`session`]: runs criteria against an engine
//!
//! ## Quick Start
//!
//! ```rust
//! use tsquery::engine::{MemoryEngine, ScriptedRow};
//! use tsquery::model::AggregateFunction;
//! use tsquery::query::AggregateCriteria;
//! use tsquery::Session;
//!
//! # fn main() -> tsquery::Result<()> {
//! let session = Session::new(MemoryEngine::new());
//! session
//!     .engine()
//!     .script(vec![ScriptedRow::new("cpu:max host=a", 0, vec![93.5])]);
//!
//! let criteria = AggregateCriteria::builder()
//!     .aggregate("cpu", AggregateFunction::Max)
//!     .build()?;
//!
//! if let Some(mut cursor) = session.query(&criteria)? {
//!     while let Some(row) = cursor.next_row()? {
//!         println!("{} {:?} = {}", row.metric()?, row.tags()?, row.value());
//!     }
//!     cursor.close()?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod logging;
pub mod model;
pub mod query;
pub mod session;

pub use config::{Config, ConfigError, LoggingConfig, OutputConfig, OutputFormat, QueryConfig};
pub use cursor::{Cursor, DecodeError, DecodedRow, MetadataCursor, Row};
pub use engine::{Engine, EngineError, MemoryEngine, RowBuffer, Status, StreamHandle};
pub use error::{Error, Result};
pub use model::{AggregateFunction, Filter, OrderBy, Predicate, Tag};
pub use query::{
    AggregateCriteria, Criteria, CriteriaError, GroupAggregateCriteria, JoinCriteria,
    MetadataCriteria, SelectCriteria,
};
pub use session::Session;
