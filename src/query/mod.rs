//! Query criteria and request encoding
//!
//! Typed builders describe what to read; a built criteria compiles to the
//! store's JSON request document:
//!
//! - **Select**: raw data points of one metric
//! - **Aggregate**: one reduced value per series
//! - **GroupAggregate**: downsampling into fixed-width bins
//! - **Join**: several metrics aligned per series and timestamp
//! - **Metadata**: series-name enumeration
//!
//! # Examples
//!
//! ```rust
//! use std::time::Duration;
//! use tsquery::model::AggregateFunction;
//! use tsquery::query::{Criteria, GroupAggregateCriteria};
//!
//! # fn main() -> tsquery::query::CriteriaResult<()> {
//! let criteria = GroupAggregateCriteria::builder()
//!     .group_aggregate(["cpu.user"], Duration::from_secs(60), [AggregateFunction::Max])
//!     .from(1_700_000_000_000_000_000)
//!     .to(1_700_003_600_000_000_000)
//!     .where_tag("host", ["web-1", "web-2"])
//!     .build()?;
//!
//! let document = criteria.compile();
//! assert!(document.starts_with(r#"{"group-aggregate":"#));
//! # Ok(())
//! # }
//! ```

mod aggregate;
pub(crate) mod criteria;
mod duration;
mod error;
mod filter;
mod group_aggregate;
mod join;
mod metadata;
mod select;

pub use aggregate::{AggregateBuilder, AggregateCriteria};
pub use criteria::{Clauses, Criteria};
pub use duration::{format_duration, parse_duration};
pub use error::{CriteriaError, CriteriaResult};
pub use filter::FilterSet;
pub use group_aggregate::{GroupAggregateBuilder, GroupAggregateCriteria};
pub use join::{JoinBuilder, JoinCriteria};
pub use metadata::{MetadataBuilder, MetadataCriteria};
pub use select::{SelectBuilder, SelectCriteria};
