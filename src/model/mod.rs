//! Core value types shared by criteria and the row decoder
//!
//! - **tag**: `Tag` key/value pair decoded from series names
//! - **function**: closed vocabularies (`AggregateFunction`, `Predicate`, `OrderBy`)
//! - **filter**: value-comparison `Filter`
//! - **time**: nanosecond epoch conversions

pub mod filter;
pub mod function;
pub mod tag;
pub mod time;

pub use filter::Filter;
pub use function::{AggregateFunction, OrderBy, Predicate};
pub use tag::Tag;
pub use time::{from_epoch, to_epoch, NANOS_PER_SECOND};
