//! Result-row decoding
//!
//! - **series**: the series-line grammar
//! - **row**: `Row`, memoized accessors over the current line and values
//! - **stream**: `Cursor`, the pull protocol over an engine stream
//! - **metadata**: `MetadataCursor`, series names only
//!
//! # Row shapes
//!
//! ```text
//! mem server=1                              simple
//! mem:max server=1 server=2                 aggregate
//! mem:count|mem:max|mem:min server=1        group-aggregate
//! hdd|cpu|mem location=xyz                  join
//! ```

mod error;
mod metadata;
mod row;
pub mod series;
mod stream;

pub use error::{DecodeError, DecodeResult};
pub use metadata::MetadataCursor;
pub use row::{DecodedRow, Row};
pub use stream::Cursor;
