//! Nanosecond epoch conversions
//!
//! The store addresses time as signed nanoseconds since the Unix epoch.
//! `to_epoch` and `from_epoch` round-trip exactly for every `i64` epoch.

use chrono::{DateTime, TimeZone, Utc};

/// Nanoseconds in one second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert an instant to nanoseconds since the epoch
///
/// Returns `None` when the instant lies outside the `i64` nanosecond range
/// (roughly years 1677 to 2262).
pub fn to_epoch(timestamp: &DateTime<Utc>) -> Option<i64> {
    let nanos = i128::from(timestamp.timestamp()) * i128::from(NANOS_PER_SECOND)
        + i128::from(timestamp.timestamp_subsec_nanos());
    i64::try_from(nanos).ok()
}

/// Convert nanoseconds since the epoch to an instant
pub fn from_epoch(nanos: i64) -> DateTime<Utc> {
    let seconds = nanos.div_euclid(NANOS_PER_SECOND);
    let subsec = nanos.rem_euclid(NANOS_PER_SECOND) as u32;
    match Utc.timestamp_opt(seconds, subsec) {
        chrono::LocalResult::Single(dt) => dt,
        // unreachable: the i64 nanosecond range is inside chrono's range
        _ => DateTime::<Utc>::MIN_UTC,
    }
}
