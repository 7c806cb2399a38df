//! Human duration parsing
//!
//! Accepts one or more `<integer><unit>` components, summed:
//!
//! ```text
//! 500ms   60s   5m   1h30m   7d   250us   10ns
//! ```

use crate::query::error::{CriteriaError, CriteriaResult};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::digit1,
    combinator::{all_consuming, map_res, value},
    multi::fold_many1,
    sequence::pair,
    IResult,
};
use std::time::Duration;

const NANOS_PER_MICRO: u64 = 1_000;
const NANOS_PER_MILLI: u64 = 1_000_000;
const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Parse a duration such as `30s` or `1h30m`
pub fn parse_duration(input: &str) -> CriteriaResult<Duration> {
    let trimmed = input.trim();
    match all_consuming(components)(trimmed) {
        Ok((_, total)) => u64::try_from(total)
            .map(Duration::from_nanos)
            .map_err(|_| CriteriaError::InvalidArgument(format!("duration '{}' is too large", trimmed))),
        Err(_) => Err(CriteriaError::InvalidArgument(format!(
            "invalid duration '{}', expected e.g. 500ms, 60s, 5m, 1h or 7d",
            trimmed
        ))),
    }
}

/// Format a duration with the largest unit that divides it exactly
pub fn format_duration(duration: Duration) -> String {
    const UNITS: [(u128, &str); 7] = [
        (86_400 * NANOS_PER_SEC as u128, "d"),
        (3_600 * NANOS_PER_SEC as u128, "h"),
        (60 * NANOS_PER_SEC as u128, "m"),
        (NANOS_PER_SEC as u128, "s"),
        (NANOS_PER_MILLI as u128, "ms"),
        (NANOS_PER_MICRO as u128, "us"),
        (1, "ns"),
    ];

    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    for (size, suffix) in UNITS {
        if nanos % size == 0 {
            return format!("{}{}", nanos / size, suffix);
        }
    }
    format!("{}ns", nanos)
}

fn components(input: &str) -> IResult<&str, u128> {
    fold_many1(component, || 0u128, |total, nanos| total + u128::from(nanos))(input)
}

fn component(input: &str) -> IResult<&str, u64> {
    map_res(pair(digit1, unit), |(digits, size): (&str, u64)| {
        digits
            .parse::<u64>()
            .ok()
            .and_then(|count| count.checked_mul(size))
            .ok_or("duration component overflows")
    })(input)
}

fn unit(input: &str) -> IResult<&str, u64> {
    alt((
        value(1, tag("ns")),
        value(NANOS_PER_MICRO, tag("us")),
        value(NANOS_PER_MILLI, tag("ms")),
        value(NANOS_PER_SEC, tag("s")),
        value(60 * NANOS_PER_SEC, tag("m")),
        value(3_600 * NANOS_PER_SEC, tag("h")),
        value(86_400 * NANOS_PER_SEC, tag("d")),
    ))(input)
}
