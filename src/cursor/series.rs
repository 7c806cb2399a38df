//! Series-line grammar
//!
//! ```text
//! line           := metric-part (" " tag-part)*
//! metric-part    := metric-spec ("|" metric-spec)*
//! metric-spec    := metric-name (":" aggregate-name)?
//! tag-part       := tag-name "=" tag-value
//! ```
//!
//! A `:` only separates an aggregate name when it is not the first
//! character of the metric spec; the last `:` wins.

use crate::cursor::error::{DecodeError, DecodeResult};
use crate::model::{AggregateFunction, Tag};

const TAG_SEPARATOR: char = ' ';
const METRIC_SEPARATOR: char = '|';
const AGGREGATE_SEPARATOR: char = ':';
const TAG_VALUE_SEPARATOR: char = '=';

/// Split a line into its metric part and its tag part
pub fn split_line(line: &str) -> (&str, &str) {
    line.split_once(TAG_SEPARATOR).unwrap_or((line, ""))
}

/// Decode one metric spec into its metric name and optional function
pub fn parse_metric_spec<'a>(
    spec: &'a str,
    line: &str,
) -> DecodeResult<(&'a str, Option<AggregateFunction>)> {
    match spec.rfind(AGGREGATE_SEPARATOR) {
        Some(index) if index > 0 => {
            let name = &spec[index + 1..];
            let function =
                AggregateFunction::from_name(name).ok_or_else(|| DecodeError::UnknownAggregate {
                    name: name.to_string(),
                    series: line.to_string(),
                })?;
            Ok((&spec[..index], Some(function)))
        }
        _ => Ok((spec, None)),
    }
}

/// First metric spec of a line
pub fn first_metric(line: &str) -> DecodeResult<(&str, Option<AggregateFunction>)> {
    let (metric_part, _) = split_line(line);
    let spec = metric_part
        .split(METRIC_SEPARATOR)
        .next()
        .unwrap_or(metric_part);
    parse_metric_spec(spec, line)
}

/// Every metric of a line, plus the functions of the specs that carry one
pub fn parse_metrics(line: &str) -> DecodeResult<(Vec<String>, Vec<AggregateFunction>)> {
    let (metric_part, _) = split_line(line);
    if metric_part.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }

    let mut metrics = Vec::new();
    let mut functions = Vec::new();
    for spec in metric_part.split(METRIC_SEPARATOR) {
        let (name, function) = parse_metric_spec(spec, line)?;
        metrics.push(name.to_string());
        if let Some(function) = function {
            functions.push(function);
        }
    }
    Ok((metrics, functions))
}

/// Tags of a line in order of appearance
///
/// Empty tokens from repeated spaces are skipped; the first `=` of a token
/// splits name from value.
pub fn parse_tags(line: &str) -> DecodeResult<Vec<Tag>> {
    let (_, tag_part) = split_line(line);
    tag_part
        .split(TAG_SEPARATOR)
        .filter(|token| !token.is_empty())
        .map(|token| match token.split_once(TAG_VALUE_SEPARATOR) {
            Some((name, value)) => Ok(Tag::new(name, value)),
            None => Err(DecodeError::MalformedTag {
                token: token.to_string(),
                series: line.to_string(),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_line() {
        assert_eq!(first_metric("mem server=1").unwrap(), ("mem", None));
        assert_eq!(
            parse_tags("mem server=1").unwrap(),
            vec![Tag::new("server", "1")]
        );
    }

    #[test]
    fn test_line_without_tags() {
        assert_eq!(split_line("mem"), ("mem", ""));
        assert!(parse_tags("mem").unwrap().is_empty());
        assert_eq!(first_metric("mem:sum").unwrap(), ("mem", Some(AggregateFunction::Sum)));
    }

    #[test]
    fn test_aggregate_suffix() {
        assert_eq!(
            first_metric("mem:max server=1 server=2").unwrap(),
            ("mem", Some(AggregateFunction::Max))
        );
        assert_eq!(
            parse_metric_spec("a:b:min", "a:b:min").unwrap(),
            ("a:b", Some(AggregateFunction::Min))
        );
        assert_eq!(parse_metric_spec(":max", ":max").unwrap(), (":max", None));
    }

    #[test]
    fn test_unknown_aggregate() {
        let err = first_metric("mem:median host=a").unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnknownAggregate {
                name: "median".to_string(),
                series: "mem:median host=a".to_string(),
            }
        );
        assert!(first_metric("mem:MAX").is_err());
    }

    #[test]
    fn test_compound_line() {
        let (metrics, functions) = parse_metrics("a:count|a:max|a:min|a:sum server=1").unwrap();
        assert_eq!(metrics, vec!["a", "a", "a", "a"]);
        assert_eq!(
            functions,
            vec![
                AggregateFunction::Count,
                AggregateFunction::Max,
                AggregateFunction::Min,
                AggregateFunction::Sum,
            ]
        );

        let (metrics, functions) = parse_metrics("hdd|cpu:max|mem location=xyz").unwrap();
        assert_eq!(metrics, vec!["hdd", "cpu", "mem"]);
        assert_eq!(functions, vec![AggregateFunction::Max]);
        assert_eq!(first_metric("hdd|cpu:max").unwrap(), ("hdd", None));
    }

    #[test]
    fn test_tags_keep_order_and_duplicates() {
        let tags = parse_tags("mem:max server=2  server=1 dc=a=b ").unwrap();
        assert_eq!(
            tags,
            vec![
                Tag::new("server", "2"),
                Tag::new("server", "1"),
                Tag::new("dc", "a=b"),
            ]
        );
    }

    #[test]
    fn test_malformed_tag() {
        let err = parse_tags("mem server").unwrap_err();
        assert!(matches!(err, DecodeError::MalformedTag { ref token, .. } if token == "server"));
    }

    #[test]
    fn test_empty_line() {
        let (metrics, functions) = parse_metrics("").unwrap();
        assert!(metrics.is_empty());
        assert!(functions.is_empty());
        assert!(parse_tags("").unwrap().is_empty());
    }
}
