//! Engine status codes

use serde::Serialize;
use std::fmt;

/// Closed set of outcomes reported by an engine call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Success,
    NoData,
    OutOfMemory,
    Busy,
    NotFound,
    BadArgument,
    Overflow,
    BadData,
    General,
    LateWrite,
    NotImplemented,
    QueryParseError,
    AnomalyNegativeValue,
    MergeRequired,
    Closed,
    Timeout,
    RetryRequired,
    AccessDenied,
    NotPermitted,
    Unavailable,
    HighCardinalityUnsupported,
    IrregularSeriesRequired,
    MissingDataUnsupported,
    IoError,
}

impl Status {
    /// Numeric wire code
    pub fn code(&self) -> i32 {
        match self {
            Self::Success => 0,
            Self::NoData => 1,
            Self::OutOfMemory => 2,
            Self::Busy => 3,
            Self::NotFound => 4,
            Self::BadArgument => 5,
            Self::Overflow => 6,
            Self::BadData => 7,
            Self::General => 8,
            Self::LateWrite => 9,
            Self::NotImplemented => 10,
            Self::QueryParseError => 11,
            Self::AnomalyNegativeValue => 12,
            Self::MergeRequired => 13,
            Self::Closed => 14,
            Self::Timeout => 15,
            Self::RetryRequired => 16,
            Self::AccessDenied => 17,
            Self::NotPermitted => 18,
            Self::Unavailable => 19,
            Self::HighCardinalityUnsupported => 20,
            Self::IrregularSeriesRequired => 21,
            Self::MissingDataUnsupported => 22,
            Self::IoError => 23,
        }
    }

    /// Map a wire code back to a status. Unknown codes give `None`.
    pub fn from_code(code: i32) -> Option<Self> {
        let status = match code {
            0 => Self::Success,
            1 => Self::NoData,
            2 => Self::OutOfMemory,
            3 => Self::Busy,
            4 => Self::NotFound,
            5 => Self::BadArgument,
            6 => Self::Overflow,
            7 => Self::BadData,
            8 => Self::General,
            9 => Self::LateWrite,
            10 => Self::NotImplemented,
            11 => Self::QueryParseError,
            12 => Self::AnomalyNegativeValue,
            13 => Self::MergeRequired,
            14 => Self::Closed,
            15 => Self::Timeout,
            16 => Self::RetryRequired,
            17 => Self::AccessDenied,
            18 => Self::NotPermitted,
            19 => Self::Unavailable,
            20 => Self::HighCardinalityUnsupported,
            21 => Self::IrregularSeriesRequired,
            22 => Self::MissingDataUnsupported,
            23 => Self::IoError,
            _ => return None,
        };
        Some(status)
    }

    /// Human readable description
    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::NoData => "No data, can't proceed",
            Self::OutOfMemory => "Not enough memory",
            Self::Busy => "Device is busy",
            Self::NotFound => "Can't find result",
            Self::BadArgument => "Bad argument",
            Self::Overflow => "Overflow error",
            Self::BadData => "The supplied data is invalid",
            Self::General => "Error, no details available",
            Self::LateWrite => "Late write error",
            Self::NotImplemented => "Not implemented error",
            Self::QueryParseError => "Invalid query",
            Self::AnomalyNegativeValue => "Anomaly detector doesn't support negative values",
            Self::MergeRequired => "Stale data in sequencer, merge to disk required",
            Self::Closed => "Operation can't be completed because the device was closed",
            Self::Timeout => "Timeout detected",
            Self::RetryRequired => "Retry required",
            Self::AccessDenied => "Access denied",
            Self::NotPermitted => "Operation not permitted",
            Self::Unavailable => "Resource is not available",
            Self::HighCardinalityUnsupported => "Query doesn't support high cardinality",
            Self::IrregularSeriesRequired => "Query doesn't support irregular series",
            Self::MissingDataUnsupported => "Function can't handle missing values",
            Self::IoError => "I/O error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.code())
    }
}
