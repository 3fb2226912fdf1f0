//! Telemetry error types.

use std::fmt;

/// Errors from running a sensor query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The database rejected or failed the query.
    QueryFailed { details: String },
    /// The query did not finish within the configured timeout.
    Timeout { after_ms: u64 },
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueryFailed { details } => write!(f, "sensor query failed: {details}"),
            Self::Timeout { after_ms } => write!(f, "sensor query timed out after {after_ms}ms"),
        }
    }
}

impl std::error::Error for QueryError {}
