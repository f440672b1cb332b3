use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Record source failures
// ---------------------------------------------------------------------------

/// Why a record source could not produce its records.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {origin}: {reason}")]
    Decode { origin: String, reason: String },

    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("unsupported source: {0}")]
    Unsupported(String),

    #[error("fetch did not complete within {0:?}")]
    Timeout(Duration),
}

// ---------------------------------------------------------------------------
// Loader failures
// ---------------------------------------------------------------------------

/// The only fatal loader outcome. An empty or fully malformed source is
/// `Ok` with an empty series, never this.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot retrieve data: {0}")]
    SourceUnavailable(#[from] SourceError),
}

/// Reason a single raw record was dropped during loading.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedRecord {
    #[error("missing field '{0}'")]
    MissingField(String),

    #[error("unparseable timestamp {0}")]
    BadTimestamp(String),

    #[error("non-numeric value {0}")]
    NonNumericValue(String),

    #[error("non-finite value {0}")]
    NonFiniteValue(f64),
}

// ---------------------------------------------------------------------------
// Pipeline misuse
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot summarize an empty series")]
pub struct EmptyInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("range start {start} is after range end {end}")]
pub struct InvalidRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}
