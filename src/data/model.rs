use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::InvalidRange;

// ---------------------------------------------------------------------------
// FieldValue – a single field of a raw document
// ---------------------------------------------------------------------------

/// A dynamically-typed document field, as handed over by a record source.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Source-native date (Parquet timestamp column, extended-JSON `$date`).
    Timestamp(DateTime<Utc>),
    Null,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{s:?}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            FieldValue::Null => write!(f, "<null>"),
        }
    }
}

impl FieldValue {
    /// Numeric view of the field. Strings are not coerced.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

/// One untyped document: field name → value.
pub type RawRecord = BTreeMap<String, FieldValue>;

/// Internal row identifier that record sources strip from every document.
pub const ROW_ID_FIELD: &str = "_id";

// ---------------------------------------------------------------------------
// Measurement – one validated reading
// ---------------------------------------------------------------------------

/// A validated SPL reading in dB(A).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub timestamp: DateTime<Utc>,
    /// Always finite.
    pub value: f64,
}

// ---------------------------------------------------------------------------
// Series – measurements sorted by time
// ---------------------------------------------------------------------------

/// Immutable sequence of measurements in ascending timestamp order.
///
/// Duplicate timestamps are kept in the order they were supplied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    points: Vec<Measurement>,
}

impl Series {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sort `points` by timestamp (stable) and wrap them.
    pub fn from_unsorted(mut points: Vec<Measurement>) -> Self {
        points.sort_by_key(|m| m.timestamp);
        Series { points }
    }

    /// Wrap points that are already in ascending order.
    pub(crate) fn from_sorted(points: Vec<Measurement>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        Series { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn measurements(&self) -> &[Measurement] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Measurement> {
        self.points.iter()
    }

    /// Earliest and latest timestamps, the default selection range.
    /// `None` for an empty series.
    pub fn bounds(&self) -> Option<TimeRange> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        Some(TimeRange {
            start: first.timestamp,
            end: last.timestamp,
        })
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a Measurement;
    type IntoIter = std::slice::Iter<'a, Measurement>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

// ---------------------------------------------------------------------------
// TimeRange – inclusive window
// ---------------------------------------------------------------------------

/// Inclusive `[start, end]` window with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, InvalidRange> {
        if start > end {
            return Err(InvalidRange { start, end });
        }
        Ok(TimeRange { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t <= self.end
    }

    /// Restrict this range to `bounds`. A range entirely outside `bounds`
    /// collapses onto the nearest edge.
    pub fn clamp_to(&self, bounds: &TimeRange) -> TimeRange {
        let start = self.start.clamp(bounds.start, bounds.end);
        let end = self.end.clamp(bounds.start, bounds.end);
        TimeRange { start, end }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} – {}",
            self.start.format("%Y-%m-%d %H:%M:%S"),
            self.end.format("%Y-%m-%d %H:%M:%S")
        )
    }
}
