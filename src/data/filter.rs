use chrono::{DateTime, Utc};

use super::model::{Series, TimeRange};
use crate::error::InvalidRange;

// ---------------------------------------------------------------------------
// Window filter: inclusive time range over a sorted series
// ---------------------------------------------------------------------------

/// Return the measurements of `series` with `range.start <= t <= range.end`.
///
/// The input is sorted, so the result is one contiguous slice located by
/// binary search. A range outside the series' span gives an empty series.
pub fn filter(series: &Series, range: &TimeRange) -> Series {
    let points = series.measurements();
    let lo = points.partition_point(|m| m.timestamp < range.start());
    let hi = points.partition_point(|m| m.timestamp <= range.end());
    if lo >= hi {
        return Series::empty();
    }
    Series::from_sorted(points[lo..hi].to_vec())
}

/// Validate `start <= end`, then [`filter`].
pub fn filter_between(
    series: &Series,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Series, InvalidRange> {
    let range = TimeRange::new(start, end)?;
    Ok(filter(series, &range))
}
