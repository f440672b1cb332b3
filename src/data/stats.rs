use super::model::Series;
use crate::error::EmptyInput;

/// Min, max and unweighted mean of the readings in a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub count: usize,
}

/// Summarize `series`.
///
/// Every sample counts once regardless of the spacing between samples.
/// The mean is accumulated incrementally to stay stable over long series.
///
/// # Errors
/// [`EmptyInput`] for an empty series; callers are expected to check first.
pub fn summarize(series: &Series) -> Result<SummaryStats, EmptyInput> {
    let mut values = series.iter().map(|m| m.value);
    let first = values.next().ok_or(EmptyInput)?;

    let mut stats = SummaryStats {
        min: first,
        max: first,
        mean: first,
        count: 1,
    };
    for v in values {
        stats.count += 1;
        stats.min = stats.min.min(v);
        stats.max = stats.max.max(v);
        stats.mean += (v - stats.mean) / stats.count as f64;
    }
    Ok(stats)
}
