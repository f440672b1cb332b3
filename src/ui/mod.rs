pub mod panels;
pub mod plot;

use chrono::{DateTime, Utc};
use spl_monitor::TimeRange;

/// Plot and slider coordinate of an instant: Unix seconds.
pub fn to_axis(t: DateTime<Utc>) -> f64 {
    t.timestamp_millis() as f64 / 1000.0
}

pub fn from_axis(x: f64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis((x * 1000.0).round() as i64)
}

pub fn format_time(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Window after a slider drag. `start`/`end` carry the axis value of a slider
/// that moved; an untouched end keeps its exact instant, since the axis only
/// resolves milliseconds. The end is raised to the start, never inverted.
pub fn dragged_window(range: TimeRange, start: Option<f64>, end: Option<f64>) -> Option<TimeRange> {
    let start = match start {
        Some(x) => from_axis(x)?,
        None => range.start(),
    };
    let end = match end {
        Some(x) => from_axis(x)?,
        None => range.end(),
    };
    TimeRange::new(start, end.max(start)).ok()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn range(start: DateTime<Utc>, end: DateTime<Utc>) -> TimeRange {
        TimeRange::new(start, end).unwrap()
    }

    #[test]
    fn untouched_end_keeps_sub_millisecond_instant() {
        let start = Utc.timestamp_opt(1_000, 0).unwrap();
        let end = Utc.timestamp_opt(2_000, 123_456_789).unwrap();
        let moved = dragged_window(range(start, end), Some(1_500.0), None).unwrap();
        assert_eq!(moved.start(), Utc.timestamp_opt(1_500, 0).unwrap());
        assert_eq!(moved.end(), end);
    }

    #[test]
    fn start_dragged_past_end_raises_end() {
        let start = Utc.timestamp_opt(1_000, 0).unwrap();
        let end = Utc.timestamp_opt(2_000, 0).unwrap();
        let moved = dragged_window(range(start, end), Some(2_500.0), None).unwrap();
        assert_eq!(moved.start(), moved.end());
    }

    #[test]
    fn axis_round_trip_is_millisecond_exact() {
        let t = Utc.timestamp_millis_opt(1_714_557_600_123).unwrap();
        assert_eq!(from_axis(to_axis(t)), Some(t));
    }
}
