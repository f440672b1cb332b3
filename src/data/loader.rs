use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::model::{FieldValue, Measurement, RawRecord, Series};
use super::source::RecordSource;
use crate::config::FieldNames;
use crate::error::{LoadError, MalformedRecord};

/// Naive layouts accepted for timestamp strings; read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Offset layouts that RFC 3339 parsing does not cover.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%z", "%Y-%m-%dT%H:%M:%S%.f%z"];

// ---------------------------------------------------------------------------
// Load report
// ---------------------------------------------------------------------------

/// Record counts of a single load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub fetched: usize,
    pub kept: usize,
    pub dropped: usize,
}

// ---------------------------------------------------------------------------
// Series loader
// ---------------------------------------------------------------------------

/// Turns the raw documents of a [`RecordSource`] into a sorted [`Series`].
pub struct SeriesLoader {
    source: Box<dyn RecordSource>,
    fields: FieldNames,
}

impl SeriesLoader {
    pub fn new(source: Box<dyn RecordSource>) -> Self {
        Self {
            source,
            fields: FieldNames::default(),
        }
    }

    pub fn with_fields(mut self, fields: FieldNames) -> Self {
        self.fields = fields;
        self
    }

    pub fn describe(&self) -> String {
        self.source.describe()
    }

    /// Fetch, clean and sort every record.
    ///
    /// # Errors
    /// [`LoadError::SourceUnavailable`] when the fetch fails. Malformed
    /// records never fail the load; they are dropped.
    pub fn load(&self) -> Result<Series, LoadError> {
        self.load_with_report().map(|(series, _)| series)
    }

    /// Like [`SeriesLoader::load`], also returning how many records were
    /// kept and dropped.
    pub fn load_with_report(&self) -> Result<(Series, LoadReport), LoadError> {
        let records = self.source.fetch_all().map_err(|e| {
            log::warn!("Record source {} unavailable: {e}", self.source.describe());
            LoadError::SourceUnavailable(e)
        })?;

        let fetched = records.len();
        let mut points = Vec::with_capacity(fetched);
        for (i, record) in records.iter().enumerate() {
            match parse_record(record, &self.fields) {
                Ok(m) => points.push(m),
                Err(reason) => log::debug!("Dropping record {i}: {reason}"),
            }
        }

        let report = LoadReport {
            fetched,
            kept: points.len(),
            dropped: fetched - points.len(),
        };
        if report.dropped > 0 {
            log::warn!(
                "Dropped {} of {} records from {} as malformed",
                report.dropped,
                report.fetched,
                self.source.describe()
            );
        }
        log::info!(
            "Loaded {} measurements from {}",
            report.kept,
            self.source.describe()
        );

        Ok((Series::from_unsorted(points), report))
    }
}

// ---------------------------------------------------------------------------
// Record validation
// ---------------------------------------------------------------------------

/// Validate one raw record into a [`Measurement`].
pub fn parse_record(record: &RawRecord, fields: &FieldNames) -> Result<Measurement, MalformedRecord> {
    let raw_ts = record
        .get(&fields.timestamp)
        .ok_or_else(|| MalformedRecord::MissingField(fields.timestamp.clone()))?;
    let raw_value = record
        .get(&fields.value)
        .ok_or_else(|| MalformedRecord::MissingField(fields.value.clone()))?;

    Ok(Measurement {
        timestamp: parse_timestamp(raw_ts)?,
        value: parse_value(raw_value)?,
    })
}

/// Interpret a field as an absolute UTC instant.
///
/// Integers are Unix epoch milliseconds; strings without an offset are UTC.
pub fn parse_timestamp(field: &FieldValue) -> Result<DateTime<Utc>, MalformedRecord> {
    let bad = || MalformedRecord::BadTimestamp(field.to_string());
    match field {
        FieldValue::Timestamp(t) => Ok(*t),
        FieldValue::Integer(ms) => DateTime::from_timestamp_millis(*ms).ok_or_else(bad),
        FieldValue::String(s) => parse_timestamp_str(s.trim()).ok_or_else(bad),
        _ => Err(bad()),
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(t) = DateTime::parse_from_str(s, fmt) {
            return Some(t.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(t.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
}

/// Interpret a field as a finite reading. Only numeric fields qualify.
pub fn parse_value(field: &FieldValue) -> Result<f64, MalformedRecord> {
    let value = field
        .as_f64()
        .ok_or_else(|| MalformedRecord::NonNumericValue(field.to_string()))?;
    if !value.is_finite() {
        return Err(MalformedRecord::NonFiniteValue(value));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::error::SourceError;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn record(ts: FieldValue, value: Option<FieldValue>) -> RawRecord {
        let mut r = RawRecord::new();
        r.insert("timestamp".into(), ts);
        if let Some(v) = value {
            r.insert("Value".into(), v);
        }
        r
    }

    struct Fixed(Vec<RawRecord>);

    impl RecordSource for Fixed {
        fn fetch_all(&self) -> Result<Vec<RawRecord>, SourceError> {
            Ok(self.0.clone())
        }

        fn describe(&self) -> String {
            "fixed".into()
        }
    }

    #[test]
    fn timestamp_layouts() {
        let expected = utc(2024, 5, 1, 10, 30, 0);
        for s in [
            "2024-05-01T10:30:00Z",
            "2024-05-01T12:30:00+02:00",
            "2024-05-01 10:30:00",
            "2024-05-01T10:30:00",
            "2024-05-01T10:30",
            "2024-05-01 10:30",
            "2024/05/01 10:30:00",
            "2024-05-01 10:30:00+0000",
            "  2024-05-01 10:30:00.000  ",
        ] {
            assert_eq!(
                parse_timestamp(&FieldValue::String(s.into())),
                Ok(expected),
                "layout {s:?}"
            );
        }
        assert_eq!(
            parse_timestamp(&FieldValue::String("2024-05-01".into())),
            Ok(utc(2024, 5, 1, 0, 0, 0))
        );
    }

    #[test]
    fn epoch_millis_and_native_timestamps() {
        let t = utc(2024, 5, 1, 10, 30, 0);
        assert_eq!(parse_timestamp(&FieldValue::Integer(t.timestamp_millis())), Ok(t));
        assert_eq!(parse_timestamp(&FieldValue::Timestamp(t)), Ok(t));
    }

    #[test]
    fn garbage_timestamps_are_malformed() {
        for field in [
            FieldValue::String("yesterday".into()),
            FieldValue::String("2024-13-01 00:00:00".into()),
            FieldValue::Null,
            FieldValue::Bool(true),
            FieldValue::Float(1.5),
        ] {
            assert!(matches!(
                parse_timestamp(&field),
                Err(MalformedRecord::BadTimestamp(_))
            ));
        }
    }

    #[test]
    fn value_must_be_finite_number() {
        assert_eq!(parse_value(&FieldValue::Float(61.2)), Ok(61.2));
        assert_eq!(parse_value(&FieldValue::Integer(60)), Ok(60.0));
        assert!(matches!(
            parse_value(&FieldValue::String("61.2".into())),
            Err(MalformedRecord::NonNumericValue(_))
        ));
        assert!(matches!(
            parse_value(&FieldValue::Null),
            Err(MalformedRecord::NonNumericValue(_))
        ));
        assert!(matches!(
            parse_value(&FieldValue::Float(f64::NAN)),
            Err(MalformedRecord::NonFiniteValue(_))
        ));
    }

    #[test]
    fn missing_value_is_dropped_not_zeroed() {
        let loader = SeriesLoader::new(Box::new(Fixed(vec![
            record(FieldValue::String("2024-05-01T10:00:00Z".into()), None),
            record(
                FieldValue::String("2024-05-01T10:01:00Z".into()),
                Some(FieldValue::Float(62.0)),
            ),
        ])));
        let (series, report) = loader.load_with_report().unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.measurements()[0].value, 62.0);
        assert_eq!(
            report,
            LoadReport {
                fetched: 2,
                kept: 1,
                dropped: 1
            }
        );
    }

    #[test]
    fn custom_field_names() {
        let mut r = RawRecord::new();
        r.insert("time".into(), FieldValue::String("2024-05-01T10:00:00Z".into()));
        r.insert("LAeq".into(), FieldValue::Float(55.0));
        let fields = FieldNames {
            timestamp: "time".into(),
            value: "LAeq".into(),
        };
        assert_eq!(parse_record(&r, &fields).unwrap().value, 55.0);
        assert_eq!(
            parse_record(&r, &FieldNames::default()),
            Err(MalformedRecord::MissingField("timestamp".into()))
        );
    }
}
