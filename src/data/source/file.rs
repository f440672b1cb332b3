use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray, TimestampMicrosecondArray, TimestampMillisecondArray,
    TimestampNanosecondArray, TimestampSecondArray,
};
use arrow::datatypes::{DataType, TimeUnit};
use chrono::{DateTime, Utc};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::RecordSource;
use crate::data::model::{FieldValue, RawRecord, ROW_ID_FIELD};
use crate::error::SourceError;

// ---------------------------------------------------------------------------
// JSON source
// ---------------------------------------------------------------------------

/// A JSON export of the collection.
///
/// Accepted layouts (records-oriented, the default `df.to_json(orient='records')`,
/// or a document API response saved to disk):
///
/// ```json
/// [
///   { "timestamp": "2024-05-01T10:00:00Z", "Value": 61.3, "device": "mic-1" },
///   ...
/// ]
/// ```
///
/// ```json
/// { "documents": [ ... ] }
/// ```
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for JsonFileSource {
    fn fetch_all(&self) -> Result<Vec<RawRecord>, SourceError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        let root: JsonValue = serde_json::from_str(&text).map_err(|e| SourceError::Decode {
            origin: self.describe(),
            reason: e.to_string(),
        })?;
        documents_from_json(root, &self.describe())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Split a JSON payload into raw records.
///
/// Array elements that are not objects are skipped with a warning.
pub(crate) fn documents_from_json(
    root: JsonValue,
    origin: &str,
) -> Result<Vec<RawRecord>, SourceError> {
    let docs = match root {
        JsonValue::Array(docs) => docs,
        JsonValue::Object(mut obj) => match obj.remove("documents") {
            Some(JsonValue::Array(docs)) => docs,
            _ => {
                return Err(SourceError::Decode {
                    origin: origin.to_string(),
                    reason: "expected an array or a 'documents' array".into(),
                })
            }
        },
        _ => {
            return Err(SourceError::Decode {
                origin: origin.to_string(),
                reason: "expected top-level JSON array".into(),
            })
        }
    };

    let mut records = Vec::with_capacity(docs.len());
    for (i, doc) in docs.into_iter().enumerate() {
        let JsonValue::Object(obj) = doc else {
            log::warn!("{origin}: document {i} is not a JSON object, skipped");
            continue;
        };
        let record: RawRecord = obj
            .into_iter()
            .filter(|(key, _)| key != ROW_ID_FIELD)
            .map(|(key, val)| (key, json_to_field(&val)))
            .collect();
        records.push(record);
    }
    Ok(records)
}

/// Convert a JSON value, unwrapping the extended-JSON wrappers document
/// databases emit (`$date`, `$numberLong`, `$numberInt`, `$numberDouble`).
pub(crate) fn json_to_field(val: &JsonValue) -> FieldValue {
    match val {
        JsonValue::String(s) => FieldValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                FieldValue::Float(f)
            } else {
                FieldValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => FieldValue::Bool(*b),
        JsonValue::Null => FieldValue::Null,
        JsonValue::Object(obj) if obj.len() == 1 => match obj.iter().next() {
            Some((key, inner)) => match (key.as_str(), inner) {
                ("$date", inner) => extended_date(inner),
                ("$numberLong" | "$numberInt", JsonValue::String(s)) => s
                    .parse::<i64>()
                    .map(FieldValue::Integer)
                    .unwrap_or_else(|_| FieldValue::String(s.clone())),
                ("$numberDouble", JsonValue::String(s)) => s
                    .parse::<f64>()
                    .map(FieldValue::Float)
                    .unwrap_or_else(|_| FieldValue::String(s.clone())),
                _ => FieldValue::String(val.to_string()),
            },
            None => FieldValue::Null,
        },
        other => FieldValue::String(other.to_string()),
    }
}

fn extended_date(inner: &JsonValue) -> FieldValue {
    match inner {
        JsonValue::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| FieldValue::Timestamp(t.with_timezone(&Utc)))
            .unwrap_or_else(|_| FieldValue::String(s.clone())),
        JsonValue::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(FieldValue::Timestamp)
            .unwrap_or(FieldValue::Null),
        JsonValue::Object(_) => match json_to_field(inner) {
            FieldValue::Integer(ms) => DateTime::from_timestamp_millis(ms)
                .map(FieldValue::Timestamp)
                .unwrap_or(FieldValue::Null),
            other => other,
        },
        other => FieldValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV source
// ---------------------------------------------------------------------------

/// CSV layout: header row with field names, one document per row.
/// Cells are typed by inspection; empty cells become null.
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for CsvFileSource {
    fn fetch_all(&self) -> Result<Vec<RawRecord>, SourceError> {
        let decode = |e: csv::Error| SourceError::Decode {
            origin: self.describe(),
            reason: e.to_string(),
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| match e.into_kind() {
                csv::ErrorKind::Io(source) => SourceError::Io {
                    path: self.path.clone(),
                    source,
                },
                other => SourceError::Decode {
                    origin: self.describe(),
                    reason: format!("{other:?}"),
                },
            })?;
        let headers: Vec<String> = reader
            .headers()
            .map_err(decode)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut records = Vec::new();
        for result in reader.records() {
            let row = result.map_err(decode)?;
            let record: RawRecord = headers
                .iter()
                .zip(row.iter())
                .filter(|(name, _)| name.as_str() != ROW_ID_FIELD)
                .map(|(name, cell)| (name.clone(), guess_field_type(cell.trim())))
                .collect();
            records.push(record);
        }
        Ok(records)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn guess_field_type(s: &str) -> FieldValue {
    if s.is_empty() {
        return FieldValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return FieldValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return FieldValue::Float(f);
    }
    if s == "true" || s == "false" {
        return FieldValue::Bool(s == "true");
    }
    FieldValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet source
// ---------------------------------------------------------------------------

/// A Parquet export of the collection, one document per row.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`); timestamp columns may be strings,
/// native timestamps of any unit, or integers.
pub struct ParquetFileSource {
    path: PathBuf,
}

impl ParquetFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn decode_err(&self, e: impl std::fmt::Display) -> SourceError {
        SourceError::Decode {
            origin: self.describe(),
            reason: e.to_string(),
        }
    }
}

impl RecordSource for ParquetFileSource {
    fn fetch_all(&self) -> Result<Vec<RawRecord>, SourceError> {
        let file = std::fs::File::open(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .map_err(|e| self.decode_err(e))?
            .build()
            .map_err(|e| self.decode_err(e))?;

        let mut records = Vec::new();
        for batch_result in reader {
            let batch = batch_result.map_err(|e| self.decode_err(e))?;
            let schema = batch.schema();

            let columns: Vec<(String, &Arc<dyn Array>)> = schema
                .fields()
                .iter()
                .zip(batch.columns())
                .filter(|(f, _)| f.name() != ROW_ID_FIELD)
                .map(|(f, col)| (f.name().clone(), col))
                .collect();

            for row in 0..batch.num_rows() {
                let record: RawRecord = columns
                    .iter()
                    .map(|(name, col)| (name.clone(), extract_field(col, row)))
                    .collect();
                records.push(record);
            }
        }
        Ok(records)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Extract a single field from an Arrow column at a given row.
fn extract_field(col: &Arc<dyn Array>, row: usize) -> FieldValue {
    if col.is_null(row) {
        return FieldValue::Null;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|a| FieldValue::String(a.value(row).to_string()))
            .unwrap_or(FieldValue::Null),
        DataType::LargeUtf8 => FieldValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| FieldValue::Integer(a.value(row) as i64))
            .unwrap_or(FieldValue::Null),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| FieldValue::Integer(a.value(row)))
            .unwrap_or(FieldValue::Null),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| FieldValue::Float(a.value(row) as f64))
            .unwrap_or(FieldValue::Null),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| FieldValue::Float(a.value(row)))
            .unwrap_or(FieldValue::Null),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| FieldValue::Bool(a.value(row)))
            .unwrap_or(FieldValue::Null),
        DataType::Timestamp(unit, _) => {
            let utc = match unit {
                TimeUnit::Second => any
                    .downcast_ref::<TimestampSecondArray>()
                    .and_then(|a| DateTime::from_timestamp(a.value(row), 0)),
                TimeUnit::Millisecond => any
                    .downcast_ref::<TimestampMillisecondArray>()
                    .and_then(|a| DateTime::from_timestamp_millis(a.value(row))),
                TimeUnit::Microsecond => any
                    .downcast_ref::<TimestampMicrosecondArray>()
                    .and_then(|a| DateTime::from_timestamp_micros(a.value(row))),
                TimeUnit::Nanosecond => any
                    .downcast_ref::<TimestampNanosecondArray>()
                    .map(|a| DateTime::from_timestamp_nanos(a.value(row))),
            };
            utc.map(FieldValue::Timestamp).unwrap_or(FieldValue::Null)
        }
        other => FieldValue::String(format!("{other:?}")),
    }
}
