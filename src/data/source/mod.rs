//! Record sources: where raw documents come from.
//!
//! Every source hands back whole documents with the internal row id
//! stripped. Ordering is unspecified; the loader sorts.

pub mod file;
pub mod remote;

use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::SourceConfig;
use crate::error::SourceError;

use super::model::RawRecord;

pub use file::{CsvFileSource, JsonFileSource, ParquetFileSource};
pub use remote::DocumentApiSource;

/// A read-only collection of raw measurement documents.
pub trait RecordSource: Send + Sync {
    /// Fetch every document in the collection.
    fn fetch_all(&self) -> Result<Vec<RawRecord>, SourceError>;

    /// Human-readable origin for logs and the status bar.
    fn describe(&self) -> String;
}

impl<S: RecordSource + ?Sized> RecordSource for Arc<S> {
    fn fetch_all(&self) -> Result<Vec<RawRecord>, SourceError> {
        (**self).fetch_all()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<S: RecordSource + ?Sized> RecordSource for Box<S> {
    fn fetch_all(&self) -> Result<Vec<RawRecord>, SourceError> {
        (**self).fetch_all()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Build the configured source, wrapped in a [`TimedSource`].
pub fn create_source(
    config: &SourceConfig,
    timeout: Duration,
) -> Result<Box<dyn RecordSource>, SourceError> {
    let inner: Box<dyn RecordSource> = match config {
        SourceConfig::Json { path } => Box::new(JsonFileSource::new(path)),
        SourceConfig::Csv { path } => Box::new(CsvFileSource::new(path)),
        SourceConfig::Parquet { path } => Box::new(ParquetFileSource::new(path)),
        SourceConfig::DocumentApi(api) => Box::new(DocumentApiSource::new(api, timeout)?),
    };
    Ok(Box::new(TimedSource::new(inner, timeout)))
}

/// Pick a file source by extension, wrapped in a [`TimedSource`].
///
/// Supported formats:
/// * `.parquet` / `.pq`
/// * `.json`
/// * `.csv`
pub fn open_path(path: &Path, timeout: Duration) -> Result<Box<dyn RecordSource>, SourceError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let inner: Box<dyn RecordSource> = match ext.as_str() {
        "parquet" | "pq" => Box::new(ParquetFileSource::new(path)),
        "json" => Box::new(JsonFileSource::new(path)),
        "csv" => Box::new(CsvFileSource::new(path)),
        other => {
            return Err(SourceError::Unsupported(format!(
                "file extension .{other} ({})",
                path.display()
            )))
        }
    };
    Ok(Box::new(TimedSource::new(inner, timeout)))
}

// ---------------------------------------------------------------------------
// Timeout guard
// ---------------------------------------------------------------------------

/// Runs the inner fetch on a worker thread and gives up after `timeout`.
///
/// An abandoned fetch keeps running on its detached thread; its result is
/// discarded.
pub struct TimedSource {
    inner: Arc<dyn RecordSource>,
    timeout: Duration,
}

impl TimedSource {
    pub fn new(inner: impl RecordSource + 'static, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            timeout,
        }
    }
}

impl RecordSource for TimedSource {
    fn fetch_all(&self) -> Result<Vec<RawRecord>, SourceError> {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        thread::Builder::new()
            .name("record-fetch".into())
            .spawn(move || {
                // Receiver is gone after a timeout.
                let _ = tx.send(inner.fetch_all());
            })
            .map_err(|e| SourceError::Request {
                url: self.inner.describe(),
                reason: format!("could not start fetch worker: {e}"),
            })?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "Fetch from {} abandoned after {:?}",
                    self.inner.describe(),
                    self.timeout
                );
                Err(SourceError::Timeout(self.timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(SourceError::Request {
                url: self.inner.describe(),
                reason: "fetch worker exited without a result".into(),
            }),
        }
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }
}
