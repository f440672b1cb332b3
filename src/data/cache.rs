use std::sync::Arc;

use super::loader::{LoadReport, SeriesLoader};
use super::model::Series;
use crate::error::LoadError;

/// Single-slot cache of the last successfully loaded series.
///
/// The slot is only refilled after [`SeriesCache::invalidate`]; a refill
/// replaces the whole series. A failed load leaves the slot empty.
pub struct SeriesCache {
    loader: SeriesLoader,
    slot: Option<Arc<Series>>,
    last_report: Option<LoadReport>,
}

impl SeriesCache {
    pub fn new(loader: SeriesLoader) -> Self {
        Self {
            loader,
            slot: None,
            last_report: None,
        }
    }

    /// Return the cached series, loading it first if the slot is empty.
    pub fn get_or_load(&mut self) -> Result<Arc<Series>, LoadError> {
        if let Some(series) = &self.slot {
            return Ok(Arc::clone(series));
        }
        let (series, report) = self.loader.load_with_report()?;
        let series = Arc::new(series);
        self.slot = Some(Arc::clone(&series));
        self.last_report = Some(report);
        Ok(series)
    }

    pub fn invalidate(&mut self) {
        self.slot = None;
        self.last_report = None;
    }

    /// Drop the cached series and load a fresh one.
    pub fn reload(&mut self) -> Result<Arc<Series>, LoadError> {
        self.invalidate();
        self.get_or_load()
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.is_some()
    }

    /// Counts from the load that filled the slot.
    pub fn last_report(&self) -> Option<LoadReport> {
        self.last_report
    }

    pub fn describe(&self) -> String {
        self.loader.describe()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::data::model::{FieldValue, RawRecord};
    use crate::data::source::RecordSource;
    use crate::error::SourceError;

    /// Serves one record per call made so far; fails while `down` is set.
    struct Counting {
        calls: Arc<AtomicUsize>,
        down: bool,
    }

    impl RecordSource for Counting {
        fn fetch_all(&self) -> Result<Vec<RawRecord>, SourceError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.down {
                return Err(SourceError::Request {
                    url: "counting".into(),
                    reason: "connection refused".into(),
                });
            }
            Ok((0..n)
                .map(|i| {
                    RawRecord::from([
                        ("timestamp".to_string(), FieldValue::Integer(i as i64 * 1000)),
                        ("Value".to_string(), FieldValue::Float(50.0)),
                    ])
                })
                .collect())
        }

        fn describe(&self) -> String {
            "counting".into()
        }
    }

    fn cache(down: bool) -> (SeriesCache, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = Counting {
            calls: Arc::clone(&calls),
            down,
        };
        (SeriesCache::new(SeriesLoader::new(Box::new(source))), calls)
    }

    #[test]
    fn second_get_reuses_the_slot() {
        let (mut cache, calls) = cache(false);
        let a = cache.get_or_load().unwrap();
        let b = cache.get_or_load().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reload_replaces_the_series() {
        let (mut cache, calls) = cache(false);
        assert_eq!(cache.get_or_load().unwrap().len(), 1);
        assert_eq!(cache.reload().unwrap().len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.last_report().map(|r| r.kept), Some(2));
    }

    #[test]
    fn failed_load_is_not_cached() {
        let (mut cache, calls) = cache(true);
        assert!(matches!(
            cache.get_or_load(),
            Err(LoadError::SourceUnavailable(_))
        ));
        assert!(!cache.is_loaded());
        assert!(cache.get_or_load().is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
