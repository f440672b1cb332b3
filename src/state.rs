use chrono::{DateTime, Utc};

use crate::config::FieldNames;
use crate::data::cache::SeriesCache;
use crate::data::filter::filter;
use crate::data::loader::{LoadReport, SeriesLoader};
use crate::data::model::{Series, TimeRange};
use crate::data::stats::{summarize, SummaryStats};
use crate::error::InvalidRange;

// ---------------------------------------------------------------------------
// What the presentation layer should show
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// No record source chosen yet.
    NoSource,
    /// The source could not be reached; carries the reason.
    Unavailable(String),
    /// The source answered with no usable measurements.
    NoData,
    /// Data exists, but none inside the selected window.
    NoDataInRange { bounds: TimeRange, range: TimeRange },
    Ready {
        bounds: TimeRange,
        range: TimeRange,
        filtered: Series,
        stats: SummaryStats,
    },
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// The monitor state for one session, independent of rendering.
///
/// Every mutating call recomputes [`View`] by running
/// load (only if the cache is empty) → filter → summarize.
pub struct AppState {
    /// Series cache over the current source (None until a source is chosen).
    cache: Option<SeriesCache>,

    /// Field names handed to every new loader.
    fields: FieldNames,

    /// User-selected window. `None` means the full series.
    selection: Option<TimeRange>,

    view: View,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(fields: FieldNames) -> Self {
        Self {
            cache: None,
            fields,
            selection: None,
            view: View::NoSource,
            status_message: None,
        }
    }

    /// Switch to a different source and load it.
    pub fn replace_loader(&mut self, loader: SeriesLoader) {
        self.cache = Some(SeriesCache::new(loader.with_fields(self.fields.clone())));
        self.selection = None;
        self.update_view();
    }

    /// Explicit user refresh: drop the cached series, reload, and reset
    /// the window to the new bounds.
    pub fn refresh(&mut self) {
        if let Some(cache) = self.cache.as_mut() {
            cache.invalidate();
        }
        self.selection = None;
        self.update_view();
    }

    /// Select the window `[start, end]`.
    ///
    /// # Errors
    /// [`InvalidRange`] when `start > end`; the previous window is kept.
    pub fn set_range(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), InvalidRange> {
        let range = TimeRange::new(start, end).inspect_err(|e| {
            self.status_message = Some(e.to_string());
        })?;
        self.selection = Some(range);
        self.status_message = None;
        self.update_view();
        Ok(())
    }

    /// Go back to the full series.
    pub fn reset_range(&mut self) {
        self.selection = None;
        self.update_view();
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// Bounds of the loaded series, for the range controls.
    pub fn bounds(&self) -> Option<TimeRange> {
        match &self.view {
            View::Ready { bounds, .. } | View::NoDataInRange { bounds, .. } => Some(*bounds),
            _ => None,
        }
    }

    /// Window currently applied: the selection or the full bounds.
    pub fn range(&self) -> Option<TimeRange> {
        match &self.view {
            View::Ready { range, .. } | View::NoDataInRange { range, .. } => Some(*range),
            _ => None,
        }
    }

    pub fn last_report(&self) -> Option<LoadReport> {
        self.cache.as_ref().and_then(|c| c.last_report())
    }

    pub fn source_description(&self) -> Option<String> {
        self.cache.as_ref().map(|c| c.describe())
    }

    fn update_view(&mut self) {
        let Some(cache) = self.cache.as_mut() else {
            self.view = View::NoSource;
            return;
        };

        let series = match cache.get_or_load() {
            Ok(series) => {
                if matches!(self.view, View::Unavailable(_)) {
                    self.status_message = None;
                }
                series
            }
            Err(e) => {
                log::error!("Failed to load measurements: {e}");
                self.status_message = Some(e.to_string());
                self.view = View::Unavailable(e.to_string());
                return;
            }
        };

        let Some(bounds) = series.bounds() else {
            self.view = View::NoData;
            return;
        };

        let range = self.selection.unwrap_or(bounds);
        let filtered = filter(&series, &range);
        if filtered.is_empty() {
            self.view = View::NoDataInRange { bounds, range };
            return;
        }

        self.view = match summarize(&filtered) {
            Ok(stats) => View::Ready {
                bounds,
                range,
                filtered,
                stats,
            },
            Err(e) => {
                log::error!("Summary of a non-empty window failed: {e}");
                View::NoDataInRange { bounds, range }
            }
        };
    }
}
