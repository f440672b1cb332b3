pub mod config;
pub mod data;
pub mod error;
pub mod state;

// Re-exports for library users
pub use config::{Config, DocumentApiConfig, FieldNames, SourceConfig};
pub use data::cache::SeriesCache;
pub use data::filter::{filter, filter_between};
pub use data::loader::{LoadReport, SeriesLoader};
pub use data::model::{FieldValue, Measurement, RawRecord, Series, TimeRange};
pub use data::source::{create_source, open_path, RecordSource, TimedSource};
pub use data::stats::{summarize, SummaryStats};
pub use error::{EmptyInput, InvalidRange, LoadError, MalformedRecord, SourceError};
pub use state::{AppState, View};
