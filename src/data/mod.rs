/// Data layer: sources, loading, filtering and summaries.
///
/// Architecture:
/// ```text
///  .json / .csv / .parquet / document API
///        │
///        ▼
///   ┌──────────┐
///   │  source   │  fetch raw documents (row id stripped)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  validate → Measurement, drop malformed, sort
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  cache    │  one Arc<Series> per session, replaced on refresh
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  inclusive time window → new Series
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  stats    │  min / max / mean
///   └──────────┘
/// ```

pub mod cache;
pub mod filter;
pub mod loader;
pub mod model;
pub mod source;
pub mod stats;
