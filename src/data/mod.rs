/// Data layer: core types, loading, classification, filtering and summaries.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet / .xlsx
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  types    │  classify columns once → TypeMap
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  apply predicates → filtered Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  summary  │  per-column stats + chart series
///   └──────────┘
/// ```

pub mod datetime;
pub mod filter;
pub mod loader;
pub mod model;
pub mod stats;
pub mod summary;
pub mod types;

pub use filter::{apply, FilterPredicate, FilterState, SELECT_ALL};
pub use model::{CellValue, Column, Dataset, StorageType};
pub use summary::{summarize, summarize_with, SummaryOptions, SummaryReport};
pub use types::{classify, ColumnType, TypeMap};
