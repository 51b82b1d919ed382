//! Dataset I/O for the LGDF dashboard: CSV loading, per-path caching and
//! CSV export of view rows.

pub mod cache;
pub mod export;
pub mod loader;

pub use cache::DatasetCache;
pub use export::{
    BaseSeriesRow, BaseSnapshotRow, ExportError, ExportRow, ModeledRow, RankingRow,
    RateComparisonExportRow, export_to_path, to_csv_string, to_rows, write_csv,
};
pub use loader::{DatasetLoader, LoadError, REQUIRED_COLUMNS};
