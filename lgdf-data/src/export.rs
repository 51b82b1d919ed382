//! CSV export of dashboard row sets.
//!
//! Every export has a header row and no index column. Monetary values are
//! written as plain numbers at full precision, except where a row type's
//! column contract says otherwise ([`BaseSnapshotRow`]).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use lgdf_core::aggregation::{RankedMunicipality, RateComparisonRow};
use lgdf_core::calculations::common::round_whole_units_even;
use lgdf_core::{DisbursementRecord, ModeledRecord};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

/// Errors that can occur while writing an export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot create export file '{}': {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error while writing export: {0}")]
    Io(#[from] std::io::Error),
}

/// A row type with a fixed column contract.
///
/// `HEADERS` must list the serialized fields in declaration order; it is
/// written even when there are no rows.
pub trait ExportRow: Serialize {
    const HEADERS: &'static [&'static str];
}

/// Base chart view: one municipality over a year range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaseSeriesRow {
    pub municipality: String,
    pub fiscal_year: i32,
    pub tax_code: String,
    pub actual_total: Decimal,
}

impl ExportRow for BaseSeriesRow {
    const HEADERS: &'static [&'static str] =
        &["Municipality", "Fiscal Year", "Tax Code", "Actual Total"];
}

impl From<&DisbursementRecord> for BaseSeriesRow {
    fn from(record: &DisbursementRecord) -> Self {
        Self {
            municipality: record.municipality.clone(),
            fiscal_year: record.fiscal_year,
            tax_code: record.tax_code.clone(),
            actual_total: record.actual_total,
        }
    }
}

/// Base fiscal-year table. Totals are rounded to whole units, ties to even.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaseSnapshotRow {
    pub municipality: String,
    pub tax_code: String,
    pub actual_total: Decimal,
}

impl ExportRow for BaseSnapshotRow {
    const HEADERS: &'static [&'static str] = &["Municipality", "Tax Code", "Actual Total"];
}

impl From<&DisbursementRecord> for BaseSnapshotRow {
    fn from(record: &DisbursementRecord) -> Self {
        Self {
            municipality: record.municipality.clone(),
            tax_code: record.tax_code.clone(),
            actual_total: round_whole_units_even(record.actual_total),
        }
    }
}

/// Modeling view: actual versus modeled collection per municipality-year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeledRow {
    pub municipality: String,
    pub fiscal_year: i32,
    pub actual_rate: Decimal,
    pub actual_total: Decimal,
    pub modeled_collection: Decimal,
    pub forgone_revenue: Decimal,
}

impl ExportRow for ModeledRow {
    const HEADERS: &'static [&'static str] = &[
        "Municipality",
        "Fiscal Year",
        "Actual Rate",
        "Actual Total",
        "Modeled Collection",
        "Forgone Revenue",
    ];
}

impl From<&ModeledRecord> for ModeledRow {
    fn from(record: &ModeledRecord) -> Self {
        Self {
            municipality: record.municipality.clone(),
            fiscal_year: record.fiscal_year,
            actual_rate: record.actual_rate,
            actual_total: record.actual_total,
            modeled_collection: record.modeled_collection,
            forgone_revenue: record.forgone_revenue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingRow {
    pub rank: usize,
    pub municipality: String,
    pub total_actual: Decimal,
    pub total_modeled: Decimal,
    pub total_forgone: Decimal,
}

impl ExportRow for RankingRow {
    const HEADERS: &'static [&'static str] = &[
        "Rank",
        "Municipality",
        "Total Actual",
        "Total Modeled",
        "Total Forgone",
    ];
}

impl From<&RankedMunicipality> for RankingRow {
    fn from(row: &RankedMunicipality) -> Self {
        Self {
            rank: row.rank,
            municipality: row.municipality.clone(),
            total_actual: row.total_actual,
            total_modeled: row.total_modeled,
            total_forgone: row.total_forgone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateComparisonExportRow {
    pub fiscal_year: i32,
    pub modeled_rate: Decimal,
    pub actual_rate: Decimal,
    pub rate_difference: Decimal,
    pub actual_collection: Decimal,
    pub modeled_collection: Decimal,
    pub forgone_revenue: Decimal,
}

impl ExportRow for RateComparisonExportRow {
    const HEADERS: &'static [&'static str] = &[
        "Fiscal Year",
        "Modeled Rate",
        "Actual Rate",
        "Rate Difference",
        "Actual Collection",
        "Modeled Collection",
        "Forgone Revenue",
    ];
}

impl From<&RateComparisonRow> for RateComparisonExportRow {
    fn from(row: &RateComparisonRow) -> Self {
        Self {
            fiscal_year: row.fiscal_year,
            modeled_rate: row.modeled_rate,
            actual_rate: row.actual_rate,
            rate_difference: row.rate_difference,
            actual_collection: row.actual_collection,
            modeled_collection: row.modeled_collection,
            forgone_revenue: row.forgone_revenue,
        }
    }
}

/// Converts core rows into export rows.
pub fn to_rows<'a, S, T>(source: &'a [S]) -> Vec<T>
where
    T: From<&'a S>,
{
    source.iter().map(T::from).collect()
}

/// Writes `rows` as CSV to `writer`, header first.
pub fn write_csv<W, T>(
    writer: W,
    rows: &[T],
) -> Result<(), ExportError>
where
    W: Write,
    T: ExportRow,
{
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(T::HEADERS)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Renders `rows` as an in-memory CSV document.
pub fn to_csv_string<T: ExportRow>(rows: &[T]) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, rows)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Writes `rows` to a new file at `path`, replacing any existing file.
pub fn export_to_path<T: ExportRow>(
    path: &Path,
    rows: &[T],
) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    write_csv(BufWriter::new(file), rows)?;

    info!(path = %path.display(), rows = rows.len(), "wrote CSV export");
    Ok(())
}
