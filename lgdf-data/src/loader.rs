//! Loader for the municipal disbursement CSV.
//!
//! ## CSV Format
//!
//! Headers are matched by name after trimming and lowercasing, so
//! ` FY_Total ` and `fy_total` are the same column. Column order does not
//! matter and extra columns are ignored.
//!
//! | Column             | Type    | Notes                                         |
//! |--------------------|---------|-----------------------------------------------|
//! | `fy`               | number  | Fiscal year; fractional values are truncated  |
//! | `fy_total`         | decimal | Amount disbursed; plain or scientific notation |
//! | `local_government` | string  | Municipality name, trimmed                    |
//! | `tax`              | string  | Tax category code, trimmed and uppercased     |
//!
//! Rows with a missing or non-numeric `fy` / `fy_total`, or a negative
//! `fy_total`, are dropped and counted in the [`LoadReport`]. Rows of another
//! tax category are skipped. Retained rows are sorted by
//! `(local_government, fy)`.
//!
//! ### Example
//!
//! ```csv
//! fy,fy_total,local_government,tax
//! 2020,1000000,Chicago,INC
//! 2021,1100000.50,Chicago,INC
//! ```

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use lgdf_core::{Dataset, DisbursementRecord, LoadReport};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Columns every dataset must provide, in normalized form.
pub const REQUIRED_COLUMNS: [&str; 4] = ["fy", "fy_total", "local_government", "tax"];

/// Errors that stop a dataset from loading at all.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source file is missing or cannot be opened.
    #[error("dataset '{}' is unavailable: {source}", path.display())]
    DataUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Required columns are absent after header normalization.
    #[error("dataset is missing required column(s): {}", missing.join(", "))]
    MalformedDataset { missing: Vec<String> },

    /// The file is not readable as CSV (bad quoting, invalid UTF-8, ...).
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
}

/// Positions of the required columns within a CSV row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnIndex {
    fy: usize,
    fy_total: usize,
    local_government: usize,
    tax: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self, LoadError> {
        let normalized: Vec<String> = headers.iter().map(normalize_header).collect();
        let position = |name: &str| normalized.iter().position(|h| h == name);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| position(name).is_none())
            .map(|name| name.to_string())
            .collect();

        match (
            position("fy"),
            position("fy_total"),
            position("local_government"),
            position("tax"),
        ) {
            (Some(fy), Some(fy_total), Some(local_government), Some(tax)) => Ok(Self {
                fy,
                fy_total,
                local_government,
                tax,
            }),
            _ => Err(LoadError::MalformedDataset { missing }),
        }
    }
}

fn normalize_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Parses a numeric cell, accepting plain and scientific notation.
/// Blank or non-numeric cells are `None`.
fn parse_number(raw: &str) -> Option<Decimal> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    value
        .parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(value).ok())
}

fn parse_fiscal_year(raw: &str) -> Option<i32> {
    parse_number(raw)?.trunc().to_i32()
}

fn parse_total(raw: &str) -> Option<Decimal> {
    parse_number(raw).filter(|total| !total.is_sign_negative() || total.is_zero())
}

/// Reads disbursement CSVs into a [`Dataset`] for one tax category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLoader {
    tax_category: String,
}

impl DatasetLoader {
    /// Creates a loader that keeps rows of `tax_category` (compared after
    /// trimming and uppercasing).
    pub fn new(tax_category: &str) -> Self {
        Self {
            tax_category: tax_category.trim().to_uppercase(),
        }
    }

    pub fn tax_category(&self) -> &str {
        &self.tax_category
    }

    /// Loads the dataset at `path`.
    ///
    /// # Errors
    ///
    /// * [`LoadError::DataUnavailable`] if the file cannot be opened.
    /// * Anything [`DatasetLoader::parse`] returns.
    pub fn load(
        &self,
        path: &Path,
    ) -> Result<Dataset, LoadError> {
        let file = File::open(path).map_err(|source| LoadError::DataUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), "loading disbursement dataset");
        self.parse(file)
    }

    /// Parses CSV from any reader. The same bytes always produce the same
    /// dataset.
    ///
    /// # Errors
    ///
    /// * [`LoadError::MalformedDataset`] if a required column is missing.
    /// * [`LoadError::Csv`] if the input is not valid CSV.
    pub fn parse<R: Read>(
        &self,
        reader: R,
    ) -> Result<Dataset, LoadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // short rows become missing cells, not errors
            .from_reader(reader);

        let columns = ColumnIndex::from_headers(csv_reader.headers()?)?;

        let mut report = LoadReport::default();
        let mut records = Vec::new();

        for (idx, result) in csv_reader.records().enumerate() {
            let row = result?;
            let line = idx + 2; // header is line 1
            report.rows_read += 1;

            let cell = |col: usize| row.get(col).unwrap_or("");

            let Some(fiscal_year) = parse_fiscal_year(cell(columns.fy)) else {
                debug!(line, value = cell(columns.fy), "dropping row: unusable fy");
                report.rows_dropped += 1;
                continue;
            };

            let Some(actual_total) = parse_total(cell(columns.fy_total)) else {
                debug!(line, value = cell(columns.fy_total), "dropping row: unusable fy_total");
                report.rows_dropped += 1;
                continue;
            };

            let tax_code = cell(columns.tax).trim().to_uppercase();
            if tax_code != self.tax_category {
                report.rows_other_category += 1;
                continue;
            }

            records.push(DisbursementRecord {
                municipality: cell(columns.local_government).trim().to_string(),
                tax_code,
                fiscal_year,
                actual_total,
            });
        }

        records.sort_by(|a, b| {
            a.municipality
                .cmp(&b.municipality)
                .then(a.fiscal_year.cmp(&b.fiscal_year))
        });

        report.rows_retained = records.len();
        report.municipalities = records
            .chunk_by(|a, b| a.municipality == b.municipality)
            .count();
        report.duplicate_pairs = records
            .chunk_by(|a, b| a.municipality == b.municipality && a.fiscal_year == b.fiscal_year)
            .filter(|group| group.len() > 1)
            .count();

        if report.rows_dropped > 0 {
            warn!(
                dropped = report.rows_dropped,
                "dropped rows with missing or non-numeric fy / fy_total"
            );
        }
        if report.duplicate_pairs > 0 {
            warn!(
                duplicates = report.duplicate_pairs,
                "dataset has repeated (municipality, fiscal year) pairs; they are kept as separate rows"
            );
        }
        info!(
            rows = report.rows_retained,
            municipalities = report.municipalities,
            tax_category = %self.tax_category,
            "dataset loaded"
        );

        Ok(Dataset::new(self.tax_category.clone(), records, report))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const MESSY_CSV: &str = "\
 FY , FY_Total,Local_Government , Tax,extra
2020,1000000,Chicago,INC,x
2021,1100000.50, Chicago ,inc,
2020,250000,Aurora,INC,
2021,260000,Aurora,INC,
2021,abc,Aurora,INC,
,5000,Aurora,INC,
2020,9999,Chicago,PPRT,
2019.0,240000,Aurora,INC,
2025,1e6,Elgin,INC
";

    fn load(csv: &str) -> Result<Dataset, LoadError> {
        DatasetLoader::new("INC").parse(csv.as_bytes())
    }

    fn keys(dataset: &Dataset) -> Vec<(&str, i32)> {
        dataset
            .records()
            .iter()
            .map(|r| (r.municipality.as_str(), r.fiscal_year))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Header handling
    // -----------------------------------------------------------------------

    #[test]
    fn test_headers_are_matched_case_and_whitespace_insensitively() {
        let dataset = load(MESSY_CSV).expect("messy headers should load");

        assert_eq!(dataset.len(), 6);
    }

    #[test]
    fn test_missing_columns_are_all_reported() {
        let err = load("fy,local_government\n2020,Chicago\n").unwrap_err();

        match err {
            LoadError::MalformedDataset { missing } => {
                assert_eq!(missing, vec!["fy_total".to_string(), "tax".to_string()]);
            }
            other => panic!("expected MalformedDataset, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_input_is_malformed() {
        let err = load("").unwrap_err();

        assert!(matches!(err, LoadError::MalformedDataset { .. }));
    }

    #[test]
    fn test_column_order_does_not_matter() {
        let dataset = load("tax,local_government,fy_total,fy\nINC,Chicago,12.5,2020\n").unwrap();

        assert_eq!(dataset.records()[0].actual_total, dec!(12.5));
        assert_eq!(dataset.records()[0].fiscal_year, 2020);
    }

    #[test]
    fn test_byte_order_mark_is_ignored() {
        let dataset = load("\u{feff}fy,fy_total,local_government,tax\n2020,1,Chicago,INC\n").unwrap();

        assert_eq!(dataset.len(), 1);
    }

    // -----------------------------------------------------------------------
    // Row normalization
    // -----------------------------------------------------------------------

    #[test]
    fn test_rows_are_sorted_by_municipality_then_year() {
        let dataset = load(MESSY_CSV).unwrap();

        assert_eq!(
            keys(&dataset),
            vec![
                ("Aurora", 2019),
                ("Aurora", 2020),
                ("Aurora", 2021),
                ("Chicago", 2020),
                ("Chicago", 2021),
                ("Elgin", 2025),
            ]
        );
    }

    #[test]
    fn test_values_are_trimmed_and_normalized() {
        let dataset = load(MESSY_CSV).unwrap();
        let chicago_2021 = &dataset.records()[4];

        assert_eq!(chicago_2021.municipality, "Chicago");
        assert_eq!(chicago_2021.tax_code, "INC");
        assert_eq!(chicago_2021.actual_total, dec!(1100000.50));
    }

    #[test]
    fn test_fractional_year_is_truncated() {
        let dataset = load("fy,fy_total,local_government,tax\n2019.9,1,Aurora,INC\n").unwrap();

        assert_eq!(dataset.records()[0].fiscal_year, 2019);
    }

    #[test]
    fn test_scientific_notation_total_is_parsed() {
        let dataset = load(MESSY_CSV).unwrap();
        let elgin = dataset.records().last().unwrap();

        assert_eq!(elgin.actual_total, dec!(1000000));
    }

    #[test]
    fn test_case_is_preserved_in_names() {
        let dataset = load("fy,fy_total,local_government,tax\n2020,1,  McHenry ,INC\n").unwrap();

        assert_eq!(dataset.records()[0].municipality, "McHenry");
    }

    // -----------------------------------------------------------------------
    // Load report
    // -----------------------------------------------------------------------

    #[test]
    fn test_report_counts_dropped_and_skipped_rows() {
        let dataset = load(MESSY_CSV).unwrap();

        assert_eq!(
            dataset.report(),
            &LoadReport {
                rows_read: 9,
                rows_dropped: 2,
                rows_other_category: 1,
                rows_retained: 6,
                municipalities: 3,
                duplicate_pairs: 0,
            }
        );
    }

    #[test]
    fn test_negative_total_is_dropped() {
        let dataset = load("fy,fy_total,local_government,tax\n2020,-5,Aurora,INC\n2020,0,Elgin,INC\n")
            .unwrap();

        assert_eq!(dataset.report().rows_dropped, 1);
        assert_eq!(keys(&dataset), vec![("Elgin", 2020)]);
    }

    #[test]
    fn test_duplicate_pairs_are_kept_and_counted() {
        let csv = "\
fy,fy_total,local_government,tax
2020,1,Aurora,INC
2020,2,Aurora,INC
2021,3,Aurora,INC
";
        let dataset = load(csv).unwrap();

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.report().duplicate_pairs, 1);
        // Stable sort keeps file order within the duplicate pair.
        assert_eq!(dataset.records()[0].actual_total, dec!(1));
        assert_eq!(dataset.records()[1].actual_total, dec!(2));
    }

    #[test]
    fn test_other_category_loader() {
        let dataset = DatasetLoader::new(" pprt ").parse(MESSY_CSV.as_bytes()).unwrap();

        assert_eq!(dataset.tax_category(), "PPRT");
        assert_eq!(keys(&dataset), vec![("Chicago", 2020)]);
    }

    #[test]
    fn test_header_only_input_is_an_empty_dataset() {
        let dataset = load("fy,fy_total,local_government,tax\n").unwrap();

        assert!(dataset.is_empty());
        assert_eq!(dataset.report(), &LoadReport::default());
    }

    #[test]
    fn test_parse_is_deterministic() {
        let first = load(MESSY_CSV).unwrap();
        let second = load(MESSY_CSV).unwrap();

        assert_eq!(first, second);
    }

    // -----------------------------------------------------------------------
    // Number parsing
    // -----------------------------------------------------------------------

    #[test]
    fn test_parse_number_variants() {
        assert_eq!(parse_number(" 12.50 "), Some(dec!(12.50)));
        assert_eq!(parse_number("1.5e3"), Some(dec!(1500)));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
    }

    #[test]
    fn test_parse_fiscal_year_rejects_out_of_range() {
        assert_eq!(parse_fiscal_year("2020"), Some(2020));
        assert_eq!(parse_fiscal_year("99999999999"), None);
    }
}
