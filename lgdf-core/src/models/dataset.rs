use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::DisbursementRecord;

/// Informational counts produced while loading a dataset.
///
/// Row-level parse failures are reported here rather than as errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Data rows read from the source (header excluded).
    pub rows_read: usize,
    /// Rows dropped because `fy` or `fy_total` was missing, unparseable or negative.
    pub rows_dropped: usize,
    /// Rows skipped because their tax code was not the configured category.
    pub rows_other_category: usize,
    /// Rows kept in the dataset.
    pub rows_retained: usize,
    /// Distinct municipalities among the retained rows.
    pub municipalities: usize,
    /// `(municipality, fiscal_year)` pairs that occur more than once.
    pub duplicate_pairs: usize,
}

/// Inclusive fiscal-year bounds observed in a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearBounds {
    pub min: i32,
    pub max: i32,
}

impl YearBounds {
    pub fn full_range(&self) -> RangeInclusive<i32> {
        self.min..=self.max
    }

    /// Pulls `year` into the observed bounds.
    pub fn clamp(
        &self,
        year: i32,
    ) -> i32 {
        year.clamp(self.min, self.max)
    }

    pub fn contains(
        &self,
        year: i32,
    ) -> bool {
        (self.min..=self.max).contains(&year)
    }
}

/// The validated, sorted record set for one tax category.
///
/// Immutable once built; shared read-only between sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    tax_category: String,
    records: Vec<DisbursementRecord>,
    report: LoadReport,
}

impl Dataset {
    /// Wraps already-validated records. Records are expected in
    /// `(municipality, fiscal_year)` order.
    pub fn new(
        tax_category: impl Into<String>,
        records: Vec<DisbursementRecord>,
        report: LoadReport,
    ) -> Self {
        Self {
            tax_category: tax_category.into(),
            records,
            report,
        }
    }

    pub fn tax_category(&self) -> &str {
        &self.tax_category
    }

    pub fn records(&self) -> &[DisbursementRecord] {
        &self.records
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct municipality names, sorted ascending.
    pub fn municipalities(&self) -> Vec<&str> {
        let names: BTreeSet<&str> = self
            .records
            .iter()
            .map(|r| r.municipality.as_str())
            .collect();
        names.into_iter().collect()
    }

    /// Distinct fiscal years, sorted ascending.
    pub fn fiscal_years(&self) -> Vec<i32> {
        let years: BTreeSet<i32> = self.records.iter().map(|r| r.fiscal_year).collect();
        years.into_iter().collect()
    }

    /// Observed minimum and maximum fiscal year, or `None` for an empty dataset.
    pub fn year_bounds(&self) -> Option<YearBounds> {
        let min = self.records.iter().map(|r| r.fiscal_year).min()?;
        let max = self.records.iter().map(|r| r.fiscal_year).max()?;
        Some(YearBounds { min, max })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn record(
        municipality: &str,
        fiscal_year: i32,
    ) -> DisbursementRecord {
        DisbursementRecord {
            municipality: municipality.to_string(),
            tax_code: "INC".to_string(),
            fiscal_year,
            actual_total: dec!(100),
        }
    }

    fn sample() -> Dataset {
        Dataset::new(
            "INC",
            vec![
                record("Aurora", 2013),
                record("Aurora", 2014),
                record("Chicago", 2012),
                record("Chicago", 2014),
            ],
            LoadReport::default(),
        )
    }

    #[test]
    fn municipalities_are_distinct_and_sorted() {
        assert_eq!(sample().municipalities(), vec!["Aurora", "Chicago"]);
    }

    #[test]
    fn fiscal_years_are_distinct_and_sorted() {
        assert_eq!(sample().fiscal_years(), vec![2012, 2013, 2014]);
    }

    #[test]
    fn year_bounds_follow_observed_data() {
        let bounds = sample().year_bounds().unwrap();

        assert_eq!(bounds, YearBounds { min: 2012, max: 2014 });
        assert_eq!(bounds.full_range(), 2012..=2014);
        assert_eq!(bounds.clamp(2030), 2014);
        assert_eq!(bounds.clamp(1999), 2012);
        assert!(bounds.contains(2013));
    }

    #[test]
    fn empty_dataset_has_no_bounds() {
        let dataset = Dataset::new("INC", Vec::new(), LoadReport::default());

        assert!(dataset.is_empty());
        assert_eq!(dataset.year_bounds(), None);
        assert!(dataset.municipalities().is_empty());
    }
}
