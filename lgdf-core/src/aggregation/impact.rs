//! Forgone-revenue headline figures for a time series.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AmountOverflow, checked_sum};
use crate::models::ModeledRecord;

/// Forgone revenue over trailing windows of a series.
///
/// Windows shorter than requested sum whatever years exist; they are never
/// padded and never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactSummary {
    /// Most recent fiscal year in the series, `None` when the series is empty.
    pub latest_year: Option<i32>,
    pub latest_year_forgone: Decimal,
    /// Sum over the most recent three (or fewer) fiscal years.
    pub last_3_years_forgone: Decimal,
    /// Sum over the most recent five (or fewer) fiscal years.
    pub last_5_years_forgone: Decimal,
    /// Sum over every year in the series.
    pub total_forgone: Decimal,
    /// Number of distinct fiscal years in the series.
    pub years_available: usize,
}

/// Summarises forgone revenue for `series`.
///
/// Rows are grouped by fiscal year first, so input order does not matter
/// and a year appearing twice counts once in the windows.
///
/// # Errors
///
/// Returns [`AmountOverflow`] if a yearly or windowed sum leaves the
/// `Decimal` range.
///
/// # Example
///
/// ```
/// use rust_decimal::Decimal;
/// use rust_decimal_macros::dec;
/// use lgdf_core::ModeledRecord;
/// use lgdf_core::aggregation::impact_summary;
///
/// let row = |fiscal_year: i32, forgone_revenue: Decimal| ModeledRecord {
///     municipality: "Aurora".to_string(),
///     tax_code: "INC".to_string(),
///     fiscal_year,
///     actual_total: dec!(100),
///     actual_rate: dec!(6.00),
///     modeled_collection: dec!(100) + forgone_revenue,
///     forgone_revenue,
/// };
///
/// let summary = impact_summary(&[row(2024, dec!(1)), row(2025, dec!(2))]).unwrap();
///
/// assert_eq!(summary.latest_year, Some(2025));
/// assert_eq!(summary.last_3_years_forgone, dec!(3));
/// assert_eq!(summary.last_5_years_forgone, dec!(3));
/// ```
pub fn impact_summary(series: &[ModeledRecord]) -> Result<ImpactSummary, AmountOverflow> {
    let mut by_year: BTreeMap<i32, Decimal> = BTreeMap::new();
    for record in series {
        let forgone = by_year.entry(record.fiscal_year).or_default();
        *forgone = checked_sum(*forgone, record.forgone_revenue)?;
    }

    let (latest_year, latest_year_forgone) = match by_year.last_key_value() {
        Some((year, forgone)) => (Some(*year), *forgone),
        None => (None, Decimal::ZERO),
    };

    Ok(ImpactSummary {
        latest_year,
        latest_year_forgone,
        last_3_years_forgone: trailing_sum(&by_year, 3)?,
        last_5_years_forgone: trailing_sum(&by_year, 5)?,
        total_forgone: trailing_sum(&by_year, by_year.len())?,
        years_available: by_year.len(),
    })
}

fn trailing_sum(
    by_year: &BTreeMap<i32, Decimal>,
    window: usize,
) -> Result<Decimal, AmountOverflow> {
    by_year
        .values()
        .rev()
        .take(window)
        .try_fold(Decimal::ZERO, |total, forgone| checked_sum(total, *forgone))
}
