//! Year-by-year comparison of the modeled rate against the actual rate.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AmountOverflow, Totals};
use crate::models::ModeledRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateComparisonRow {
    pub fiscal_year: i32,
    pub modeled_rate: Decimal,
    pub actual_rate: Decimal,
    /// `modeled_rate - actual_rate`; negative when the model is below history.
    pub rate_difference: Decimal,
    pub actual_collection: Decimal,
    pub modeled_collection: Decimal,
    pub forgone_revenue: Decimal,
}

/// One row per fiscal year of `series`, ascending.
///
/// Rows for the same year are summed; the actual rate comes from the
/// first row of each year.
///
/// # Errors
///
/// Returns [`AmountOverflow`] if a yearly sum leaves the `Decimal` range.
pub fn rate_comparison(
    series: &[ModeledRecord],
    modeled_rate: Decimal,
) -> Result<Vec<RateComparisonRow>, AmountOverflow> {
    let mut by_year: BTreeMap<i32, (Decimal, Totals)> = BTreeMap::new();
    for record in series {
        by_year
            .entry(record.fiscal_year)
            .or_insert_with(|| (record.actual_rate, Totals::default()))
            .1
            .add(record)?;
    }

    let rows = by_year
        .into_iter()
        .map(|(fiscal_year, (actual_rate, totals))| RateComparisonRow {
            fiscal_year,
            modeled_rate,
            actual_rate,
            rate_difference: modeled_rate - actual_rate,
            actual_collection: totals.actual,
            modeled_collection: totals.modeled,
            forgone_revenue: totals.forgone,
        })
        .collect();

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn row(
        fiscal_year: i32,
        actual_rate: Decimal,
        actual_total: Decimal,
        forgone_revenue: Decimal,
    ) -> ModeledRecord {
        ModeledRecord {
            municipality: "Aurora".to_string(),
            tax_code: "INC".to_string(),
            fiscal_year,
            actual_total,
            actual_rate,
            modeled_collection: actual_total + forgone_revenue,
            forgone_revenue,
        }
    }

    #[test]
    fn one_row_per_year_in_ascending_order() {
        let series = vec![
            row(2025, dec!(6.47), dec!(100), dec!(54.56)),
            row(2020, dec!(5.75), dec!(100), dec!(73.91)),
        ];

        let rows = rate_comparison(&series, dec!(10.00)).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fiscal_year, 2020);
        assert_eq!(rows[0].rate_difference, dec!(4.25));
        assert_eq!(rows[0].modeled_collection, dec!(173.91));
        assert_eq!(rows[1].fiscal_year, 2025);
        assert_eq!(rows[1].rate_difference, dec!(3.53));
    }

    #[test]
    fn rate_below_history_has_negative_difference() {
        let series = vec![row(2020, dec!(5.75), dec!(100), dec!(0))];

        let rows = rate_comparison(&series, dec!(5.00)).unwrap();

        assert_eq!(rows[0].rate_difference, dec!(-0.75));
        assert_eq!(rows[0].forgone_revenue, dec!(0));
        assert_eq!(rows[0].modeled_collection, rows[0].actual_collection);
    }

    #[test]
    fn same_year_rows_are_summed() {
        let series = vec![
            row(2020, dec!(5.75), dec!(100), dec!(10)),
            row(2020, dec!(5.75), dec!(50), dec!(5)),
        ];

        let rows = rate_comparison(&series, dec!(6.00)).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].actual_collection, dec!(150));
        assert_eq!(rows[0].forgone_revenue, dec!(15));
    }

    #[test]
    fn empty_series_is_empty_table() {
        assert!(rate_comparison(&[], dec!(6.00)).unwrap().is_empty());
    }

    #[test]
    fn overflowing_year_is_an_error() {
        let series = vec![
            row(2020, dec!(5.75), Decimal::MAX, dec!(0)),
            row(2020, dec!(5.75), dec!(1), dec!(0)),
        ];

        assert_eq!(rate_comparison(&series, dec!(6.00)), Err(AmountOverflow));
    }
}
