//! Per-municipality time series, and the per-year "All Municipalities" roll-up.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AmountOverflow, SeriesError, Totals, checked_sum};
use crate::models::{DisbursementRecord, DisbursementRow, ModeledRecord, RateTable};

/// Label carried by the synthetic per-year roll-up records.
pub const ALL_MUNICIPALITIES: &str = "All Municipalities";

/// Municipality selector for time-series queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Municipality {
    /// Sum every municipality per fiscal year.
    All,
    /// Exact, case-sensitive name match.
    Named(String),
}

impl Municipality {
    /// Parses a user selection. `all` (any case) or the roll-up label select
    /// [`Municipality::All`]; anything else is a name, trimmed.
    pub fn parse(selection: &str) -> Self {
        let selection = selection.trim();
        if selection.eq_ignore_ascii_case("all") || selection == ALL_MUNICIPALITIES {
            Self::All
        } else {
            Self::Named(selection.to_string())
        }
    }

    /// Like [`Municipality::parse`], except that an exact match in `known`
    /// stays a name even when it reads as `all`.
    pub fn resolve(
        selection: &str,
        known: &[&str],
    ) -> Self {
        let selection = selection.trim();
        if known.contains(&selection) {
            Self::Named(selection.to_string())
        } else {
            Self::parse(selection)
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::All => ALL_MUNICIPALITIES,
            Self::Named(name) => name,
        }
    }
}

impl fmt::Display for Municipality {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Modeled time series for one municipality, or the all-municipality roll-up,
/// restricted to the inclusive `years` range and ordered by fiscal year
/// ascending (chart order).
///
/// For [`Municipality::All`], the three monetary fields are summed per year
/// and `actual_rate` is looked up again in `rates` rather than averaged.
///
/// # Errors
///
/// * [`SeriesError::UnknownRate`] if a rolled-up year has no rate.
/// * [`SeriesError::Overflow`] if a yearly sum leaves the `Decimal` range.
pub fn municipality_series(
    records: &[ModeledRecord],
    selection: &Municipality,
    years: &RangeInclusive<i32>,
    rates: &RateTable,
) -> Result<Vec<ModeledRecord>, SeriesError> {
    let series = match selection {
        Municipality::Named(name) => {
            let mut rows: Vec<ModeledRecord> = records
                .iter()
                .filter(|r| r.municipality == *name && years.contains(&r.fiscal_year))
                .cloned()
                .collect();
            rows.sort_by_key(|r| r.fiscal_year);
            rows
        }
        Municipality::All => roll_up_by_year(records, years, rates)?,
    };

    debug!(
        selection = %selection,
        start = years.start(),
        end = years.end(),
        rows = series.len(),
        "built municipality series"
    );

    Ok(series)
}

fn roll_up_by_year(
    records: &[ModeledRecord],
    years: &RangeInclusive<i32>,
    rates: &RateTable,
) -> Result<Vec<ModeledRecord>, SeriesError> {
    let mut by_year: BTreeMap<i32, (Totals, &str)> = BTreeMap::new();
    for record in records.iter().filter(|r| years.contains(&r.fiscal_year)) {
        by_year
            .entry(record.fiscal_year)
            .or_insert_with(|| (Totals::default(), record.tax_code.as_str()))
            .0
            .add(record)?;
    }

    by_year
        .into_iter()
        .map(|(fiscal_year, (totals, tax_code))| {
            Ok(ModeledRecord {
                municipality: ALL_MUNICIPALITIES.to_string(),
                tax_code: tax_code.to_string(),
                fiscal_year,
                actual_total: totals.actual,
                actual_rate: rates.rate_for(fiscal_year)?,
                modeled_collection: totals.modeled,
                forgone_revenue: totals.forgone,
            })
        })
        .collect()
}

/// Unmodeled time series, ascending by fiscal year.
///
/// For [`Municipality::All`], `actual_total` is summed per year under the
/// roll-up label.
///
/// # Errors
///
/// Returns [`AmountOverflow`] if a yearly sum leaves the `Decimal` range.
pub fn base_series(
    records: &[DisbursementRecord],
    selection: &Municipality,
    years: &RangeInclusive<i32>,
) -> Result<Vec<DisbursementRecord>, AmountOverflow> {
    let in_range = records.iter().filter(|r| years.contains(&r.fiscal_year));

    match selection {
        Municipality::Named(name) => {
            let mut rows: Vec<DisbursementRecord> = in_range
                .filter(|r| r.municipality == *name)
                .cloned()
                .collect();
            rows.sort_by_key(|r| r.fiscal_year);
            Ok(rows)
        }
        Municipality::All => {
            let mut by_year: BTreeMap<i32, DisbursementRecord> = BTreeMap::new();
            for record in in_range {
                let total = by_year
                    .entry(record.fiscal_year)
                    .or_insert_with(|| DisbursementRecord {
                        municipality: ALL_MUNICIPALITIES.to_string(),
                        tax_code: record.tax_code.clone(),
                        fiscal_year: record.fiscal_year,
                        actual_total: Decimal::ZERO,
                    });
                total.actual_total = checked_sum(total.actual_total, record.actual_total)?;
            }
            Ok(by_year.into_values().collect())
        }
    }
}

/// Copy of `series` ordered by fiscal year descending (table order).
pub fn descending<T>(series: &[T]) -> Vec<T>
where
    T: DisbursementRow + Clone,
{
    let mut rows = series.to_vec();
    rows.sort_by_key(|r| std::cmp::Reverse(r.fiscal_year()));
    rows
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{RateEntry, UnknownRate};

    fn rates() -> RateTable {
        RateTable::from_entries([
            RateEntry { fiscal_year: 2019, rate: dec!(5.45) },
            RateEntry { fiscal_year: 2020, rate: dec!(5.75) },
            RateEntry { fiscal_year: 2021, rate: dec!(5.75) },
        ])
        .unwrap()
    }

    fn modeled(
        municipality: &str,
        fiscal_year: i32,
        actual: Decimal,
        forgone: Decimal,
    ) -> ModeledRecord {
        ModeledRecord {
            municipality: municipality.to_string(),
            tax_code: "INC".to_string(),
            fiscal_year,
            actual_total: actual,
            actual_rate: dec!(5.75),
            modeled_collection: actual + forgone,
            forgone_revenue: forgone,
        }
    }

    fn sample() -> Vec<ModeledRecord> {
        vec![
            modeled("Aurora", 2019, dec!(100), dec!(10)),
            modeled("Aurora", 2020, dec!(110), dec!(11)),
            modeled("Aurora", 2021, dec!(120), dec!(12)),
            modeled("Chicago", 2019, dec!(1000), dec!(100)),
            modeled("Chicago", 2020, dec!(1100), dec!(110)),
            modeled("Chicago", 2021, dec!(1200), dec!(120)),
        ]
    }

    #[test]
    fn named_series_filters_by_name_and_range() {
        let series = municipality_series(
            &sample(),
            &Municipality::Named("Chicago".to_string()),
            &(2020..=2021),
            &rates(),
        )
        .unwrap();

        let years: Vec<i32> = series.iter().map(|r| r.fiscal_year).collect();
        assert_eq!(years, vec![2020, 2021]);
        assert!(series.iter().all(|r| r.municipality == "Chicago"));
    }

    #[test]
    fn named_series_is_case_sensitive() {
        let series = municipality_series(
            &sample(),
            &Municipality::Named("chicago".to_string()),
            &(2019..=2021),
            &rates(),
        )
        .unwrap();

        assert!(series.is_empty());
    }

    #[test]
    fn unknown_municipality_yields_empty_series() {
        let series = municipality_series(
            &sample(),
            &Municipality::Named("Springfield".to_string()),
            &(2019..=2021),
            &rates(),
        )
        .unwrap();

        assert!(series.is_empty());
    }

    #[test]
    fn all_municipalities_sums_per_year() {
        let series =
            municipality_series(&sample(), &Municipality::All, &(2019..=2021), &rates()).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series[0].municipality, ALL_MUNICIPALITIES);
        assert_eq!(series[0].fiscal_year, 2019);
        assert_eq!(series[0].actual_total, dec!(1100));
        assert_eq!(series[0].forgone_revenue, dec!(110));
        assert_eq!(series[0].modeled_collection, dec!(1210));
        assert_eq!(series[2].actual_total, dec!(1320));
    }

    #[test]
    fn all_municipalities_rederives_rate_from_table() {
        let series =
            municipality_series(&sample(), &Municipality::All, &(2019..=2019), &rates()).unwrap();

        // Records carry 5.75, the table says 5.45 for 2019.
        assert_eq!(series[0].actual_rate, dec!(5.45));
    }

    #[test]
    fn all_municipalities_matches_sum_of_named_series() {
        let records = sample();
        let all = municipality_series(&records, &Municipality::All, &(2019..=2021), &rates())
            .unwrap();

        for year_total in &all {
            let expected: Decimal = records
                .iter()
                .filter(|r| r.fiscal_year == year_total.fiscal_year)
                .map(|r| r.actual_total)
                .sum();
            assert_eq!(year_total.actual_total, expected);
        }
    }

    #[test]
    fn all_municipalities_missing_rate_is_an_error() {
        let records = vec![modeled("Aurora", 2030, dec!(1), dec!(0))];

        let result = municipality_series(&records, &Municipality::All, &(2030..=2030), &rates());

        assert_eq!(result, Err(SeriesError::UnknownRate(UnknownRate(2030))));
    }

    #[test]
    fn all_municipalities_overflow_is_an_error() {
        let records = vec![
            modeled("Aurora", 2020, Decimal::MAX, dec!(0)),
            modeled("Chicago", 2020, dec!(1), dec!(0)),
        ];

        let result = municipality_series(&records, &Municipality::All, &(2020..=2020), &rates());

        assert_eq!(result, Err(SeriesError::Overflow(AmountOverflow)));
    }

    #[test]
    fn reversed_range_yields_empty_series() {
        #[allow(clippy::reversed_empty_ranges)]
        let series =
            municipality_series(&sample(), &Municipality::All, &(2021..=2019), &rates()).unwrap();

        assert!(series.is_empty());
    }

    #[test]
    fn descending_reverses_year_order() {
        let series =
            municipality_series(&sample(), &Municipality::All, &(2019..=2021), &rates()).unwrap();

        let table = descending(&series);

        let years: Vec<i32> = table.iter().map(|r| r.fiscal_year).collect();
        assert_eq!(years, vec![2021, 2020, 2019]);
    }

    #[test]
    fn base_series_sorts_by_year() {
        let records = vec![
            DisbursementRecord {
                municipality: "Aurora".to_string(),
                tax_code: "INC".to_string(),
                fiscal_year: 2021,
                actual_total: dec!(2),
            },
            DisbursementRecord {
                municipality: "Aurora".to_string(),
                tax_code: "INC".to_string(),
                fiscal_year: 2019,
                actual_total: dec!(1),
            },
        ];

        let series = base_series(
            &records,
            &Municipality::Named("Aurora".to_string()),
            &(2012..=2025),
        )
        .unwrap();

        assert_eq!(series[0].fiscal_year, 2019);
        assert_eq!(series[1].fiscal_year, 2021);
    }

    #[test]
    fn base_series_rolls_up_all_municipalities() {
        let record = |municipality: &str, fiscal_year: i32, actual_total: Decimal| {
            DisbursementRecord {
                municipality: municipality.to_string(),
                tax_code: "INC".to_string(),
                fiscal_year,
                actual_total,
            }
        };
        let records = vec![
            record("Aurora", 2020, dec!(10)),
            record("Aurora", 2021, dec!(20)),
            record("Chicago", 2020, dec!(100)),
            record("Chicago", 2022, dec!(300)),
        ];

        let series = base_series(&records, &Municipality::All, &(2020..=2021)).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].municipality, ALL_MUNICIPALITIES);
        assert_eq!(series[0].actual_total, dec!(110));
        assert_eq!(series[1].fiscal_year, 2021);
        assert_eq!(series[1].actual_total, dec!(20));
    }

    #[test]
    fn parse_selection() {
        assert_eq!(Municipality::parse("ALL"), Municipality::All);
        assert_eq!(Municipality::parse(ALL_MUNICIPALITIES), Municipality::All);
        assert_eq!(
            Municipality::parse("  Oak Park "),
            Municipality::Named("Oak Park".to_string())
        );
        assert_eq!(Municipality::All.to_string(), "All Municipalities");
    }

    #[test]
    fn resolve_prefers_a_known_name_over_the_shorthand() {
        let known = ["All", "Aurora"];

        assert_eq!(Municipality::resolve(" All ", &known), Municipality::Named("All".to_string()));
        assert_eq!(Municipality::resolve("all", &known), Municipality::All);
        assert_eq!(Municipality::resolve(ALL_MUNICIPALITIES, &known), Municipality::All);
        assert_eq!(
            Municipality::resolve("Aurora", &known),
            Municipality::Named("Aurora".to_string())
        );
    }

    #[test]
    fn base_series_overflow_is_an_error() {
        let record = |municipality: &str, actual_total: Decimal| DisbursementRecord {
            municipality: municipality.to_string(),
            tax_code: "INC".to_string(),
            fiscal_year: 2020,
            actual_total,
        };
        let records = vec![record("Aurora", Decimal::MAX), record("Chicago", dec!(1))];

        let result = base_series(&records, &Municipality::All, &(2020..=2020));

        assert_eq!(result, Err(AmountOverflow));
    }
}
