//! Historical effective LGDF rates keyed by fiscal year.
//!
//! The table is built once from configuration and then only read. It is
//! handed to the modeling engine and the aggregator explicitly so tests can
//! substitute their own tables.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lookup miss: the fiscal year has no configured actual rate.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("no actual LGDF rate is configured for fiscal year {0}")]
pub struct UnknownRate(pub i32);

/// Errors raised while building a [`RateTable`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RateTableError {
    /// The same fiscal year was listed twice.
    #[error("fiscal year {0} appears more than once in the rate table")]
    DuplicateYear(i32),
}

/// A single `fiscal_year → rate` entry as it appears in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateEntry {
    pub fiscal_year: i32,
    /// Effective disbursement rate in percent (e.g. `6.47`).
    pub rate: Decimal,
}

/// Immutable mapping from fiscal year to actual effective rate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateTable {
    rates: BTreeMap<i32, Decimal>,
}

impl RateTable {
    /// Builds a table from configuration entries.
    ///
    /// # Errors
    ///
    /// Returns [`RateTableError::DuplicateYear`] if a fiscal year is listed
    /// more than once.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use lgdf_core::{RateEntry, RateTable};
    ///
    /// let table = RateTable::from_entries([
    ///     RateEntry { fiscal_year: 2020, rate: dec!(5.75) },
    ///     RateEntry { fiscal_year: 2025, rate: dec!(6.47) },
    /// ])
    /// .unwrap();
    ///
    /// assert_eq!(table.rate_for(2020), Ok(dec!(5.75)));
    /// assert!(table.rate_for(2019).is_err());
    /// ```
    pub fn from_entries<I>(entries: I) -> Result<Self, RateTableError>
    where
        I: IntoIterator<Item = RateEntry>,
    {
        let mut rates = BTreeMap::new();
        for entry in entries {
            if rates.insert(entry.fiscal_year, entry.rate).is_some() {
                return Err(RateTableError::DuplicateYear(entry.fiscal_year));
            }
        }
        Ok(Self { rates })
    }

    /// Returns the actual effective rate for `year`.
    pub fn rate_for(
        &self,
        year: i32,
    ) -> Result<Decimal, UnknownRate> {
        self.rates.get(&year).copied().ok_or(UnknownRate(year))
    }

    pub fn contains(
        &self,
        year: i32,
    ) -> bool {
        self.rates.contains_key(&year)
    }

    /// Fiscal years covered by the table, ascending.
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.rates.keys().copied()
    }

    /// `(fiscal_year, rate)` pairs, ascending by year.
    pub fn iter(&self) -> impl Iterator<Item = (i32, Decimal)> + '_ {
        self.rates.iter().map(|(year, rate)| (*year, *rate))
    }

    /// Years from `years` that have no entry, ascending and de-duplicated.
    pub fn missing_years<I>(
        &self,
        years: I,
    ) -> Vec<i32>
    where
        I: IntoIterator<Item = i32>,
    {
        let mut missing: Vec<i32> = years
            .into_iter()
            .filter(|year| !self.contains(*year))
            .collect();
        missing.sort_unstable();
        missing.dedup();
        missing
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn entry(
        fiscal_year: i32,
        rate: Decimal,
    ) -> RateEntry {
        RateEntry { fiscal_year, rate }
    }

    #[test]
    fn rate_for_returns_configured_rate() {
        let table =
            RateTable::from_entries([entry(2012, dec!(6.00)), entry(2020, dec!(5.75))]).unwrap();

        assert_eq!(table.rate_for(2012), Ok(dec!(6.00)));
        assert_eq!(table.rate_for(2020), Ok(dec!(5.75)));
    }

    #[test]
    fn rate_for_unknown_year_is_an_error() {
        let table = RateTable::from_entries([entry(2020, dec!(5.75))]).unwrap();

        assert_eq!(table.rate_for(2011), Err(UnknownRate(2011)));
    }

    #[test]
    fn duplicate_year_is_rejected() {
        let result = RateTable::from_entries([entry(2020, dec!(5.75)), entry(2020, dec!(6.00))]);

        assert_eq!(result, Err(RateTableError::DuplicateYear(2020)));
    }

    #[test]
    fn table_size_follows_configuration() {
        let entries = (1990..2040).map(|year| entry(year, dec!(6.00)));
        let table = RateTable::from_entries(entries).unwrap();

        assert_eq!(table.len(), 50);
        assert_eq!(table.years().next(), Some(1990));
        assert_eq!(table.years().last(), Some(2039));
    }

    #[test]
    fn empty_table_has_no_rates() {
        let table = RateTable::default();

        assert!(table.is_empty());
        assert_eq!(table.rate_for(2020), Err(UnknownRate(2020)));
    }

    #[test]
    fn iter_is_ordered_by_year() {
        let table = RateTable::from_entries([
            entry(2025, dec!(6.47)),
            entry(2012, dec!(6.00)),
            entry(2020, dec!(5.75)),
        ])
        .unwrap();

        let pairs: Vec<_> = table.iter().collect();

        assert_eq!(
            pairs,
            vec![(2012, dec!(6.00)), (2020, dec!(5.75)), (2025, dec!(6.47))]
        );
    }

    #[test]
    fn missing_years_lists_each_gap_once() {
        let table = RateTable::from_entries([entry(2020, dec!(5.75))]).unwrap();

        let missing = table.missing_years([2021, 2020, 2019, 2021]);

        assert_eq!(missing, vec![2019, 2021]);
    }
}
