//! Query shapes over modeled (or raw) disbursement records.
//!
//! Every function here is pure: same inputs, same rows, same order.
//! An empty selection is a valid empty result, never an error. Sums are
//! checked and report [`AmountOverflow`] rather than wrapping or panicking.

pub mod impact;
pub mod ranking;
pub mod rate_comparison;
pub mod series;
pub mod snapshot;

pub use impact::{ImpactSummary, impact_summary};
pub use ranking::{RankedMunicipality, RankingResult, TOP_N_CHOICES, top_n};
pub use rate_comparison::{RateComparisonRow, rate_comparison};
pub use series::{ALL_MUNICIPALITIES, Municipality, base_series, descending, municipality_series};
pub use snapshot::{SnapshotSort, fiscal_year_snapshot};

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{ModeledRecord, UnknownRate};

/// A summed amount left the range a `Decimal` can represent.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("summed amount exceeds the representable decimal range")]
pub struct AmountOverflow;

/// Failures of [`municipality_series`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeriesError {
    #[error(transparent)]
    UnknownRate(#[from] UnknownRate),

    #[error(transparent)]
    Overflow(#[from] AmountOverflow),
}

pub(crate) fn checked_sum(
    total: Decimal,
    amount: Decimal,
) -> Result<Decimal, AmountOverflow> {
    total.checked_add(amount).ok_or(AmountOverflow)
}

/// Running sums of the three monetary fields of a [`ModeledRecord`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Totals {
    pub actual: Decimal,
    pub modeled: Decimal,
    pub forgone: Decimal,
}

impl Totals {
    pub fn add(
        &mut self,
        record: &ModeledRecord,
    ) -> Result<(), AmountOverflow> {
        self.merge(&Totals {
            actual: record.actual_total,
            modeled: record.modeled_collection,
            forgone: record.forgone_revenue,
        })
    }

    pub fn merge(
        &mut self,
        other: &Totals,
    ) -> Result<(), AmountOverflow> {
        self.actual = checked_sum(self.actual, other.actual)?;
        self.modeled = checked_sum(self.modeled, other.modeled)?;
        self.forgone = checked_sum(self.forgone, other.forgone)?;
        Ok(())
    }
}
