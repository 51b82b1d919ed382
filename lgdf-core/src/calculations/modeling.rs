//! LGDF rate modeling.
//!
//! Rescales each historical disbursement by the ratio of a hypothetical
//! ("modeled") LGDF rate to the fiscal year's actual effective rate.
//!
//! # Steps
//!
//! | Step | Value |
//! |------|-------|
//! | 1    | `raw_modeled = actual_total × modeled_rate ÷ actual_rate` |
//! | 2    | `forgone_revenue = max(0, raw_modeled − actual_total)` |
//! | 3    | `modeled_collection = max(actual_total, raw_modeled)` |
//!
//! Steps 2 and 3 clamp: a modeled rate at or below the actual rate reports
//! zero forgone revenue and the actual collection unchanged. The model only
//! answers how much more municipalities would have received.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use lgdf_core::calculations::ModelingEngine;
//! use lgdf_core::calculations::common::round_cents;
//! use lgdf_core::{DisbursementRecord, RateEntry, RateTable};
//!
//! let rates = RateTable::from_entries([RateEntry { fiscal_year: 2020, rate: dec!(5.75) }]).unwrap();
//! let engine = ModelingEngine::new(rates);
//!
//! let chicago = DisbursementRecord {
//!     municipality: "Chicago".to_string(),
//!     tax_code: "INC".to_string(),
//!     fiscal_year: 2020,
//!     actual_total: dec!(1000000),
//! };
//!
//! let modeled = engine.model(&[chicago], dec!(10.00)).unwrap();
//!
//! assert_eq!(round_cents(modeled[0].modeled_collection), dec!(1739130.43));
//! assert_eq!(round_cents(modeled[0].forgone_revenue), dec!(739130.43));
//! ```

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, warn};

use crate::calculations::common::non_negative;
use crate::models::{DisbursementRecord, ModeledRecord, RateTable, UnknownRate};

/// Errors that abort a modeling run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelingError {
    /// The hypothetical rate must be strictly positive.
    #[error("modeled rate must be positive, got {0}")]
    InvalidModeledRate(Decimal),

    /// A record's fiscal year has no actual rate in the rate table.
    #[error(transparent)]
    UnknownRate(#[from] UnknownRate),

    /// The configured actual rate cannot be used as a divisor.
    #[error("actual rate for fiscal year {year} must be positive, got {rate}")]
    NonPositiveActualRate { year: i32, rate: Decimal },

    /// The modeled amount for a record does not fit in a `Decimal`.
    #[error("modeled amount for fiscal year {year} exceeds the representable decimal range")]
    Overflow { year: i32 },
}

/// Applies a modeled LGDF rate to historical disbursements.
///
/// Holds the rate table it was built with; every call derives a new record
/// sequence and leaves its input untouched.
#[derive(Debug, Clone)]
pub struct ModelingEngine {
    rates: Arc<RateTable>,
}

impl ModelingEngine {
    /// Creates an engine over the given rate table.
    pub fn new(rates: impl Into<Arc<RateTable>>) -> Self {
        Self {
            rates: rates.into(),
        }
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    /// Models every record at `modeled_rate` (a percentage, e.g. `10.00`).
    ///
    /// # Errors
    ///
    /// * [`ModelingError::InvalidModeledRate`] if `modeled_rate <= 0`.
    /// * [`ModelingError::UnknownRate`] for the first record whose fiscal
    ///   year has no rate. The whole run fails; records are never skipped.
    /// * [`ModelingError::NonPositiveActualRate`] if a configured rate is
    ///   zero or negative.
    /// * [`ModelingError::Overflow`] if a modeled amount leaves the `Decimal`
    ///   range.
    pub fn model(
        &self,
        records: &[DisbursementRecord],
        modeled_rate: Decimal,
    ) -> Result<Vec<ModeledRecord>, ModelingError> {
        Self::check_modeled_rate(modeled_rate)?;

        let modeled = records
            .iter()
            .map(|record| self.model_record(record, modeled_rate))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            records = modeled.len(),
            modeled_rate = %modeled_rate,
            "modeled disbursements"
        );

        Ok(modeled)
    }

    /// Models a single record at `modeled_rate`.
    ///
    /// # Errors
    ///
    /// Same as [`ModelingEngine::model`].
    pub fn model_one(
        &self,
        record: &DisbursementRecord,
        modeled_rate: Decimal,
    ) -> Result<ModeledRecord, ModelingError> {
        Self::check_modeled_rate(modeled_rate)?;
        self.model_record(record, modeled_rate)
    }

    fn check_modeled_rate(modeled_rate: Decimal) -> Result<(), ModelingError> {
        if modeled_rate <= Decimal::ZERO {
            return Err(ModelingError::InvalidModeledRate(modeled_rate));
        }
        Ok(())
    }

    fn model_record(
        &self,
        record: &DisbursementRecord,
        modeled_rate: Decimal,
    ) -> Result<ModeledRecord, ModelingError> {
        let actual_rate = self.actual_rate(record.fiscal_year)?;

        let overflow = || ModelingError::Overflow {
            year: record.fiscal_year,
        };

        // Step 1
        let raw_modeled = Self::raw_modeled_collection(record.actual_total, modeled_rate, actual_rate)
            .ok_or_else(overflow)?;

        // Step 2
        let difference = raw_modeled
            .checked_sub(record.actual_total)
            .ok_or_else(overflow)?;
        let forgone_revenue = non_negative(difference);

        // Step 3
        let modeled_collection = record.actual_total.max(raw_modeled);

        Ok(ModeledRecord {
            municipality: record.municipality.clone(),
            tax_code: record.tax_code.clone(),
            fiscal_year: record.fiscal_year,
            actual_total: record.actual_total,
            actual_rate,
            modeled_collection,
            forgone_revenue,
        })
    }

    fn actual_rate(
        &self,
        fiscal_year: i32,
    ) -> Result<Decimal, ModelingError> {
        let rate = self.rates.rate_for(fiscal_year).inspect_err(|_| {
            warn!(fiscal_year, "no actual rate configured; modeling aborted");
        })?;

        if rate <= Decimal::ZERO {
            return Err(ModelingError::NonPositiveActualRate {
                year: fiscal_year,
                rate,
            });
        }

        Ok(rate)
    }

    /// `actual_total × modeled_rate ÷ actual_rate`.
    ///
    /// Multiply first so that exact ratios stay exact. Totals too large for
    /// the product are divided first instead. `None` when the result itself
    /// does not fit.
    fn raw_modeled_collection(
        actual_total: Decimal,
        modeled_rate: Decimal,
        actual_rate: Decimal,
    ) -> Option<Decimal> {
        if modeled_rate == actual_rate {
            return Some(actual_total);
        }
        match actual_total.checked_mul(modeled_rate) {
            Some(product) => product.checked_div(actual_rate),
            None => actual_total
                .checked_div(actual_rate)?
                .checked_mul(modeled_rate),
        }
    }
}
