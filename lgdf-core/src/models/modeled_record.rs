use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::DisbursementRow;

/// A disbursement record enriched with the result of rate modeling.
///
/// Always derived fresh from a [`DisbursementRecord`](super::DisbursementRecord)
/// and a modeled rate; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeledRecord {
    pub municipality: String,
    pub tax_code: String,
    pub fiscal_year: i32,
    pub actual_total: Decimal,

    /// Historical effective LGDF rate for the fiscal year, in percent.
    pub actual_rate: Decimal,

    /// Collection under the modeled rate. Never below `actual_total`.
    pub modeled_collection: Decimal,

    /// Positive difference between the modeled and actual collection.
    pub forgone_revenue: Decimal,
}

impl DisbursementRow for ModeledRecord {
    fn municipality(&self) -> &str {
        &self.municipality
    }

    fn fiscal_year(&self) -> i32 {
        self.fiscal_year
    }

    fn actual_total(&self) -> Decimal {
        self.actual_total
    }

    fn forgone_revenue(&self) -> Decimal {
        self.forgone_revenue
    }
}
