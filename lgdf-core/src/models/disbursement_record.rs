use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One municipality's disbursement for one fiscal year and tax category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisbursementRecord {
    /// Trimmed, case-preserved municipality name.
    pub municipality: String,
    /// Uppercase tax category code (e.g. `INC`).
    pub tax_code: String,
    pub fiscal_year: i32,
    /// Amount actually disbursed in the fiscal year.
    pub actual_total: Decimal,
}

/// Read access shared by raw and modeled records so that filters and
/// snapshots work over either kind.
pub trait DisbursementRow {
    fn municipality(&self) -> &str;
    fn fiscal_year(&self) -> i32;
    fn actual_total(&self) -> Decimal;

    /// Forgone revenue attached to the row. Raw records carry none.
    fn forgone_revenue(&self) -> Decimal {
        Decimal::ZERO
    }
}

impl DisbursementRow for DisbursementRecord {
    fn municipality(&self) -> &str {
        &self.municipality
    }

    fn fiscal_year(&self) -> i32 {
        self.fiscal_year
    }

    fn actual_total(&self) -> Decimal {
        self.actual_total
    }
}
