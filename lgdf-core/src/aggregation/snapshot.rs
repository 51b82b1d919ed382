//! Single fiscal-year table, optionally filtered by municipality name.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::DisbursementRow;

/// Column a fiscal-year snapshot is sorted by (always descending).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotSort {
    #[default]
    ActualTotal,
    ForgoneRevenue,
}

impl SnapshotSort {
    fn key<T: DisbursementRow>(
        self,
        row: &T,
    ) -> Decimal {
        match self {
            Self::ActualTotal => row.actual_total(),
            Self::ForgoneRevenue => row.forgone_revenue(),
        }
    }
}

/// Rows for `fiscal_year`, sorted descending by `sort`.
///
/// `name_filter` keeps rows whose municipality contains the text,
/// case-insensitively. A blank filter keeps every row. Ties keep their
/// input order.
pub fn fiscal_year_snapshot<T>(
    records: &[T],
    fiscal_year: i32,
    name_filter: Option<&str>,
    sort: SnapshotSort,
) -> Vec<T>
where
    T: DisbursementRow + Clone,
{
    let needle = name_filter
        .map(str::trim)
        .filter(|needle| !needle.is_empty())
        .map(str::to_lowercase);

    let mut rows: Vec<T> = records
        .iter()
        .filter(|r| r.fiscal_year() == fiscal_year)
        .filter(|r| match &needle {
            Some(needle) => r.municipality().to_lowercase().contains(needle.as_str()),
            None => true,
        })
        .cloned()
        .collect();

    rows.sort_by(|a, b| sort.key(b).cmp(&sort.key(a)));
    rows
}
