//! Top-N municipalities by forgone revenue over a year range.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::ops::RangeInclusive;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AmountOverflow, Totals};
use crate::models::ModeledRecord;

/// Ranking sizes offered by the dashboard. Any positive size is accepted.
pub const TOP_N_CHOICES: [usize; 5] = [10, 25, 50, 100, 250];

/// One ranked municipality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedMunicipality {
    /// 1-based position in the ranking.
    pub rank: usize,
    pub municipality: String,
    pub total_actual: Decimal,
    pub total_modeled: Decimal,
    pub total_forgone: Decimal,
}

/// Ranked rows plus totals across every municipality in range, not just
/// the ranked ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingResult {
    pub rows: Vec<RankedMunicipality>,
    pub grand_total_actual: Decimal,
    pub grand_total_modeled: Decimal,
    pub grand_total_forgone: Decimal,
    /// Municipalities with at least one record in range.
    pub municipalities_considered: usize,
}

/// Ranks municipalities by forgone revenue summed over `years`.
///
/// Municipalities are grouped in name order, then stably sorted by summed
/// forgone revenue descending, so ties stay in name order. The first `n`
/// are kept and numbered from 1.
///
/// # Errors
///
/// Returns [`AmountOverflow`] if a municipality's sum or a grand total
/// leaves the `Decimal` range.
///
/// # Example
///
/// ```
/// use std::num::NonZeroUsize;
///
/// use rust_decimal::Decimal;
/// use rust_decimal_macros::dec;
/// use lgdf_core::ModeledRecord;
/// use lgdf_core::aggregation::top_n;
///
/// let row = |name: &str, forgone_revenue: Decimal| ModeledRecord {
///     municipality: name.to_string(),
///     tax_code: "INC".to_string(),
///     fiscal_year: 2025,
///     actual_total: dec!(0),
///     actual_rate: dec!(6.47),
///     modeled_collection: forgone_revenue,
///     forgone_revenue,
/// };
///
/// let ranking = top_n(
///     &[row("A", dec!(500)), row("B", dec!(1500))],
///     &(2012..=2025),
///     NonZeroUsize::new(3).unwrap(),
/// )
/// .unwrap();
///
/// assert_eq!(ranking.rows[0].municipality, "B");
/// assert_eq!(ranking.rows[0].rank, 1);
/// assert_eq!(ranking.rows[1].municipality, "A");
/// assert_eq!(ranking.grand_total_forgone, dec!(2000));
/// ```
pub fn top_n(
    records: &[ModeledRecord],
    years: &RangeInclusive<i32>,
    n: NonZeroUsize,
) -> Result<RankingResult, AmountOverflow> {
    let mut by_municipality: BTreeMap<&str, Totals> = BTreeMap::new();
    for record in records.iter().filter(|r| years.contains(&r.fiscal_year)) {
        by_municipality
            .entry(record.municipality.as_str())
            .or_default()
            .add(record)?;
    }

    let mut grand = Totals::default();
    for totals in by_municipality.values() {
        grand.merge(totals)?;
    }

    let municipalities_considered = by_municipality.len();
    let mut grouped: Vec<(&str, Totals)> = by_municipality.into_iter().collect();
    grouped.sort_by(|a, b| b.1.forgone.cmp(&a.1.forgone));

    let rows: Vec<RankedMunicipality> = grouped
        .into_iter()
        .take(n.get())
        .enumerate()
        .map(|(idx, (municipality, totals))| RankedMunicipality {
            rank: idx + 1,
            municipality: municipality.to_string(),
            total_actual: totals.actual,
            total_modeled: totals.modeled,
            total_forgone: totals.forgone,
        })
        .collect();

    debug!(
        requested = n.get(),
        ranked = rows.len(),
        considered = municipalities_considered,
        "ranked municipalities by forgone revenue"
    );

    Ok(RankingResult {
        rows,
        grand_total_actual: grand.actual,
        grand_total_modeled: grand.modeled,
        grand_total_forgone: grand.forgone,
        municipalities_considered,
    })
}
