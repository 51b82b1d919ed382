//! Terminal table rows. Every cell is preformatted text; amounts are whole
//! units with thousands separators, rates carry two decimals.

use lgdf_core::aggregation::{ImpactSummary, RankedMunicipality, RateComparisonRow};
use lgdf_core::{DisbursementRecord, ModeledRecord};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::app::DatasetSummary;
use crate::format::{format_amount, format_count, format_rate, format_rate_difference};

#[derive(Debug, Clone, Tabled)]
pub struct SeriesTableRow {
    #[tabled(rename = "Fiscal Year")]
    pub fiscal_year: i32,
    #[tabled(rename = "Municipality")]
    pub municipality: String,
    #[tabled(rename = "Actual Total")]
    pub actual_total: String,
}

impl From<&DisbursementRecord> for SeriesTableRow {
    fn from(record: &DisbursementRecord) -> Self {
        Self {
            fiscal_year: record.fiscal_year,
            municipality: record.municipality.clone(),
            actual_total: format_amount(record.actual_total),
        }
    }
}

#[derive(Debug, Clone, Tabled)]
pub struct SnapshotTableRow {
    #[tabled(rename = "Municipality")]
    pub municipality: String,
    #[tabled(rename = "Tax Code")]
    pub tax_code: String,
    #[tabled(rename = "Actual Total")]
    pub actual_total: String,
}

impl From<&DisbursementRecord> for SnapshotTableRow {
    fn from(record: &DisbursementRecord) -> Self {
        Self {
            municipality: record.municipality.clone(),
            tax_code: record.tax_code.clone(),
            actual_total: format_amount(record.actual_total),
        }
    }
}

#[derive(Debug, Clone, Tabled)]
pub struct ModeledTableRow {
    #[tabled(rename = "Fiscal Year")]
    pub fiscal_year: i32,
    #[tabled(rename = "Municipality")]
    pub municipality: String,
    #[tabled(rename = "Actual Rate")]
    pub actual_rate: String,
    #[tabled(rename = "Actual Total")]
    pub actual_total: String,
    #[tabled(rename = "Modeled Collection")]
    pub modeled_collection: String,
    #[tabled(rename = "Forgone Revenue")]
    pub forgone_revenue: String,
}

impl From<&ModeledRecord> for ModeledTableRow {
    fn from(record: &ModeledRecord) -> Self {
        Self {
            fiscal_year: record.fiscal_year,
            municipality: record.municipality.clone(),
            actual_rate: format_rate(record.actual_rate),
            actual_total: format_amount(record.actual_total),
            modeled_collection: format_amount(record.modeled_collection),
            forgone_revenue: format_amount(record.forgone_revenue),
        }
    }
}

#[derive(Debug, Clone, Tabled)]
pub struct RankingTableRow {
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[tabled(rename = "Municipality")]
    pub municipality: String,
    #[tabled(rename = "Total Actual")]
    pub total_actual: String,
    #[tabled(rename = "Total Modeled")]
    pub total_modeled: String,
    #[tabled(rename = "Total Forgone")]
    pub total_forgone: String,
}

impl From<&RankedMunicipality> for RankingTableRow {
    fn from(row: &RankedMunicipality) -> Self {
        Self {
            rank: row.rank,
            municipality: row.municipality.clone(),
            total_actual: format_amount(row.total_actual),
            total_modeled: format_amount(row.total_modeled),
            total_forgone: format_amount(row.total_forgone),
        }
    }
}

#[derive(Debug, Clone, Tabled)]
pub struct RateComparisonTableRow {
    #[tabled(rename = "Fiscal Year")]
    pub fiscal_year: i32,
    #[tabled(rename = "Modeled Rate")]
    pub modeled_rate: String,
    #[tabled(rename = "Actual Rate")]
    pub actual_rate: String,
    #[tabled(rename = "Difference")]
    pub rate_difference: String,
    #[tabled(rename = "Actual Collection")]
    pub actual_collection: String,
    #[tabled(rename = "Modeled Collection")]
    pub modeled_collection: String,
    #[tabled(rename = "Forgone Revenue")]
    pub forgone_revenue: String,
}

impl From<&RateComparisonRow> for RateComparisonTableRow {
    fn from(row: &RateComparisonRow) -> Self {
        Self {
            fiscal_year: row.fiscal_year,
            modeled_rate: format_rate(row.modeled_rate),
            actual_rate: format_rate(row.actual_rate),
            rate_difference: format_rate_difference(row.rate_difference),
            actual_collection: format_amount(row.actual_collection),
            modeled_collection: format_amount(row.modeled_collection),
            forgone_revenue: format_amount(row.forgone_revenue),
        }
    }
}

/// Two-column label/value row for headline figures.
#[derive(Debug, Clone, Tabled)]
pub struct MetricRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl MetricRow {
    fn new(
        metric: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            metric: metric.into(),
            value: value.into(),
        }
    }
}

/// Headline forgone-revenue figures.
pub fn impact_rows(impact: &ImpactSummary) -> Vec<MetricRow> {
    let latest = match impact.latest_year {
        Some(year) => format!("Forgone revenue, FY {year}"),
        None => "Forgone revenue, latest year".to_string(),
    };
    vec![
        MetricRow::new(latest, format_amount(impact.latest_year_forgone)),
        MetricRow::new("Forgone revenue, last 3 years", format_amount(impact.last_3_years_forgone)),
        MetricRow::new("Forgone revenue, last 5 years", format_amount(impact.last_5_years_forgone)),
        MetricRow::new("Forgone revenue, selected range", format_amount(impact.total_forgone)),
        MetricRow::new("Years with data", impact.years_available.to_string()),
    ]
}

/// Dataset facts and load counts.
pub fn summary_rows(summary: &DatasetSummary) -> Vec<MetricRow> {
    let years = match summary.year_bounds {
        Some(bounds) => format!("{}-{}", bounds.min, bounds.max),
        None => "none".to_string(),
    };
    let missing = if summary.missing_rate_years.is_empty() {
        "none".to_string()
    } else {
        summary
            .missing_rate_years
            .iter()
            .map(i32::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    let report = &summary.report;

    vec![
        MetricRow::new("Tax category", summary.tax_category.clone()),
        MetricRow::new("Fiscal years", years),
        MetricRow::new("Municipalities", format_count(summary.municipalities)),
        MetricRow::new("Rows read", format_count(report.rows_read)),
        MetricRow::new("Rows retained", format_count(report.rows_retained)),
        MetricRow::new("Rows dropped (bad fy / fy_total)", format_count(report.rows_dropped)),
        MetricRow::new("Rows of other tax categories", format_count(report.rows_other_category)),
        MetricRow::new("Duplicate municipality-years", format_count(report.duplicate_pairs)),
        MetricRow::new("Configured rate years", format_count(summary.rate_years)),
        MetricRow::new("Years missing a rate", missing),
    ]
}

/// Renders rows as a terminal table, or `(no rows)` when empty.
pub fn render<T: Tabled + Clone>(rows: &[T]) -> String {
    if rows.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(rows.iter().cloned())
        .with(Style::rounded())
        .to_string()
}

#[cfg(test)]
mod tests {
    use lgdf_core::LoadReport;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn modeled_row_formats_amounts_and_rate() {
        let record = ModeledRecord {
            municipality: "Chicago".to_string(),
            tax_code: "INC".to_string(),
            fiscal_year: 2020,
            actual_total: dec!(1000000),
            actual_rate: dec!(5.75),
            modeled_collection: dec!(1739130.4347826),
            forgone_revenue: dec!(739130.4347826),
        };

        let row = ModeledTableRow::from(&record);

        assert_eq!(row.actual_rate, "5.75%");
        assert_eq!(row.actual_total, "1,000,000");
        assert_eq!(row.modeled_collection, "1,739,130");
        assert_eq!(row.forgone_revenue, "739,130");
    }

    #[test]
    fn empty_table_renders_placeholder() {
        assert_eq!(render::<RankingTableRow>(&[]), "(no rows)");
    }

    #[test]
    fn rendered_table_has_headers() {
        let rows = vec![MetricRow::new("Municipalities", "3")];

        let table = render(&rows);

        assert!(table.contains("Metric"));
        assert!(table.contains("Municipalities"));
    }

    #[test]
    fn impact_rows_name_the_latest_year() {
        let impact = ImpactSummary {
            latest_year: Some(2025),
            latest_year_forgone: dec!(1059),
            ..ImpactSummary::default()
        };

        let rows = impact_rows(&impact);

        assert_eq!(rows[0].metric, "Forgone revenue, FY 2025");
        assert_eq!(rows[0].value, "1,059");
    }

    #[test]
    fn summary_rows_list_missing_rate_years() {
        let summary = DatasetSummary {
            tax_category: "INC".to_string(),
            report: LoadReport::default(),
            municipalities: 0,
            year_bounds: None,
            rate_years: 14,
            missing_rate_years: vec![2026, 2027],
        };

        let rows = summary_rows(&summary);

        assert_eq!(rows[1].value, "none");
        assert_eq!(rows.last().map(|r| r.value.as_str()), Some("2026, 2027"));
    }
}
