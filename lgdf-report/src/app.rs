//! Dashboard views.
//!
//! [`Dashboard`] is built once per dataset and shared by every session. Each
//! view call re-runs modeling and aggregation for the session's current
//! selections; nothing derived is kept between calls.

use std::num::NonZeroUsize;
use std::ops::RangeInclusive;
use std::sync::Arc;

use lgdf_core::aggregation::{
    AmountOverflow, ImpactSummary, Municipality, RankingResult, RateComparisonRow, SeriesError,
    SnapshotSort, base_series, descending, fiscal_year_snapshot, impact_summary,
    municipality_series, rate_comparison, top_n,
};
use lgdf_core::{
    DashboardConfig, Dataset, DisbursementRecord, LoadReport, ModeledRecord,
    ModelingEngine, ModelingError, RateTable, RateTableError, YearBounds,
};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::session::{SessionError, SessionState};

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("invalid rate table: {0}")]
    Rates(#[from] RateTableError),

    #[error("dataset tax category '{dataset}' does not match configured category '{config}'")]
    CategoryMismatch { dataset: String, config: String },

    #[error(transparent)]
    Modeling(#[from] ModelingError),

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error(transparent)]
    Overflow(#[from] AmountOverflow),
}

/// Dataset-level facts shown on startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSummary {
    pub tax_category: String,
    pub report: LoadReport,
    pub municipalities: usize,
    pub year_bounds: Option<YearBounds>,
    pub rate_years: usize,
    /// Dataset years with no configured rate; modeling those years fails.
    pub missing_rate_years: Vec<i32>,
}

/// Base (unmodeled) chart tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartView {
    pub selection: Municipality,
    pub years: RangeInclusive<i32>,
    /// Ascending by fiscal year.
    pub chart: Vec<DisbursementRecord>,
    /// Descending by fiscal year.
    pub table: Vec<DisbursementRecord>,
}

/// Modeling tab for one selection and modeled rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeledView {
    pub selection: Municipality,
    pub years: RangeInclusive<i32>,
    pub modeled_rate: Decimal,
    /// Ascending by fiscal year.
    pub chart: Vec<ModeledRecord>,
    /// Descending by fiscal year.
    pub table: Vec<ModeledRecord>,
    pub impact: ImpactSummary,
    pub comparison: Vec<RateComparisonRow>,
}

/// Fiscal-year table for the session's year and filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiscalYearTable<T> {
    pub fiscal_year: i32,
    pub name_filter: Option<String>,
    pub rows: Vec<T>,
}

/// Shared, read-only dashboard over one dataset and rate table.
#[derive(Debug, Clone)]
pub struct Dashboard {
    dataset: Arc<Dataset>,
    rates: Arc<RateTable>,
    engine: ModelingEngine,
    config: DashboardConfig,
}

impl Dashboard {
    /// Builds a dashboard, warning about dataset years without a rate.
    ///
    /// # Errors
    ///
    /// * [`DashboardError::Rates`] if the configured rates are invalid.
    /// * [`DashboardError::CategoryMismatch`] if the dataset was loaded for
    ///   another tax category.
    pub fn new(
        dataset: Arc<Dataset>,
        config: DashboardConfig,
    ) -> Result<Self, DashboardError> {
        if !dataset.is_empty() && dataset.tax_category() != config.tax_category {
            return Err(DashboardError::CategoryMismatch {
                dataset: dataset.tax_category().to_string(),
                config: config.tax_category.clone(),
            });
        }

        let rates = Arc::new(config.rate_table()?);
        let missing = rates.missing_years(dataset.fiscal_years());
        if !missing.is_empty() {
            warn!(?missing, "dataset has fiscal years with no configured LGDF rate");
        }

        info!(
            records = dataset.len(),
            rate_years = rates.len(),
            "dashboard ready"
        );

        Ok(Self {
            engine: ModelingEngine::new(Arc::clone(&rates)),
            dataset,
            rates,
            config,
        })
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn rates(&self) -> &Arc<RateTable> {
        &self.rates
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Starts a session with default selections.
    pub fn new_session(&self) -> Result<SessionState, SessionError> {
        SessionState::new(Arc::clone(&self.dataset), &self.config)
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            tax_category: self.dataset.tax_category().to_string(),
            report: self.dataset.report().clone(),
            municipalities: self.dataset.municipalities().len(),
            year_bounds: self.dataset.year_bounds(),
            rate_years: self.rates.len(),
            missing_rate_years: self.rates.missing_years(self.dataset.fiscal_years()),
        }
    }

    /// Base chart and table for the selected municipality and year range.
    ///
    /// # Errors
    ///
    /// [`DashboardError::Overflow`] if a yearly roll-up leaves the `Decimal`
    /// range.
    pub fn chart(
        &self,
        session: &SessionState,
    ) -> Result<ChartView, DashboardError> {
        let years = session.years();
        let chart = base_series(self.dataset.records(), session.selection(), &years)?;
        let table = descending(&chart);

        Ok(ChartView {
            selection: session.selection().clone(),
            years,
            chart,
            table,
        })
    }

    /// Base fiscal-year table, sorted by actual total descending.
    pub fn fiscal_year_table(
        &self,
        session: &SessionState,
    ) -> FiscalYearTable<DisbursementRecord> {
        let rows = fiscal_year_snapshot(
            self.dataset.records(),
            session.fiscal_year(),
            session.name_filter(),
            SnapshotSort::ActualTotal,
        );

        FiscalYearTable {
            fiscal_year: session.fiscal_year(),
            name_filter: session.name_filter().map(str::to_string),
            rows,
        }
    }

    /// Modeled fiscal-year table, sorted by the session's sort column.
    pub fn modeled_fiscal_year_table(
        &self,
        session: &SessionState,
    ) -> Result<FiscalYearTable<ModeledRecord>, DashboardError> {
        let fiscal_year = session.fiscal_year();
        let modeled = self.model_where(session.modeled_rate(), |r| r.fiscal_year == fiscal_year)?;
        let rows = fiscal_year_snapshot(&modeled, fiscal_year, session.name_filter(), session.sort());

        Ok(FiscalYearTable {
            fiscal_year,
            name_filter: session.name_filter().map(str::to_string),
            rows,
        })
    }

    /// Modeled chart, table, impact summary and rate comparison for the
    /// session's selection.
    ///
    /// # Errors
    ///
    /// * [`DashboardError::Modeling`] if a year in range has no rate or a
    ///   modeled amount overflows.
    /// * [`DashboardError::Series`] or [`DashboardError::Overflow`] if a sum
    ///   leaves the `Decimal` range.
    pub fn model(
        &self,
        session: &SessionState,
    ) -> Result<ModeledView, DashboardError> {
        let years = session.years();
        let selection = session.selection();
        let modeled_rate = session.modeled_rate();

        let modeled = self.model_where(modeled_rate, |r| {
            years.contains(&r.fiscal_year)
                && match selection {
                    Municipality::All => true,
                    Municipality::Named(name) => r.municipality == *name,
                }
        })?;

        let chart = municipality_series(&modeled, selection, &years, &self.rates)?;
        let table = descending(&chart);
        let impact = impact_summary(&chart)?;
        let comparison = rate_comparison(&chart, modeled_rate)?;

        debug!(
            selection = %selection,
            modeled_rate = %modeled_rate,
            total_forgone = %impact.total_forgone,
            "built modeled view"
        );

        Ok(ModeledView {
            selection: selection.clone(),
            years,
            modeled_rate,
            chart,
            table,
            impact,
            comparison,
        })
    }

    /// Top-N municipalities by forgone revenue over the session's range.
    pub fn top(
        &self,
        session: &SessionState,
    ) -> Result<RankingResult, DashboardError> {
        let years = session.years();
        let modeled =
            self.model_where(session.modeled_rate(), |r| years.contains(&r.fiscal_year))?;
        let n: NonZeroUsize = session.top_n();

        Ok(top_n(&modeled, &years, n)?)
    }

    /// Models only the records `keep` selects, so years outside the view
    /// never need a rate.
    fn model_where<F>(
        &self,
        modeled_rate: Decimal,
        keep: F,
    ) -> Result<Vec<ModeledRecord>, DashboardError>
    where
        F: Fn(&DisbursementRecord) -> bool,
    {
        let selected: Vec<DisbursementRecord> = self
            .dataset
            .records()
            .iter()
            .filter(|&r| keep(r))
            .cloned()
            .collect();

        Ok(self.engine.model(&selected, modeled_rate)?)
    }
}
