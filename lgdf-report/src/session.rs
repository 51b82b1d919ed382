//! Per-session selection state for the dashboard.
//!
//! A session holds what the user has picked (municipality, year range,
//! fiscal year, name filter, modeled rate, ranking size). It shares the
//! loaded dataset but owns nothing else, so sessions are independent.

use std::num::NonZeroUsize;
use std::ops::RangeInclusive;
use std::sync::Arc;

use lgdf_core::aggregation::{Municipality, SnapshotSort};
use lgdf_core::{DashboardConfig, Dataset, YearBounds};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

/// Rejected selection changes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("the dataset has no records to select from")]
    EmptyDataset,

    #[error("municipality '{0}' is not in the dataset")]
    UnknownMunicipality(String),

    #[error("modeled rate must be positive, got {0}")]
    InvalidModeledRate(Decimal),

    #[error("top-N must be at least 1")]
    InvalidTopN,
}

/// Transient selections for one dashboard user.
#[derive(Debug, Clone)]
pub struct SessionState {
    dataset: Arc<Dataset>,
    bounds: YearBounds,
    default_modeled_rate: Decimal,
    default_top_n: NonZeroUsize,

    selection: Municipality,
    start_year: i32,
    end_year: i32,
    fiscal_year: i32,
    name_filter: String,
    modeled_rate: Decimal,
    top_n: NonZeroUsize,
    sort: SnapshotSort,
}

impl SessionState {
    /// Starts a session with the default selections: first municipality,
    /// full observed year range, latest fiscal year, configured default rate
    /// and the first configured top-N choice.
    pub fn new(
        dataset: Arc<Dataset>,
        config: &DashboardConfig,
    ) -> Result<Self, SessionError> {
        let bounds = dataset.year_bounds().ok_or(SessionError::EmptyDataset)?;
        let selection = dataset
            .municipalities()
            .first()
            .map(|name| Municipality::Named(name.to_string()))
            .ok_or(SessionError::EmptyDataset)?;
        let default_top_n = config
            .top_n_choices
            .first()
            .copied()
            .and_then(NonZeroUsize::new)
            .ok_or(SessionError::InvalidTopN)?;

        Ok(Self {
            dataset,
            bounds,
            default_modeled_rate: config.default_modeled_rate,
            default_top_n,
            selection,
            start_year: bounds.min,
            end_year: bounds.max,
            fiscal_year: bounds.max,
            name_filter: String::new(),
            modeled_rate: config.default_modeled_rate,
            top_n: default_top_n,
            sort: SnapshotSort::default(),
        })
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn bounds(&self) -> YearBounds {
        self.bounds
    }

    pub fn selection(&self) -> &Municipality {
        &self.selection
    }

    /// Inclusive year range for charts and rankings. May be empty when the
    /// user picked a start after the end.
    pub fn years(&self) -> RangeInclusive<i32> {
        self.start_year..=self.end_year
    }

    pub fn fiscal_year(&self) -> i32 {
        self.fiscal_year
    }

    /// The name filter, or `None` when blank.
    pub fn name_filter(&self) -> Option<&str> {
        let filter = self.name_filter.trim();
        (!filter.is_empty()).then_some(filter)
    }

    pub fn modeled_rate(&self) -> Decimal {
        self.modeled_rate
    }

    pub fn top_n(&self) -> NonZeroUsize {
        self.top_n
    }

    pub fn sort(&self) -> SnapshotSort {
        self.sort
    }

    /// Selects a municipality by name, or the roll-up via `all`.
    pub fn select_municipality(
        &mut self,
        selection: &str,
    ) -> Result<(), SessionError> {
        let selection = Municipality::resolve(selection, &self.dataset.municipalities());
        if let Municipality::Named(name) = &selection {
            if !self.dataset.municipalities().contains(&name.as_str()) {
                return Err(SessionError::UnknownMunicipality(name.clone()));
            }
        }
        debug!(selection = %selection, "municipality selected");
        self.selection = selection;
        Ok(())
    }

    /// Sets the chart range, clamping both ends to the dataset bounds.
    pub fn set_year_range(
        &mut self,
        start: i32,
        end: i32,
    ) {
        self.start_year = self.bounds.clamp(start);
        self.end_year = self.bounds.clamp(end);
    }

    /// Sets the snapshot year, clamped to the dataset bounds.
    pub fn set_fiscal_year(
        &mut self,
        fiscal_year: i32,
    ) {
        self.fiscal_year = self.bounds.clamp(fiscal_year);
    }

    pub fn set_name_filter(
        &mut self,
        filter: &str,
    ) {
        self.name_filter = filter.to_string();
    }

    pub fn set_modeled_rate(
        &mut self,
        rate: Decimal,
    ) -> Result<(), SessionError> {
        if rate <= Decimal::ZERO {
            return Err(SessionError::InvalidModeledRate(rate));
        }
        self.modeled_rate = rate;
        Ok(())
    }

    pub fn set_top_n(
        &mut self,
        n: usize,
    ) -> Result<(), SessionError> {
        self.top_n = NonZeroUsize::new(n).ok_or(SessionError::InvalidTopN)?;
        Ok(())
    }

    pub fn set_sort(
        &mut self,
        sort: SnapshotSort,
    ) {
        self.sort = sort;
    }

    /// Restores every selection to its default. The municipality goes back
    /// to the first one in the dataset.
    pub fn reset(&mut self) {
        if let Some(first) = self.dataset.municipalities().first() {
            self.selection = Municipality::Named(first.to_string());
        }
        self.start_year = self.bounds.min;
        self.end_year = self.bounds.max;
        self.fiscal_year = self.bounds.max;
        self.name_filter.clear();
        self.modeled_rate = self.default_modeled_rate;
        self.top_n = self.default_top_n;
        self.sort = SnapshotSort::default();
    }
}
