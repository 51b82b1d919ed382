//! Dashboard configuration: tax category, rate table and UI defaults.
//!
//! Configuration is TOML. A reference file for the Illinois dataset is
//! bundled with the crate and used when no file is supplied.
//!
//! ```toml
//! tax_category = "INC"
//! default_modeled_rate = "10.00"
//! top_n_choices = [10, 25, 50, 100, 250]
//!
//! [[rates]]
//! fiscal_year = 2012
//! rate = "6.00"
//! ```

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::aggregation::TOP_N_CHOICES;
use crate::models::{RateEntry, RateTable, RateTableError};

const REFERENCE_CONFIG: &str = include_str!("../config/reference.toml");

/// Tax category used when configuration does not name one.
pub const DEFAULT_TAX_CATEGORY: &str = "INC";

/// Errors that can occur while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid rate table: {0}")]
    Rates(#[from] RateTableError),

    #[error("default modeled rate must be positive, got {0}")]
    InvalidDefaultRate(Decimal),

    #[error("top-N choices must be non-empty and positive")]
    InvalidTopNChoices,

    #[error("tax category must not be blank")]
    BlankTaxCategory,
}

/// Values the core consumes from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    /// Designated tax category; rows with any other `tax` code are skipped.
    #[serde(default = "default_tax_category")]
    pub tax_category: String,

    /// Modeled LGDF rate a new session starts with, in percent.
    pub default_modeled_rate: Decimal,

    /// Ranking sizes offered to the user.
    #[serde(default = "default_top_n_choices")]
    pub top_n_choices: Vec<usize>,

    /// Historical effective rate per fiscal year.
    pub rates: Vec<RateEntry>,
}

fn default_tax_category() -> String {
    DEFAULT_TAX_CATEGORY.to_string()
}

fn default_top_n_choices() -> Vec<usize> {
    TOP_N_CHOICES.to_vec()
}

impl DashboardConfig {
    /// The bundled reference configuration (fiscal years 2012–2025).
    pub fn reference() -> Result<Self, ConfigError> {
        Self::from_toml_str(REFERENCE_CONFIG)
    }

    /// Parses and validates TOML text.
    ///
    /// The tax category is trimmed and uppercased so it compares equal to
    /// normalized dataset codes.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(input)?;
        config.tax_category = config.tax_category.trim().to_uppercase();
        config.validate()?;

        debug!(
            tax_category = %config.tax_category,
            rates = config.rates.len(),
            "parsed dashboard config"
        );

        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Builds the immutable rate table.
    pub fn rate_table(&self) -> Result<RateTable, RateTableError> {
        RateTable::from_entries(self.rates.iter().copied())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tax_category.is_empty() {
            return Err(ConfigError::BlankTaxCategory);
        }
        if self.default_modeled_rate <= Decimal::ZERO {
            return Err(ConfigError::InvalidDefaultRate(self.default_modeled_rate));
        }
        if self.top_n_choices.is_empty() || self.top_n_choices.contains(&0) {
            return Err(ConfigError::InvalidTopNChoices);
        }
        self.rate_table()?;
        Ok(())
    }
}
