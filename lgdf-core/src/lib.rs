pub mod aggregation;
pub mod calculations;
pub mod config;
pub mod models;

pub use calculations::{ModelingEngine, ModelingError};
pub use config::{ConfigError, DashboardConfig};
pub use models::*;
