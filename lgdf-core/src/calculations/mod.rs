//! Monetary calculations for LGDF rate modeling.
//!
//! [`modeling`] rescales historical disbursements to a hypothetical rate;
//! [`common`] holds the rounding helpers used at display and export time.

pub mod common;
pub mod modeling;

pub use modeling::{ModelingEngine, ModelingError};
