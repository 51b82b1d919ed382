//! Presentation adapter for the LGDF disbursement dashboard: per-session
//! selections, view assembly, terminal tables and logging setup.

pub mod app;
pub mod format;
pub mod logging;
pub mod session;
pub mod tables;

pub use app::{ChartView, Dashboard, DashboardError, DatasetSummary, FiscalYearTable, ModeledView};
pub use session::{SessionError, SessionState};
