mod dataset;
mod disbursement_record;
mod modeled_record;
mod rate_table;

pub use dataset::{Dataset, LoadReport, YearBounds};
pub use disbursement_record::{DisbursementRecord, DisbursementRow};
pub use modeled_record::ModeledRecord;
pub use rate_table::{RateEntry, RateTable, RateTableError, UnknownRate};
