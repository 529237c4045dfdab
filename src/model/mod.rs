//! Report types produced by the pipeline and the batch driver.

mod outcome;
mod summary;

pub use outcome::{OperationAnomaly, OperationOutcome, OperationReport, PartOutcome, PartReport};
pub use summary::{BatchSummary, BatchTotals};
