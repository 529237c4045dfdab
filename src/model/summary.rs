//! Batch-wide summary.

use super::{PartOutcome, PartReport};
use serde::Serialize;
use std::path::PathBuf;

/// Counts over a whole batch, for automation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchTotals {
    pub files: usize,
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub calculated_operations: usize,
    pub suppressed_operations: usize,
    pub anomalies: usize,
}

/// Per-file reports plus totals for one batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub directory: PathBuf,
    pub parts: Vec<PartReport>,
    pub totals: BatchTotals,
    /// The batch stopped before every file was processed.
    pub cancelled: bool,
}

impl BatchSummary {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            parts: Vec::new(),
            totals: BatchTotals::default(),
            cancelled: false,
        }
    }

    /// Add a part's report and update the totals.
    pub fn record(&mut self, report: PartReport) {
        let totals = &mut self.totals;
        totals.files += 1;
        match report.outcome {
            PartOutcome::Completed => totals.completed += 1,
            PartOutcome::Skipped { .. } => totals.skipped += 1,
            PartOutcome::Failed { .. } => totals.failed += 1,
        }
        totals.calculated_operations += report.calculated_count();
        totals.suppressed_operations += report.suppressed_count();
        totals.anomalies += report.anomalies.len();
        self.parts.push(report);
    }

    /// Report for a given file, if it was processed.
    pub fn part(&self, file_name: &str) -> Option<&PartReport> {
        self.parts.iter().find(|report| {
            report
                .file
                .file_name()
                .map(|name| name.to_string_lossy() == file_name)
                .unwrap_or(false)
        })
    }

    /// One-line human-readable totals.
    pub fn headline(&self) -> String {
        let t = &self.totals;
        format!(
            "{} file(s): {} completed, {} skipped, {} failed; {} operation(s) calculated, {} suppressed",
            t.files, t.completed, t.skipped, t.failed, t.calculated_operations, t.suppressed_operations
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CamError;
    use crate::model::OperationReport;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_updates_totals() {
        let mut summary = BatchSummary::new("parts");

        let mut done = PartReport::new("parts/a.sldprt");
        done.operations.push(OperationReport::calculated(0, "A"));
        done.operations.push(OperationReport::suppressed(1, "B"));
        summary.record(done);
        summary.record(PartReport::from_error("parts/b.sldprt", &CamError::NotACamPart));
        summary.record(PartReport::from_error(
            "parts/c.sldprt",
            &CamError::engine("calculate", "crash"),
        ));

        assert_eq!(
            summary.totals,
            BatchTotals {
                files: 3,
                completed: 1,
                skipped: 1,
                failed: 1,
                calculated_operations: 1,
                suppressed_operations: 1,
                anomalies: 0,
            }
        );
        assert!(summary.part("b.sldprt").unwrap().outcome.is_skipped());
        assert!(summary.part("missing.sldprt").is_none());
    }

    #[test]
    fn test_headline() {
        let mut summary = BatchSummary::new("parts");
        summary.record(PartReport::new("parts/a.sldprt"));
        assert_eq!(
            summary.headline(),
            "1 file(s): 1 completed, 0 skipped, 0 failed; 0 operation(s) calculated, 0 suppressed"
        );
    }
}
