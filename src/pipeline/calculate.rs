//! Recalculation of a part's operations with suppress-on-failure.

use crate::batch::CancellationToken;
use crate::error::{CamError, Result};
use crate::host::{CamOperation, CamPart};
use crate::model::{OperationAnomaly, OperationReport};
use tracing::{debug, info, warn};

/// Outcome of one calculation pass over a part.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CalculationReport {
    /// One entry per readable operation, in list order.
    pub operations: Vec<OperationReport>,
    /// Entries that could not be read and were skipped.
    pub anomalies: Vec<OperationAnomaly>,
}

impl CalculationReport {
    pub fn calculated(&self) -> usize {
        self.operations.iter().filter(|op| op.is_calculated()).count()
    }

    pub fn suppressed(&self) -> usize {
        self.operations.len() - self.calculated()
    }
}

/// Visits operations strictly in list order. Calculating one operation may
/// change whether the next one calculates, so the pass is never reordered.
#[derive(Debug, Clone, Copy)]
pub struct OperationCalculator<'a> {
    cancel: &'a CancellationToken,
}

impl<'a> OperationCalculator<'a> {
    pub fn new(cancel: &'a CancellationToken) -> Self {
        Self { cancel }
    }

    /// Recalculate every operation; suppress the ones that do not calculate.
    ///
    /// A failed calculation is recorded, never returned as an error. Errors
    /// only come from the engine raising, or from cancellation. `report`
    /// keeps whatever was recorded before the error.
    pub fn calculate<P: CamPart>(&self, part: &mut P, report: &mut CalculationReport) -> Result<()> {
        let count = part.operation_count()?;

        for index in 0..count {
            if self.cancel.is_cancelled() {
                return Err(CamError::Cancelled);
            }

            let Some(mut operation) = part.operation(index)? else {
                warn!("   - Operation #{} is not a readable operation, skipped", index + 1);
                report.anomalies.push(OperationAnomaly {
                    index,
                    message: "entry is not an operation".to_string(),
                });
                continue;
            };
            let name = match operation.name() {
                Ok(name) => name,
                Err(e) => {
                    warn!("   - Operation #{} has no readable name, skipped: {}", index + 1, e);
                    report.anomalies.push(OperationAnomaly {
                        index,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            operation.calculate(true)?;

            if operation.is_calculated()? {
                info!("   - Operation '{}' was calculated successfully", name);
                // Left over from an earlier run; a calculated operation is never suppressed.
                if operation.is_suppressed()? {
                    debug!("   - Operation '{}' is suppressed, releasing it", name);
                    operation.set_suppressed(false)?;
                }
                report.operations.push(OperationReport::calculated(index, name));
            } else {
                warn!(
                    "   - Operation '{}' failed to calculate and will be suppressed",
                    name
                );
                operation.set_suppressed(true)?;
                report.operations.push(OperationReport::suppressed(index, name));
            }
        }

        Ok(())
    }
}
