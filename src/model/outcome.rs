//! Per-operation and per-part outcomes.

use crate::error::{CamError, ErrorCode};
use serde::Serialize;
use std::path::PathBuf;

/// Final state of one operation after the calculation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationOutcome {
    Calculated,
    Suppressed,
}

/// Result of calculating one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationReport {
    /// Position in the part's operation list.
    pub index: usize,
    pub name: String,
    pub outcome: OperationOutcome,
}

impl OperationReport {
    pub fn calculated(index: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
            outcome: OperationOutcome::Calculated,
        }
    }

    pub fn suppressed(index: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
            outcome: OperationOutcome::Suppressed,
        }
    }

    pub fn is_calculated(&self) -> bool {
        self.outcome == OperationOutcome::Calculated
    }
}

/// An operation entry that could not be read and was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationAnomaly {
    pub index: usize,
    pub message: String,
}

/// How a part's pipeline ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PartOutcome {
    /// Every enabled phase ran without an unexpected failure.
    Completed,
    /// The environment did not allow processing (add-in, non-CAM part).
    Skipped { code: ErrorCode, message: String },
    /// An unexpected failure ended processing of the part.
    Failed { code: ErrorCode, message: String },
}

impl PartOutcome {
    /// Classify an error: environment errors skip, anything else fails.
    pub fn from_error(err: &CamError) -> Self {
        let code = err.code();
        let message = err.to_string();
        if err.is_environment() {
            PartOutcome::Skipped { code, message }
        } else {
            PartOutcome::Failed { code, message }
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, PartOutcome::Completed)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, PartOutcome::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PartOutcome::Failed { .. })
    }

    /// Error code for skipped and failed parts.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            PartOutcome::Completed => None,
            PartOutcome::Skipped { code, .. } | PartOutcome::Failed { code, .. } => Some(*code),
        }
    }
}

/// Everything observed while processing one part file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartReport {
    pub file: PathBuf,
    pub outcome: PartOutcome,
    /// Result of the synchronization check, when it ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_sync: Option<bool>,
    /// Result of the synchronization request, when it ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synchronized: Option<bool>,
    pub operations: Vec<OperationReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<OperationAnomaly>,
    /// Result of code generation, when it ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcode_generated: Option<bool>,
    /// Whether the CAD document was closed after processing.
    pub document_closed: bool,
}

impl PartReport {
    /// A report that has not been through any phase yet.
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            outcome: PartOutcome::Completed,
            in_sync: None,
            synchronized: None,
            operations: Vec::new(),
            anomalies: Vec::new(),
            gcode_generated: None,
            document_closed: false,
        }
    }

    /// A report for a part that ended with `err` before any phase ran.
    pub fn from_error(file: impl Into<PathBuf>, err: &CamError) -> Self {
        Self {
            outcome: PartOutcome::from_error(err),
            ..Self::new(file)
        }
    }

    pub fn calculated_count(&self) -> usize {
        self.operations.iter().filter(|op| op.is_calculated()).count()
    }

    pub fn suppressed_count(&self) -> usize {
        self.operations.len() - self.calculated_count()
    }
}
