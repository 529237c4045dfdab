//! Error types for batch CAM processing.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Error codes surfaced in machine-readable summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Input directory does not exist (-1)
    DirectoryNotFound = -1,
    /// No part files in the input directory (-2)
    NoPartFiles = -2,
    /// General I/O failure (-3)
    Io = -3,
    /// CAM add-in module not found on disk (E100)
    AddinMissing = 100,
    /// CAD host refused to load the add-in (E101)
    AddinLoadFailed = 101,
    /// Add-in loaded but the CAM API did not attach (E102)
    AddinNotResponding = 102,
    /// Open document has no CAM part (E103)
    NotACamPart = 103,
    /// CAD document could not be opened or closed (E200)
    Document = 200,
    /// External engine call raised (E201)
    Engine = 201,
    /// Processing was cancelled (E300)
    Cancelled = 300,
}

/// Errors raised while driving a single part through the CAD/CAM surface.
#[derive(Debug, Error)]
pub enum CamError {
    #[error("CAM add-in not found: '{}'", .path.display())]
    AddinMissing { path: PathBuf },

    #[error("Failed to load the CAM add-in. Error {code}")]
    AddinLoadFailed { code: i32 },

    #[error("Failed to connect to the CAM API")]
    AddinNotResponding,

    #[error("This is not a CAM part")]
    NotACamPart,

    #[error("Document '{}': {message}", .path.display())]
    Document { path: PathBuf, message: String },

    #[error("CAM engine call '{call}' failed: {message}")]
    Engine { call: &'static str, message: String },

    #[error("Processing cancelled")]
    Cancelled,
}

impl CamError {
    /// Shorthand for an engine failure on a named call.
    pub fn engine(call: &'static str, message: impl Into<String>) -> Self {
        CamError::Engine {
            call,
            message: message.into(),
        }
    }

    /// Shorthand for a document open/close failure.
    pub fn document(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        CamError::Document {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Environment errors skip the current part instead of failing it.
    pub fn is_environment(&self) -> bool {
        matches!(
            self,
            CamError::AddinMissing { .. }
                | CamError::AddinLoadFailed { .. }
                | CamError::AddinNotResponding
                | CamError::NotACamPart
        )
    }

    /// Get the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            CamError::AddinMissing { .. } => ErrorCode::AddinMissing,
            CamError::AddinLoadFailed { .. } => ErrorCode::AddinLoadFailed,
            CamError::AddinNotResponding => ErrorCode::AddinNotResponding,
            CamError::NotACamPart => ErrorCode::NotACamPart,
            CamError::Document { .. } => ErrorCode::Document,
            CamError::Engine { .. } => ErrorCode::Engine,
            CamError::Cancelled => ErrorCode::Cancelled,
        }
    }

    /// Get the numeric error code value.
    pub fn code_value(&self) -> i32 {
        self.code() as i32
    }
}

/// Batch-level errors. Reported before the CAD host is touched.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Directory '{}' does not exist!", .path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("Directory '{}' does not contain any '*.{extension}' part files!", .path.display())]
    NoPartFiles { path: PathBuf, extension: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BatchError {
    /// Get the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            BatchError::DirectoryNotFound { .. } => ErrorCode::DirectoryNotFound,
            BatchError::NoPartFiles { .. } => ErrorCode::NoPartFiles,
            BatchError::Io(_) => ErrorCode::Io,
        }
    }
}

/// Result type alias for CAD/CAM calls.
pub type Result<T> = std::result::Result<T, CamError>;
