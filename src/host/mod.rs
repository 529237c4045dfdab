//! Collaborator interfaces for the CAD host and its CAM add-in.
//!
//! The CAD application and the CAM engine are external, stateful automation
//! surfaces. The core only talks to them through the narrow traits below, so
//! a real automation binding and the file-backed [`simulated`] backend are
//! interchangeable.

mod gcode;
pub mod simulated;

pub use gcode::GcodeWriter;

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Result of asking the CAD host to load an add-in module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddinLoadStatus {
    /// The add-in was loaded by this call.
    Loaded,
    /// The add-in was already active in the host process.
    AlreadyLoaded,
    /// The host refused to load the add-in.
    Failed(i32),
}

impl AddinLoadStatus {
    /// Both "loaded now" and "already loaded" count as active.
    pub fn is_active(&self) -> bool {
        matches!(self, AddinLoadStatus::Loaded | AddinLoadStatus::AlreadyLoaded)
    }
}

/// An open part document inside the CAD host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CadDocument {
    /// Path the host resolved for the open document. Used to close it.
    pub path: PathBuf,
}

impl CadDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File name for progress output.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// The CAD application hosting part documents and the CAM add-in.
pub trait CadHost {
    /// Open a part document silently.
    fn open_part(&mut self, path: &Path) -> Result<CadDocument>;

    /// Close a document by its resolved path.
    fn close_document(&mut self, document: &CadDocument) -> Result<()>;

    /// Assert or clear the process-wide "command in progress" lock.
    fn set_command_in_progress(&mut self, in_progress: bool);

    /// Request the add-in module at `path` to be loaded.
    fn load_addin(&mut self, path: &Path) -> AddinLoadStatus;
}

/// Entry point into the CAM add-in's API.
pub trait CamEngine {
    type App: CamApplication;

    /// Launch/attach the CAM application from the CAD host.
    fn launch_from_cad(&mut self) -> Option<Self::App>;
}

/// Attached CAM application handle.
pub trait CamApplication {
    type Part: CamPart;

    /// The CAM part bound to the active CAD document, if any.
    fn current_part(&mut self) -> Option<Self::Part>;
}

/// CAM-side representation of the active part.
pub trait CamPart {
    type Operation: CamOperation;

    /// Whether the CAM part is in sync with the design model.
    fn check_synchronization(&mut self) -> Result<bool>;

    /// Synchronize the CAM part with the design model.
    fn synchronize(&mut self) -> Result<bool>;

    /// Number of entries in the ordered operation list.
    fn operation_count(&mut self) -> Result<usize>;

    /// Operation at `index`, or `None` when the entry is not a readable operation.
    fn operation(&mut self, index: usize) -> Result<Option<Self::Operation>>;

    /// Emit machine code for every non-suppressed operation.
    fn generate_gcode(&mut self) -> Result<bool>;

    /// Close the CAM part. `close_document` also closes the CAD model.
    fn close(&mut self, close_document: bool) -> Result<()>;
}

/// One machining operation of a CAM part.
pub trait CamOperation {
    fn name(&self) -> Result<String>;

    /// Recalculate the toolpath. Blocks until the engine is done.
    fn calculate(&mut self, force: bool) -> Result<()>;

    fn is_calculated(&self) -> Result<bool>;

    fn is_suppressed(&self) -> Result<bool>;

    fn set_suppressed(&mut self, suppressed: bool) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addin_status_active() {
        assert!(AddinLoadStatus::Loaded.is_active());
        assert!(AddinLoadStatus::AlreadyLoaded.is_active());
        assert!(!AddinLoadStatus::Failed(-1).is_active());
    }

    #[test]
    fn test_document_file_name() {
        let doc = CadDocument::new("/parts/bracket.SLDPRT");
        assert_eq!(doc.file_name(), "bracket.SLDPRT");
    }
}
