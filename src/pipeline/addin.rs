//! Activation of the CAM add-in inside the CAD host.

use crate::error::{CamError, Result};
use crate::host::{AddinLoadStatus, CadHost, CamEngine};
use std::path::PathBuf;
use tracing::debug;

/// Ensures the CAM add-in is active and hands out its API handle.
#[derive(Debug, Clone)]
pub struct AddinConnector {
    path: PathBuf,
}

impl AddinConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the add-in if needed and attach to its API.
    ///
    /// Safe to call once per part: a host that already has the add-in loaded
    /// answers [`AddinLoadStatus::AlreadyLoaded`], which counts as success.
    pub fn ensure_active<H, E>(&self, host: &mut H, engine: &mut E) -> Result<E::App>
    where
        H: CadHost,
        E: CamEngine,
    {
        if !self.path.is_file() {
            return Err(CamError::AddinMissing {
                path: self.path.clone(),
            });
        }

        let status = host.load_addin(&self.path);
        debug!("Load add-in '{}': {:?}", self.path.display(), status);
        if let AddinLoadStatus::Failed(code) = status {
            return Err(CamError::AddinLoadFailed { code });
        }

        engine.launch_from_cad().ok_or(CamError::AddinNotResponding)
    }
}
