//! Batch loop over a directory of part files.

use super::{find_part_files, CancellationToken};
use crate::config::ProcessOptions;
use crate::error::BatchError;
use crate::host::{CadHost, CamEngine};
use crate::model::{BatchSummary, PartReport};
use crate::pipeline::PartPipeline;
use std::ops::{Deref, DerefMut};
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Holds the host's "command in progress" lock until dropped.
pub struct CommandInProgress<'a, H: CadHost> {
    host: &'a mut H,
}

impl<'a, H: CadHost> CommandInProgress<'a, H> {
    pub fn assert(host: &'a mut H) -> Self {
        host.set_command_in_progress(true);
        Self { host }
    }
}

impl<H: CadHost> Deref for CommandInProgress<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        &*self.host
    }
}

impl<H: CadHost> DerefMut for CommandInProgress<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        &mut *self.host
    }
}

impl<H: CadHost> Drop for CommandInProgress<'_, H> {
    fn drop(&mut self) {
        self.host.set_command_in_progress(false);
    }
}

/// Opens each part file, runs the [`PartPipeline`] on it and closes it again.
///
/// One part's failure never stops the batch; each file ends up as one
/// [`PartReport`] in the returned [`BatchSummary`].
pub struct BatchDriver<H: CadHost, E: CamEngine> {
    host: H,
    engine: E,
    cancel: CancellationToken,
}

impl<H: CadHost, E: CamEngine> BatchDriver<H, E> {
    pub fn new(host: H, engine: E) -> Self {
        Self {
            host,
            engine,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops the batch between parts and between operations.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Process every part file in `directory`.
    ///
    /// Directory problems are returned before the CAD host is touched.
    pub fn run(&mut self, directory: &Path, options: &ProcessOptions) -> Result<BatchSummary, BatchError> {
        let files = find_part_files(directory, options)?;

        info!(
            "Calculate Operations set to '{}'",
            options.calculate_operations
        );
        info!("Generate G Code set to '{}'", options.generate_gcode);
        if options.generate_gcode && !options.code_generation_enabled() {
            warn!("G-code generation needs calculated operations and will not run");
        }
        debug!("Found {} part file(s) in {}", files.len(), directory.display());

        let mut summary = BatchSummary::new(directory);
        let mut host = CommandInProgress::assert(&mut self.host);

        for file in &files {
            if self.cancel.is_cancelled() {
                warn!("Batch cancelled, {} file(s) not processed", files.len() - summary.parts.len());
                summary.cancelled = true;
                break;
            }

            let report = process_file(&mut *host, &mut self.engine, file, options, &self.cancel);
            summary.record(report);
        }

        drop(host);
        info!("{}", summary.headline());
        Ok(summary)
    }
}

fn process_file<H: CadHost, E: CamEngine>(
    host: &mut H,
    engine: &mut E,
    file: &Path,
    options: &ProcessOptions,
    cancel: &CancellationToken,
) -> PartReport {
    let display_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());
    info!("Processing '{}'", display_name);

    let document = match host.open_part(file) {
        Ok(document) => document,
        Err(e) => {
            error!(" - {}", e);
            return PartReport::from_error(file, &e);
        }
    };

    let mut report = PartPipeline::new(&mut *host, &mut *engine, options, cancel).process(&document);
    report.file = file.to_path_buf();

    match host.close_document(&document) {
        Ok(()) => report.document_closed = true,
        Err(e) => error!(" - Failed to close '{}': {}", document.path.display(), e),
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::simulated::{self, OperationFixture, PartFixture};
    use tempfile::TempDir;

    #[test]
    fn test_lock_cleared_on_drop() {
        let (mut cad, _cam) = simulated::session();
        let session = cad.session().clone();
        {
            let _lock = CommandInProgress::assert(&mut cad);
            assert!(session.command_in_progress());
        }
        assert!(!session.command_in_progress());
    }

    #[test]
    fn test_bad_directory_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let (cad, cam) = simulated::session();
        let session = cad.session().clone();
        let mut driver = BatchDriver::new(cad, cam);

        let result = driver.run(&dir.path().join("missing"), &ProcessOptions::default());
        assert!(matches!(result, Err(BatchError::DirectoryNotFound { .. })));
        assert!(session.journal().is_empty());
    }

    #[test]
    fn test_cancel_before_start() {
        let dir = TempDir::new().unwrap();
        PartFixture::with_operations([OperationFixture::ok("A")])
            .write_to(&dir.path().join("a.sldprt"))
            .unwrap();
        let (cad, cam) = simulated::session();
        let session = cad.session().clone();
        let mut driver = BatchDriver::new(cad, cam);
        driver.cancellation_token().cancel();

        let summary = driver.run(dir.path(), &ProcessOptions::default()).unwrap();
        assert!(summary.cancelled);
        assert!(summary.parts.is_empty());
        assert_eq!(session.journal(), vec!["busy:true", "busy:false"]);
    }
}
