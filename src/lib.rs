//! cam-batch - Batch CAM processing of part files through a CAD host.
//!
//! For each part file in a directory the batch opens the document in the CAD
//! host, activates the CAM add-in, synchronizes the CAM part with the model,
//! recalculates every machining operation (suppressing the ones that fail),
//! optionally emits G-code, and closes everything again. One operation's
//! failure never aborts its part, and one part's failure never aborts the
//! batch.
//!
//! # Example
//!
//! ```no_run
//! use cam_batch_rs::{host::simulated, BatchDriver, ProcessOptions};
//! use std::path::Path;
//!
//! let (cad, cam) = simulated::session();
//! let mut driver = BatchDriver::new(cad, cam);
//! let options = ProcessOptions::new("HostLib.dll");
//! let summary = driver.run(Path::new("parts"), &options).unwrap();
//! println!("{}", summary.headline());
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod host;
pub mod model;
pub mod pipeline;

// Re-exports for convenience
pub use batch::{BatchDriver, CancellationToken};
pub use config::ProcessOptions;
pub use error::{BatchError, CamError, ErrorCode, Result};
pub use host::{AddinLoadStatus, CadDocument, CadHost, CamApplication, CamEngine, CamOperation, CamPart};
pub use model::{BatchSummary, BatchTotals, OperationOutcome, OperationReport, PartOutcome, PartReport};
pub use pipeline::{AddinConnector, CodeGenerator, OperationCalculator, PartPipeline};

/// Run a batch over `directory` with the file-backed simulated backend.
pub fn run_simulated(
    directory: &std::path::Path,
    options: &ProcessOptions,
) -> std::result::Result<BatchSummary, BatchError> {
    let (cad, cam) = host::simulated::session();
    BatchDriver::new(cad, cam).run(directory, options)
}
