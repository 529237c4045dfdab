//! Per-part pipeline: synchronize, calculate, generate, release.

use super::{bind, AddinConnector, BoundPart, CalculationReport, CodeGenerator, OperationCalculator};
use crate::batch::CancellationToken;
use crate::config::ProcessOptions;
use crate::error::Result;
use crate::host::{CadDocument, CadHost, CamEngine, CamPart};
use crate::model::{PartOutcome, PartReport};
use tracing::{debug, error, warn};

/// Drives one open document through the CAM phases.
pub struct PartPipeline<'a, H: CadHost, E: CamEngine> {
    host: &'a mut H,
    engine: &'a mut E,
    options: &'a ProcessOptions,
    cancel: &'a CancellationToken,
}

impl<'a, H: CadHost, E: CamEngine> PartPipeline<'a, H, E> {
    pub fn new(
        host: &'a mut H,
        engine: &'a mut E,
        options: &'a ProcessOptions,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            host,
            engine,
            options,
            cancel,
        }
    }

    /// Process the document that is currently open in the host.
    ///
    /// Never returns an error: environment problems skip the part, engine
    /// failures fail it. Once bound, the CAM part is released on every path.
    pub fn process(&mut self, document: &CadDocument) -> PartReport {
        let mut report = PartReport::new(&document.path);

        let connector = AddinConnector::new(&self.options.addin_path);
        let bound = connector
            .ensure_active(&mut *self.host, &mut *self.engine)
            .and_then(|mut app| bind(&mut app));
        let mut part = match bound {
            Ok(part) => part,
            Err(e) => {
                warn!(" - {}", e);
                report.outcome = PartOutcome::from_error(&e);
                return report;
            }
        };

        let phases = self.run_phases(&mut part, &mut report);
        let released = part.release();

        // A failed phase outranks a failed release.
        if let Err(e) = phases.and(released) {
            error!(" - {}", e);
            report.outcome = PartOutcome::from_error(&e);
        }
        report
    }

    fn run_phases<P: CamPart>(&self, part: &mut BoundPart<P>, report: &mut PartReport) -> Result<()> {
        let in_sync = part.check_synchronization()?;
        debug!(" - Check Synchronize: {}", in_sync);
        report.in_sync = Some(in_sync);

        let synchronized = part.synchronize()?;
        debug!(" - Synchronize: {}", synchronized);
        report.synchronized = Some(synchronized);

        if !self.options.calculate_operations {
            debug!(" - Operation calculation disabled");
            return Ok(());
        }

        let mut calculation = CalculationReport::default();
        let calculated = OperationCalculator::new(self.cancel).calculate(&mut **part, &mut calculation);
        report.operations = calculation.operations;
        report.anomalies = calculation.anomalies;
        calculated?;

        if self.options.generate_gcode {
            report.gcode_generated = Some(CodeGenerator.generate(&mut **part)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::host::simulated::{self, EngineCall, OperationFixture, PartFixture, SimulatedCad, SimulatedCam};
    use crate::model::OperationOutcome;
    use tempfile::TempDir;

    struct Bench {
        dir: TempDir,
        cad: SimulatedCad,
        cam: SimulatedCam,
        options: ProcessOptions,
    }

    impl Bench {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let addin = dir.path().join("HostLib.dll");
            std::fs::write(&addin, b"").unwrap();
            let (cad, cam) = simulated::session();
            Self {
                dir,
                cad,
                cam,
                options: ProcessOptions::new(addin),
            }
        }

        fn run(&mut self, fixture: PartFixture) -> PartReport {
            let path = self.dir.path().join("part.sldprt");
            fixture.write_to(&path).unwrap();
            let document = self.cad.open_part(&path).unwrap();
            let cancel = CancellationToken::new();
            let report = PartPipeline::new(&mut self.cad, &mut self.cam, &self.options, &cancel)
                .process(&document);
            self.cad.close_document(&document).unwrap();
            report
        }
    }

    fn abc() -> PartFixture {
        PartFixture::with_operations([
            OperationFixture::ok("A"),
            OperationFixture::failing("B"),
            OperationFixture::ok("C"),
        ])
    }

    #[test]
    fn test_full_pipeline() {
        let mut bench = Bench::new();
        let report = bench.run(abc());

        assert!(report.outcome.is_completed());
        assert_eq!(report.in_sync, Some(true));
        assert_eq!(report.synchronized, Some(true));
        let outcomes: Vec<_> = report.operations.iter().map(|op| op.outcome).collect();
        assert_eq!(
            outcomes,
            vec![
                OperationOutcome::Calculated,
                OperationOutcome::Suppressed,
                OperationOutcome::Calculated
            ]
        );
        assert_eq!(report.gcode_generated, Some(true));

        let stats = bench.cad.session().stats();
        assert_eq!(stats.gcode_runs, 1);
        assert_eq!(stats.part_releases, 1);
        assert_eq!(stats.models_closed_by_cam, 0);
    }

    #[test]
    fn test_calculation_disabled() {
        let mut bench = Bench::new();
        bench.options.calculate_operations = false;
        let report = bench.run(abc());

        assert!(report.outcome.is_completed());
        assert!(report.operations.is_empty());
        assert_eq!(report.gcode_generated, None);
        let stats = bench.cad.session().stats();
        assert_eq!(stats.gcode_runs, 0);
        assert_eq!(stats.part_releases, 1);
    }

    #[test]
    fn test_generation_disabled() {
        let mut bench = Bench::new();
        bench.options.generate_gcode = false;
        let report = bench.run(abc());
        assert_eq!(report.operations.len(), 3);
        assert_eq!(report.gcode_generated, None);
        assert_eq!(bench.cad.session().stats().gcode_runs, 0);
    }

    #[test]
    fn test_missing_addin_skips_without_cam_calls() {
        let mut bench = Bench::new();
        bench.options.addin_path = bench.dir.path().join("missing.dll");
        let report = bench.run(abc());

        assert_eq!(report.outcome.code(), Some(ErrorCode::AddinMissing));
        assert!(report.outcome.is_skipped());
        let stats = bench.cad.session().stats();
        assert_eq!(stats.load_requests, 0);
        assert_eq!(stats.attaches, 0);
        assert_eq!(stats.part_releases, 0);
    }

    #[test]
    fn test_not_a_cam_part() {
        let mut bench = Bench::new();
        let report = bench.run(PartFixture::not_cam());
        assert_eq!(report.outcome.code(), Some(ErrorCode::NotACamPart));
        assert_eq!(bench.cad.session().stats().part_releases, 0);
    }

    #[test]
    fn test_engine_fault_fails_part_and_releases() {
        let mut bench = Bench::new();
        let report = bench.run(abc().with_fault(EngineCall::Synchronize));

        assert!(report.outcome.is_failed());
        assert_eq!(report.outcome.code(), Some(ErrorCode::Engine));
        assert_eq!(report.in_sync, Some(true));
        assert_eq!(report.synchronized, None);
        assert_eq!(bench.cad.session().stats().part_releases, 1);
    }

    #[test]
    fn test_calculation_fault_keeps_partial_results() {
        let mut bench = Bench::new();
        let report = bench.run(PartFixture::with_operations([
            OperationFixture::ok("A"),
            OperationFixture::faulty("B"),
        ]));

        assert!(report.outcome.is_failed());
        assert_eq!(report.operations.len(), 1);
        assert_eq!(report.gcode_generated, None);
        let stats = bench.cad.session().stats();
        assert_eq!(stats.gcode_runs, 0);
        assert_eq!(stats.part_releases, 1);
    }

    fn failure_message(report: &PartReport) -> &str {
        match &report.outcome {
            PartOutcome::Failed { message, .. } => message,
            other => panic!("expected a failed part, got {:?}", other),
        }
    }

    #[test]
    fn test_release_fault_fails_completed_part() {
        let mut bench = Bench::new();
        let report = bench.run(abc().with_fault(EngineCall::Close));

        assert!(report.outcome.is_failed());
        assert_eq!(report.outcome.code(), Some(ErrorCode::Engine));
        assert!(failure_message(&report).contains("'close'"));
        // Work done before the release is still reported.
        assert_eq!(report.operations.len(), 3);
        assert_eq!(report.gcode_generated, Some(true));

        let stats = bench.cad.session().stats();
        assert_eq!(stats.part_releases, 1);
        assert_eq!(stats.documents_closed, 1);
        assert_eq!(bench.cad.session().active_document(), None);
    }

    #[test]
    fn test_phase_fault_outranks_release_fault() {
        let mut bench = Bench::new();
        let fixture = PartFixture::with_operations([OperationFixture::faulty("A")]).with_fault(EngineCall::Close);
        let report = bench.run(fixture);

        assert!(report.outcome.is_failed());
        assert!(failure_message(&report).contains("'calculate'"));
        assert_eq!(bench.cad.session().stats().part_releases, 1);
    }

    #[test]
    fn test_out_of_sync_is_informational() {
        let mut bench = Bench::new();
        let mut fixture = abc();
        fixture.in_sync = false;
        let report = bench.run(fixture);
        assert!(report.outcome.is_completed());
        assert_eq!(report.in_sync, Some(false));
        assert_eq!(report.synchronized, Some(true));
    }
}
