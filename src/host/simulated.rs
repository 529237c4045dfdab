//! File-backed simulation of the CAD host and CAM add-in.
//!
//! Each part file holds a JSON [`PartFixture`] describing its CAM setup. The
//! host and engine share one [`SimulatedSession`], which records every call in
//! a journal and keeps counters that tests and dry runs can inspect.

use super::{
    AddinLoadStatus, CadDocument, CadHost, CamApplication, CamEngine, CamOperation, CamPart,
    GcodeWriter,
};
use crate::error::{CamError, Result};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

fn yes() -> bool {
    true
}

/// Engine calls that a fixture can make raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineCall {
    CheckSynchronization,
    Synchronize,
    OperationCount,
    GenerateGcode,
    Close,
}

/// CAM setup of one simulated part file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartFixture {
    /// Whether the document carries a CAM part at all.
    pub cam: bool,
    /// Whether the CAM part starts in sync with the model.
    pub in_sync: bool,
    /// Ordered operation list. `None` entries are unreadable.
    pub operations: Vec<Option<OperationFixture>>,
    /// Engine call that raises for this part.
    pub fault: Option<EngineCall>,
}

impl Default for PartFixture {
    fn default() -> Self {
        Self {
            cam: true,
            in_sync: true,
            operations: Vec::new(),
            fault: None,
        }
    }
}

impl PartFixture {
    /// A CAM part with the given operations.
    pub fn with_operations(operations: impl IntoIterator<Item = OperationFixture>) -> Self {
        Self {
            operations: operations.into_iter().map(Some).collect(),
            ..Default::default()
        }
    }

    /// A plain design part without CAM data.
    pub fn not_cam() -> Self {
        Self {
            cam: false,
            ..Default::default()
        }
    }

    /// Make `call` raise.
    pub fn with_fault(mut self, call: EngineCall) -> Self {
        self.fault = Some(call);
        self
    }

    /// Serialize and write the fixture as a part file.
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }
}

/// One simulated machining operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationFixture {
    pub name: String,
    /// Whether the toolpath calculates on its own.
    #[serde(default = "yes")]
    pub calculates: bool,
    /// Earlier operation that must already be calculated for this one to calculate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<String>,
    /// `calculate` raises instead of failing quietly.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fault: bool,
    /// Suppressed before processing starts.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub suppressed: bool,
}

impl OperationFixture {
    /// An operation that calculates.
    pub fn ok(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calculates: true,
            requires: None,
            fault: false,
            suppressed: false,
        }
    }

    /// An operation that fails to calculate.
    pub fn failing(name: &str) -> Self {
        Self {
            calculates: false,
            ..Self::ok(name)
        }
    }

    /// An operation whose `calculate` raises an engine error.
    pub fn faulty(name: &str) -> Self {
        Self {
            fault: true,
            ..Self::ok(name)
        }
    }

    /// Make this operation depend on an earlier one.
    pub fn requires(mut self, name: &str) -> Self {
        self.requires = Some(name.to_string());
        self
    }
}

/// Call counters kept by the simulated session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub load_requests: usize,
    pub addin_loads: usize,
    pub attaches: usize,
    pub documents_opened: usize,
    pub documents_closed: usize,
    pub parts_bound: usize,
    pub part_releases: usize,
    pub models_closed_by_cam: usize,
    pub gcode_runs: usize,
}

#[derive(Debug)]
struct OperationState {
    fixture: OperationFixture,
    calculated: bool,
    suppressed: bool,
}

#[derive(Debug)]
struct ActivePart {
    path: PathBuf,
    fixture: PartFixture,
    in_sync: bool,
    operations: Vec<Option<OperationState>>,
    cam_open: bool,
    output: Option<PathBuf>,
}

impl ActivePart {
    fn new(path: PathBuf, fixture: PartFixture, output: Option<PathBuf>) -> Self {
        let operations = fixture
            .operations
            .iter()
            .map(|entry| {
                entry.clone().map(|fixture| OperationState {
                    suppressed: fixture.suppressed,
                    fixture,
                    calculated: false,
                })
            })
            .collect();
        Self {
            path,
            in_sync: fixture.in_sync,
            fixture,
            operations,
            cam_open: false,
            output,
        }
    }

    fn part_name(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[derive(Debug, Default)]
struct Session {
    addin_loaded: bool,
    forced_load_status: Option<AddinLoadStatus>,
    unresponsive: bool,
    command_in_progress: bool,
    active: Option<ActivePart>,
    journal: Vec<String>,
    stats: SessionStats,
    last_program: Option<String>,
}

impl Session {
    fn log(&mut self, entry: String) {
        debug!("simulated: {}", entry);
        self.journal.push(entry);
    }

    fn live_part(&mut self, call: &'static str) -> Result<&mut ActivePart> {
        match self.active.as_mut() {
            Some(part) if part.cam_open => {
                if part.fixture.fault.map(fault_name) == Some(call) {
                    return Err(CamError::engine(call, "simulated engine fault"));
                }
                Ok(part)
            }
            _ => Err(CamError::engine(call, "CAM part is not open")),
        }
    }
}

fn fault_name(call: EngineCall) -> &'static str {
    match call {
        EngineCall::CheckSynchronization => "check_synchronization",
        EngineCall::Synchronize => "synchronize",
        EngineCall::OperationCount => "operation_count",
        EngineCall::GenerateGcode => "generate_gcode",
        EngineCall::Close => "close",
    }
}

/// Shared view on a simulated session, for inspection.
#[derive(Debug, Clone, Default)]
pub struct SimulatedSession(Rc<RefCell<Session>>);

impl SimulatedSession {
    /// Every call made against the simulation, in order.
    pub fn journal(&self) -> Vec<String> {
        self.0.borrow().journal.clone()
    }

    pub fn stats(&self) -> SessionStats {
        self.0.borrow().stats.clone()
    }

    pub fn command_in_progress(&self) -> bool {
        self.0.borrow().command_in_progress
    }

    pub fn addin_loaded(&self) -> bool {
        self.0.borrow().addin_loaded
    }

    /// Path of the document currently open in the host.
    pub fn active_document(&self) -> Option<PathBuf> {
        self.0.borrow().active.as_ref().map(|part| part.path.clone())
    }

    /// `(calculated, suppressed)` per operation of the active part.
    pub fn operation_flags(&self) -> Vec<Option<(bool, bool)>> {
        self.0
            .borrow()
            .active
            .as_ref()
            .map(|part| {
                part.operations
                    .iter()
                    .map(|op| op.as_ref().map(|op| (op.calculated, op.suppressed)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Text of the most recent generated program.
    pub fn last_program(&self) -> Option<String> {
        self.0.borrow().last_program.clone()
    }
}

/// Create a simulated host and engine sharing one session.
pub fn session() -> (SimulatedCad, SimulatedCam) {
    let shared = SimulatedSession::default();
    (
        SimulatedCad {
            session: shared.clone(),
        },
        SimulatedCam { session: shared },
    )
}

/// Simulated CAD host.
#[derive(Debug, Clone)]
pub struct SimulatedCad {
    session: SimulatedSession,
}

impl SimulatedCad {
    /// Force every add-in load request to return `status`.
    pub fn with_load_status(self, status: AddinLoadStatus) -> Self {
        self.session.0.borrow_mut().forced_load_status = Some(status);
        self
    }

    pub fn session(&self) -> &SimulatedSession {
        &self.session
    }
}

impl CadHost for SimulatedCad {
    fn open_part(&mut self, path: &Path) -> Result<CadDocument> {
        let content =
            std::fs::read_to_string(path).map_err(|e| CamError::document(path, e.to_string()))?;
        let fixture: PartFixture = serde_json::from_str(&content)
            .map_err(|e| CamError::document(path, format!("not a part document: {}", e)))?;
        let resolved =
            std::fs::canonicalize(path).map_err(|e| CamError::document(path, e.to_string()))?;

        let mut session = self.session.0.borrow_mut();
        if let Some(open) = &session.active {
            return Err(CamError::document(
                path,
                format!("'{}' is still open", open.path.display()),
            ));
        }
        let output = resolved.with_extension("nc");
        session.active = Some(ActivePart::new(resolved.clone(), fixture, Some(output)));
        session.stats.documents_opened += 1;
        session.log(format!("open:{}", CadDocument::new(&resolved).file_name()));
        Ok(CadDocument::new(resolved))
    }

    fn close_document(&mut self, document: &CadDocument) -> Result<()> {
        let mut session = self.session.0.borrow_mut();
        match &session.active {
            Some(open) if open.path == document.path => {
                session.active = None;
                session.stats.documents_closed += 1;
                session.log(format!("close:{}", document.file_name()));
                Ok(())
            }
            _ => Err(CamError::document(&document.path, "document is not open")),
        }
    }

    fn set_command_in_progress(&mut self, in_progress: bool) {
        let mut session = self.session.0.borrow_mut();
        session.command_in_progress = in_progress;
        session.log(format!("busy:{}", in_progress));
    }

    fn load_addin(&mut self, _path: &Path) -> AddinLoadStatus {
        let mut session = self.session.0.borrow_mut();
        session.stats.load_requests += 1;
        let status = match session.forced_load_status {
            Some(status) => status,
            None if session.addin_loaded => AddinLoadStatus::AlreadyLoaded,
            None => {
                session.addin_loaded = true;
                session.stats.addin_loads += 1;
                AddinLoadStatus::Loaded
            }
        };
        session.log(format!("load_addin:{:?}", status));
        status
    }
}

/// Simulated CAM engine launcher.
#[derive(Debug, Clone)]
pub struct SimulatedCam {
    session: SimulatedSession,
}

impl SimulatedCam {
    /// Never attach, as if the add-in hung on startup.
    pub fn unresponsive(self) -> Self {
        self.session.0.borrow_mut().unresponsive = true;
        self
    }

    pub fn session(&self) -> &SimulatedSession {
        &self.session
    }
}

impl CamEngine for SimulatedCam {
    type App = SimulatedApp;

    fn launch_from_cad(&mut self) -> Option<SimulatedApp> {
        let mut session = self.session.0.borrow_mut();
        session.stats.attaches += 1;
        session.log("attach".to_string());
        if !session.addin_loaded || session.unresponsive {
            return None;
        }
        Some(SimulatedApp {
            session: self.session.clone(),
        })
    }
}

/// Simulated CAM application handle.
#[derive(Debug, Clone)]
pub struct SimulatedApp {
    session: SimulatedSession,
}

impl CamApplication for SimulatedApp {
    type Part = SimulatedPart;

    fn current_part(&mut self) -> Option<SimulatedPart> {
        let mut session = self.session.0.borrow_mut();
        let part = session.active.as_mut().filter(|part| part.fixture.cam)?;
        part.cam_open = true;
        session.stats.parts_bound += 1;
        session.log("bind".to_string());
        Some(SimulatedPart {
            session: self.session.clone(),
            released: false,
        })
    }
}

/// Simulated CAM part handle.
#[derive(Debug)]
pub struct SimulatedPart {
    session: SimulatedSession,
    released: bool,
}

impl SimulatedPart {
    /// A bound part without any host or file behind it.
    pub fn detached(name: &str, fixture: PartFixture) -> Self {
        let session = SimulatedSession::default();
        {
            let mut inner = session.0.borrow_mut();
            let mut part = ActivePart::new(PathBuf::from(name), fixture, None);
            part.cam_open = true;
            inner.active = Some(part);
            inner.stats.parts_bound += 1;
        }
        Self {
            session,
            released: false,
        }
    }

    pub fn session(&self) -> &SimulatedSession {
        &self.session
    }

    fn check_handle(&self, call: &'static str) -> Result<()> {
        if self.released {
            return Err(CamError::engine(call, "part handle was released"));
        }
        Ok(())
    }
}

impl CamPart for SimulatedPart {
    type Operation = SimulatedOperation;

    fn check_synchronization(&mut self) -> Result<bool> {
        self.check_handle("check_synchronization")?;
        let mut session = self.session.0.borrow_mut();
        let in_sync = session.live_part("check_synchronization")?.in_sync;
        session.log("check_synchronization".to_string());
        Ok(in_sync)
    }

    fn synchronize(&mut self) -> Result<bool> {
        self.check_handle("synchronize")?;
        let mut session = self.session.0.borrow_mut();
        session.live_part("synchronize")?.in_sync = true;
        session.log("synchronize".to_string());
        Ok(true)
    }

    fn operation_count(&mut self) -> Result<usize> {
        self.check_handle("operation_count")?;
        let mut session = self.session.0.borrow_mut();
        let count = session.live_part("operation_count")?.operations.len();
        Ok(count)
    }

    fn operation(&mut self, index: usize) -> Result<Option<SimulatedOperation>> {
        self.check_handle("operation")?;
        let mut session = self.session.0.borrow_mut();
        let part = session.live_part("operation")?;
        match part.operations.get(index) {
            Some(Some(_)) => Ok(Some(SimulatedOperation {
                session: self.session.clone(),
                index,
            })),
            Some(None) => Ok(None),
            None => Err(CamError::engine(
                "operation",
                format!("index {} out of range", index),
            )),
        }
    }

    fn generate_gcode(&mut self) -> Result<bool> {
        self.check_handle("generate_gcode")?;
        let mut session = self.session.0.borrow_mut();
        let part = session.live_part("generate_gcode")?;

        let mut writer = GcodeWriter::new();
        writer.begin_program(1, &part.part_name());
        for (index, op) in part.operations.iter().enumerate() {
            // Suppressed and uncalculated operations never reach the post-processor.
            let Some(op) = op else { continue };
            if op.suppressed || !op.calculated {
                continue;
            }
            writer.begin_operation(index, &op.fixture.name);
            writer.end_operation();
        }
        writer.end_program();
        let program = writer.take_output();

        let written = match &part.output {
            Some(output) => match std::fs::write(output, &program) {
                Ok(()) => true,
                Err(e) => {
                    debug!("simulated: cannot write {}: {}", output.display(), e);
                    false
                }
            },
            None => true,
        };

        session.stats.gcode_runs += 1;
        session.last_program = Some(program);
        session.log("generate_gcode".to_string());
        Ok(written)
    }

    fn close(&mut self, close_document: bool) -> Result<()> {
        self.check_handle("close")?;
        self.released = true;
        let mut session = self.session.0.borrow_mut();
        session.stats.part_releases += 1;
        session.log(format!("release:close_document={}", close_document));
        let part = session.live_part("close")?;
        part.cam_open = false;
        if close_document {
            session.active = None;
            session.stats.models_closed_by_cam += 1;
        }
        Ok(())
    }
}

/// Simulated operation handle (index into the active part).
#[derive(Debug, Clone)]
pub struct SimulatedOperation {
    session: SimulatedSession,
    index: usize,
}

impl SimulatedOperation {
    fn with_state<T>(
        &self,
        call: &'static str,
        f: impl FnOnce(&mut OperationState) -> T,
    ) -> Result<T> {
        let mut session = self.session.0.borrow_mut();
        let part = session.live_part(call)?;
        let state = part
            .operations
            .get_mut(self.index)
            .and_then(|op| op.as_mut())
            .ok_or_else(|| CamError::engine(call, "operation no longer exists"))?;
        Ok(f(state))
    }
}

impl CamOperation for SimulatedOperation {
    fn name(&self) -> Result<String> {
        self.with_state("name", |op| op.fixture.name.clone())
    }

    fn calculate(&mut self, _force: bool) -> Result<()> {
        let mut session = self.session.0.borrow_mut();
        let part = session.live_part("calculate")?;

        let (name, fault, calculates, requires) = match part.operations.get(self.index) {
            Some(Some(op)) => (
                op.fixture.name.clone(),
                op.fixture.fault,
                op.fixture.calculates,
                op.fixture.requires.clone(),
            ),
            _ => return Err(CamError::engine("calculate", "operation no longer exists")),
        };
        if fault {
            return Err(CamError::engine(
                "calculate",
                format!("engine raised while calculating '{}'", name),
            ));
        }

        let prerequisite_met = match &requires {
            Some(required) => part.operations[..self.index]
                .iter()
                .flatten()
                .any(|op| &op.fixture.name == required && op.calculated),
            None => true,
        };
        if let Some(Some(op)) = part.operations.get_mut(self.index) {
            op.calculated = calculates && prerequisite_met;
        }
        session.log(format!("calculate:{}", name));
        Ok(())
    }

    fn is_calculated(&self) -> Result<bool> {
        self.with_state("is_calculated", |op| op.calculated)
    }

    fn is_suppressed(&self) -> Result<bool> {
        self.with_state("is_suppressed", |op| op.suppressed)
    }

    fn set_suppressed(&mut self, suppressed: bool) -> Result<()> {
        let name = self.with_state("set_suppressed", |op| {
            op.suppressed = suppressed;
            op.fixture.name.clone()
        })?;
        self.session
            .0
            .borrow_mut()
            .log(format!("suppress:{}={}", name, suppressed));
        Ok(())
    }
}
