//! Per-part CAM processing.
//!
//! [`PartPipeline`] composes the phases below for one open document:
//! add-in activation ([`AddinConnector`]), part binding ([`bind`]),
//! operation recalculation ([`OperationCalculator`]) and G-code emission
//! ([`CodeGenerator`]).

mod addin;
mod binding;
mod calculate;
mod generate;
mod part;

pub use addin::AddinConnector;
pub use binding::{bind, BoundPart};
pub use calculate::{CalculationReport, OperationCalculator};
pub use generate::CodeGenerator;
pub use part::PartPipeline;
