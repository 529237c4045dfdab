//! Machine-code emission for a calculated part.

use crate::error::Result;
use crate::host::CamPart;
use tracing::info;

/// Triggers G-code emission. Suppressed operations are left out by the
/// engine itself; nothing is filtered here.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeGenerator;

impl CodeGenerator {
    pub fn generate<P: CamPart>(&self, part: &mut P) -> Result<bool> {
        let generated = part.generate_gcode()?;
        info!(" - Generate G Code: {}", generated);
        Ok(generated)
    }
}
