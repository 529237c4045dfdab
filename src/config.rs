//! Configuration constants and processing options.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default location of the CAM add-in module inside the CAD host.
pub const DEFAULT_ADDIN_PATH: &str = "C:\\Program Files\\SolidCAM2023\\Solidcam\\HostLibSW.dll";

/// Part-file extension matched during directory enumeration.
pub const DEFAULT_PART_EXTENSION: &str = "sldprt";

/// Options controlling which phases run for each part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProcessOptions {
    /// Run the calculation phase.
    pub calculate_operations: bool,
    /// Run the code-generation phase. Only honored when calculation runs.
    #[serde(rename = "generateGCode")]
    pub generate_gcode: bool,
    /// Path to the CAM add-in module.
    pub addin_path: PathBuf,
    /// Part-file extension, without the dot.
    pub part_extension: String,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            calculate_operations: true,
            generate_gcode: true,
            addin_path: PathBuf::from(DEFAULT_ADDIN_PATH),
            part_extension: DEFAULT_PART_EXTENSION.to_string(),
        }
    }
}

impl ProcessOptions {
    /// Create options with both phases enabled and the given add-in path.
    pub fn new(addin_path: impl Into<PathBuf>) -> Self {
        Self {
            addin_path: addin_path.into(),
            ..Default::default()
        }
    }

    /// Load options from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Whether code generation will actually run.
    pub fn code_generation_enabled(&self) -> bool {
        self.calculate_operations && self.generate_gcode
    }

    /// Check whether a path carries the configured part extension (case-insensitive).
    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(self.part_extension.trim_start_matches('.')))
            .unwrap_or(false)
    }
}
