//! Editor configuration.

use std::f64::consts::PI;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Wires on the default board.
pub const DEFAULT_QUBITS: usize = 3;
/// Columns on the default board.
pub const DEFAULT_DEPTH: usize = 18;
/// Angle added or removed by one rotate keystroke.
pub const DEFAULT_ROTATION_STEP: f64 = PI / 8.0;
/// Where a saved program lands unless told otherwise.
pub const DEFAULT_OUTPUT: &str = "circuit.qasm";

/// Settings for an editing session.
#[derive(Clone, Debug, PartialEq)]
pub struct EditorConfig {
    pub qubit_count: usize,
    pub depth: usize,
    pub rotation_step: f64,
    pub output_path: PathBuf,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            qubit_count: DEFAULT_QUBITS,
            depth: DEFAULT_DEPTH,
            rotation_step: DEFAULT_ROTATION_STEP,
            output_path: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

impl EditorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.qubit_count == 0 {
            return Err(ConfigError::NoQubits);
        }
        if self.depth == 0 {
            return Err(ConfigError::NoColumns);
        }
        if !self.rotation_step.is_finite() || self.rotation_step == 0.0 {
            return Err(ConfigError::InvalidRotationStep(self.rotation_step));
        }
        Ok(())
    }
}
