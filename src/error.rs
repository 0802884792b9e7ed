//! Error types for the raycast vehicle controller.

use std::fmt;

use crate::dynamics::wheel::WheelHandle;

/// Result type for controller operations.
pub type Result<T> = std::result::Result<T, VehicleError>;

/// Errors surfaced by the controller and its configuration layer.
///
/// Per-tick physical edge cases (no ray hit, zero relative velocity) are not
/// errors; they are ordinary branches of the solver.
#[derive(Debug, Clone, PartialEq)]
pub enum VehicleError {
    /// Malformed wheel or vehicle configuration, or an out-of-domain input.
    InvalidConfiguration {
        /// The offending option.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
    /// `tick` was called with a non-positive or non-finite timestep.
    InvalidTimestep(f32),
    /// `tick` was called while no chassis body is bound, or the bound body no
    /// longer exists in the physics backend.
    MissingChassis,
    /// A wheel handle that this controller never issued.
    UnknownWheel(WheelHandle),
    /// Reading a configuration file failed.
    ConfigIo {
        /// The path that could not be read.
        path: String,
        /// The error message.
        message: String,
    },
    /// A configuration document could not be parsed.
    ConfigParse(String),
}

impl VehicleError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        VehicleError::InvalidConfiguration {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for VehicleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleError::InvalidConfiguration { field, reason } => {
                write!(f, "invalid configuration for `{field}`: {reason}")
            }
            VehicleError::InvalidTimestep(dt) => {
                write!(f, "invalid timestep {dt}: must be finite and > 0")
            }
            VehicleError::MissingChassis => write!(f, "no chassis body is bound to the vehicle"),
            VehicleError::UnknownWheel(handle) => write!(f, "unknown wheel {handle}"),
            VehicleError::ConfigIo { path, message } => {
                write!(f, "failed to read vehicle config {path}: {message}")
            }
            VehicleError::ConfigParse(message) => {
                write!(f, "failed to parse vehicle config: {message}")
            }
        }
    }
}

impl std::error::Error for VehicleError {}

impl From<serde_json::Error> for VehicleError {
    fn from(e: serde_json::Error) -> Self {
        VehicleError::ConfigParse(e.to_string())
    }
}
