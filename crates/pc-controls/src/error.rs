//! Error types for control configuration.

use thiserror::Error;

/// Result type for control system operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur when configuring the control loop.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Fan mode label that is not one of the known modes.
    #[error("Unknown fan mode: {label}")]
    UnknownFanMode { label: String },
}
