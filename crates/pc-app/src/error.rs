//! Error types for the pc-app service layer.

use pc_controls::ControlError;
use pc_core::PcError;
use pc_history::TelemetryError;
use pc_probes::ProbeError;

use crate::config::ConfigError;

/// Unified error for the CLI and any other front end.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    #[error("Control error: {0}")]
    Control(#[from] ControlError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error(transparent)]
    Core(#[from] PcError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pc-app operations.
pub type AppResult<T> = Result<T, AppError>;
