//! Error types for probe configuration and ADC access.

use thiserror::Error;

/// Result type for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors from configuring probes or reading the ADC.
///
/// Sensor faults (open/short circuit) are not errors; they are reported as
/// [`crate::ProbeStatus`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProbeError {
    /// Smoothing factor outside `(0, 1]`.
    #[error("EMA alpha must be in (0, 1], got {alpha}")]
    InvalidAlpha { alpha: f64 },

    /// Calibration value that is not a finite number.
    #[error("Invalid calibration: {what} = {value}")]
    InvalidCalibration { what: &'static str, value: f64 },

    /// ADC channel the source does not have.
    #[error("No such ADC channel: {channel}")]
    NoSuchChannel { channel: u8 },

    /// The source failed to produce a sample.
    #[error("ADC read failed on channel {channel}: {what}")]
    Read { channel: u8, what: String },

    /// Bus-level failure while configuring the converter.
    #[error("ADC bus error: {what}")]
    Bus { what: String },
}
