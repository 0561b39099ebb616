//! Probe signal conditioning for the pit controller.
//!
//! Turns raw ADC counts from three NTC thermistor probes into calibrated,
//! fault-aware, smoothed temperatures.
//!
//! # Pipeline
//!
//! Per channel and sampling tick:
//! - fault check against open/short thresholds on the raw count
//! - pull-up divider inversion to thermistor resistance
//! - Steinhart–Hart conversion to absolute temperature, plus calibration offset
//! - exponential smoothing, bypassed on the first reading after a fault
//!
//! Faults are reported through [`ProbeStatus`], never as errors. A channel in
//! fault keeps its last filtered value untouched but reports "no data".
//!
//! The ADC is reached through the [`AnalogSource`] capability trait, with an
//! in-memory [`SimulatedSource`] and, behind the `ads1115` feature, an
//! ADS1115 implementation over any `embedded-hal` I²C bus.

#[cfg(feature = "ads1115")]
pub mod ads1115;
pub mod channel;
pub mod error;
pub mod manager;
pub mod source;
pub mod thermistor;

#[cfg(feature = "ads1115")]
pub use ads1115::Ads1115Source;
pub use channel::{ProbeCalibration, ProbeChannel, ProbeStatus};
pub use error::{ProbeError, ProbeResult};
pub use manager::{DEFAULT_EMA_ALPHA, SAMPLE_INTERVAL_MS, TempManager};
pub use source::{AnalogSource, SimulatedSource};
pub use thermistor::{Divider, SteinhartHart};
