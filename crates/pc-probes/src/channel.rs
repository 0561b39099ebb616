//! Per-probe calibration and conditioning state.

use pc_core::{KELVIN_OFFSET, ProbeId};
use serde::{Deserialize, Serialize};

use crate::error::{ProbeError, ProbeResult};
use crate::thermistor::{
    Divider, OPEN_CIRCUIT_THRESHOLD, SHORT_CIRCUIT_THRESHOLD, SteinhartHart,
};

/// Health of a probe channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    Ok,
    /// ADC reads near full scale: probe unplugged.
    OpenCircuit,
    /// ADC reads near zero: probe leads shorted.
    ShortCircuit,
}

impl ProbeStatus {
    /// Fault classification of a raw count, `None` when the count is in range.
    pub fn classify(raw: i16) -> Option<ProbeStatus> {
        if raw >= OPEN_CIRCUIT_THRESHOLD {
            Some(ProbeStatus::OpenCircuit)
        } else if raw <= SHORT_CIRCUIT_THRESHOLD {
            Some(ProbeStatus::ShortCircuit)
        } else {
            None
        }
    }

    pub fn is_ok(self) -> bool {
        matches!(self, ProbeStatus::Ok)
    }
}

/// Calibration of one probe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeCalibration {
    #[serde(flatten)]
    pub coefficients: SteinhartHart,
    /// Additive correction applied after conversion (°C).
    #[serde(default)]
    pub offset_c: f64,
}

impl Default for ProbeCalibration {
    fn default() -> Self {
        Self {
            coefficients: SteinhartHart::default(),
            offset_c: 0.0,
        }
    }
}

impl ProbeCalibration {
    pub fn validate(&self) -> ProbeResult<()> {
        let fields = [
            ("a", self.coefficients.a),
            ("b", self.coefficients.b),
            ("c", self.coefficients.c),
            ("offset_c", self.offset_c),
        ];
        for (what, value) in fields {
            if !value.is_finite() {
                return Err(ProbeError::InvalidCalibration { what, value });
            }
        }
        Ok(())
    }
}

/// One physical probe: calibration plus runtime conditioning state.
///
/// The filtered temperature is only meaningful while the status is
/// [`ProbeStatus::Ok`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeChannel {
    id: ProbeId,
    calibration: ProbeCalibration,
    raw: i16,
    filtered_c: f64,
    status: ProbeStatus,
    /// Next valid reading seeds the filter instead of blending.
    first_reading: bool,
}

impl ProbeChannel {
    /// Channels start disconnected until their first valid sample.
    pub fn new(id: ProbeId) -> Self {
        Self {
            id,
            calibration: ProbeCalibration::default(),
            raw: 0,
            filtered_c: 0.0,
            status: ProbeStatus::OpenCircuit,
            first_reading: true,
        }
    }

    pub fn id(&self) -> ProbeId {
        self.id
    }

    pub fn calibration(&self) -> &ProbeCalibration {
        &self.calibration
    }

    pub fn set_calibration(&mut self, calibration: ProbeCalibration) {
        self.calibration = calibration;
    }

    pub fn raw(&self) -> i16 {
        self.raw
    }

    pub fn status(&self) -> ProbeStatus {
        self.status
    }

    /// Filtered temperature in °C, `None` while the probe is in fault.
    pub fn temperature_c(&self) -> Option<f64> {
        self.status.is_ok().then_some(self.filtered_c)
    }

    /// Last filtered value regardless of status (stale while in fault).
    pub fn last_filtered_c(&self) -> f64 {
        self.filtered_c
    }

    /// Run one sampling tick on a raw count.
    pub fn ingest(&mut self, raw: i16, divider: &Divider, alpha: f64) -> ProbeStatus {
        self.raw = raw;

        if let Some(fault) = ProbeStatus::classify(raw) {
            return self.fault(fault);
        }

        let resistance = divider.resistance(raw);
        if resistance <= 0.0 {
            return self.fault(ProbeStatus::ShortCircuit);
        }

        let Some(temp_k) = self.calibration.coefficients.temperature_k(resistance) else {
            // Degenerate Steinhart–Hart result: no usable reading.
            return self.fault(ProbeStatus::OpenCircuit);
        };
        let temp_c = temp_k - KELVIN_OFFSET + self.calibration.offset_c;

        if self.first_reading {
            self.filtered_c = temp_c;
            self.first_reading = false;
        } else {
            self.filtered_c = alpha * temp_c + (1.0 - alpha) * self.filtered_c;
        }

        self.set_status(ProbeStatus::Ok);
        self.status
    }

    /// Mark the channel as having produced no sample this tick.
    pub fn mark_unreadable(&mut self) -> ProbeStatus {
        self.fault(ProbeStatus::OpenCircuit)
    }

    fn fault(&mut self, status: ProbeStatus) -> ProbeStatus {
        self.first_reading = true;
        self.set_status(status);
        status
    }

    fn set_status(&mut self, status: ProbeStatus) {
        if self.status != status {
            match status {
                ProbeStatus::Ok => {
                    tracing::info!(probe = %self.id, temp_c = self.filtered_c, "probe connected")
                }
                ProbeStatus::OpenCircuit => {
                    tracing::warn!(probe = %self.id, raw = self.raw, "probe open circuit")
                }
                ProbeStatus::ShortCircuit => {
                    tracing::warn!(probe = %self.id, raw = self.raw, "probe short circuit")
                }
            }
        }
        self.status = status;
    }
}
