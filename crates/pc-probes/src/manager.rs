//! Sampling and conditioning of all probe channels.

use pc_core::{NUM_PROBES, ProbeId, SampleClock, TempUnit};

use crate::channel::{ProbeCalibration, ProbeChannel, ProbeStatus};
use crate::error::{ProbeError, ProbeResult};
use crate::source::AnalogSource;
use crate::thermistor::{Divider, SteinhartHart};

/// Probes are read once per second.
pub const SAMPLE_INTERVAL_MS: u64 = 1000;

/// Default smoothing factor (lower = smoother, less derivative noise).
pub const DEFAULT_EMA_ALPHA: f64 = 0.2;

/// Owns the probe channels and the converter they are read through.
///
/// [`TempManager::update`] is self-gating: call it on every loop iteration
/// and it samples only when the sampling interval has elapsed.
pub struct TempManager<S> {
    source: S,
    channels: [ProbeChannel; NUM_PROBES],
    divider: Divider,
    ema_alpha: f64,
    clock: SampleClock,
}

impl<S: AnalogSource> TempManager<S> {
    pub fn new(source: S) -> Self {
        Self::with_interval(source, SAMPLE_INTERVAL_MS)
    }

    pub fn with_interval(source: S, interval_ms: u64) -> Self {
        Self {
            source,
            channels: ProbeId::ALL.map(ProbeChannel::new),
            divider: Divider::default(),
            ema_alpha: DEFAULT_EMA_ALPHA,
            clock: SampleClock::new(interval_ms),
        }
    }

    /// Sample every channel if the interval has elapsed since the last sample.
    ///
    /// Returns `true` when a sample was taken.
    pub fn update(&mut self, now_ms: u64) -> bool {
        if !self.clock.poll(now_ms) {
            return false;
        }
        self.sample_all();
        true
    }

    /// Sample every channel once, ignoring the cadence.
    pub fn sample_all(&mut self) {
        for channel in &mut self.channels {
            let adc_channel = channel.id().adc_channel();
            match self.source.read_raw(adc_channel) {
                Ok(raw) => {
                    channel.ingest(raw, &self.divider, self.ema_alpha);
                }
                Err(err) => {
                    tracing::warn!(probe = %channel.id(), error = %err, "probe read failed");
                    channel.mark_unreadable();
                }
            }
        }
    }

    /// Latest filtered temperature in `unit`, `None` when the probe has no data.
    pub fn temperature(&self, probe: ProbeId, unit: TempUnit) -> Option<f64> {
        self.temperature_c(probe).map(|c| unit.from_celsius(c))
    }

    /// Latest filtered temperature in °C, `None` when the probe has no data.
    pub fn temperature_c(&self, probe: ProbeId) -> Option<f64> {
        self.channel(probe).temperature_c()
    }

    /// Temperatures of all probes in `unit`, indexed by probe.
    pub fn readings(&self, unit: TempUnit) -> [Option<f64>; NUM_PROBES] {
        ProbeId::ALL.map(|probe| self.temperature(probe, unit))
    }

    pub fn is_connected(&self, probe: ProbeId) -> bool {
        self.status(probe).is_ok()
    }

    pub fn status(&self, probe: ProbeId) -> ProbeStatus {
        self.channel(probe).status()
    }

    /// Last raw count (diagnostics).
    pub fn raw(&self, probe: ProbeId) -> i16 {
        self.channel(probe).raw()
    }

    pub fn channel(&self, probe: ProbeId) -> &ProbeChannel {
        &self.channels[probe.index()]
    }

    /// Set Steinhart–Hart coefficients for a probe, effective next sample.
    pub fn set_coefficients(&mut self, probe: ProbeId, a: f64, b: f64, c: f64) -> ProbeResult<()> {
        let calibration = ProbeCalibration {
            coefficients: SteinhartHart::new(a, b, c),
            offset_c: self.channel(probe).calibration().offset_c,
        };
        self.set_calibration(probe, calibration)
    }

    /// Set the calibration offset (°C) for a probe, effective next sample.
    pub fn set_offset(&mut self, probe: ProbeId, offset_c: f64) -> ProbeResult<()> {
        let calibration = ProbeCalibration {
            offset_c,
            ..*self.channel(probe).calibration()
        };
        self.set_calibration(probe, calibration)
    }

    pub fn set_calibration(&mut self, probe: ProbeId, calibration: ProbeCalibration) -> ProbeResult<()> {
        calibration.validate()?;
        tracing::debug!(%probe, ?calibration, "probe calibration updated");
        self.channels[probe.index()].set_calibration(calibration);
        Ok(())
    }

    /// Set the smoothing factor; must lie in `(0, 1]`.
    pub fn set_ema_alpha(&mut self, alpha: f64) -> ProbeResult<()> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(ProbeError::InvalidAlpha { alpha });
        }
        self.ema_alpha = alpha;
        Ok(())
    }

    pub fn ema_alpha(&self) -> f64 {
        self.ema_alpha
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}
