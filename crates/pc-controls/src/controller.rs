//! PID controller with lid-open suspension.
//!
//! The controller includes:
//! - Proportional action on error
//! - Integral action with conditional anti-windup and clamping to the output range
//! - Derivative action on the measurement, so setpoint steps do not kick
//! - Output clamping to `[0, 100]`
//! - Sampled/digital operation: one call to [`PidController::compute`] is one
//!   sample of the configured period

use pc_core::{PERCENT_MAX, PERCENT_MIN};
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};
use crate::lid::{LidAssist, LidDetector, LidState, LidThresholds};

/// PID computation period.
pub const PID_SAMPLE_MS: u64 = 4000;

/// PID gains, in percent of output per degree of error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidTunings {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain (per second).
    pub ki: f64,
    /// Derivative gain (seconds).
    pub kd: f64,
}

impl Default for PidTunings {
    fn default() -> Self {
        Self {
            kp: 4.0,
            ki: 0.02,
            kd: 5.0,
        }
    }
}

impl PidTunings {
    pub fn new(kp: f64, ki: f64, kd: f64) -> ControlResult<Self> {
        let tunings = Self { kp, ki, kd };
        tunings.validate()?;
        Ok(tunings)
    }

    pub fn validate(&self) -> ControlResult<()> {
        if ![self.kp, self.ki, self.kd].iter().all(|g| g.is_finite() && *g >= 0.0) {
            return Err(ControlError::InvalidArg {
                what: "PID gains must be finite and non-negative",
            });
        }
        Ok(())
    }
}

/// Closed-loop pit temperature controller.
///
/// Output is a heat-demand percentage; see [`crate::split_range`] for how it
/// becomes fan and damper commands.
#[derive(Debug, Clone, PartialEq)]
pub struct PidController {
    tunings: PidTunings,
    /// Sample period in seconds; gains are scaled by it.
    dt: f64,
    /// Integral accumulator, in output units.
    integral: f64,
    /// Previous measurement for the derivative, `None` right after a reset.
    last_input: Option<f64>,
    output: f64,
    lid: LidDetector,
    /// Off unless configured.
    lid_assist: LidAssist,
    /// Lid-open timeout, converted to PID samples whenever `dt` changes.
    lid_timeout_ms: Option<u64>,
    enabled: bool,
}

impl Default for PidController {
    fn default() -> Self {
        Self::new(PidTunings::default())
    }
}

impl PidController {
    /// Create a controller sampled every [`PID_SAMPLE_MS`].
    pub fn new(tunings: PidTunings) -> Self {
        Self {
            tunings,
            dt: PID_SAMPLE_MS as f64 / 1000.0,
            integral: 0.0,
            last_input: None,
            output: 0.0,
            lid: LidDetector::default(),
            lid_assist: LidAssist::default(),
            lid_timeout_ms: None,
            enabled: true,
        }
    }

    /// Set the sample period the gains are scaled with.
    pub fn with_sample_period_ms(mut self, period_ms: u64) -> ControlResult<Self> {
        if period_ms == 0 {
            return Err(ControlError::InvalidArg {
                what: "PID sample period must be positive",
            });
        }
        self.dt = period_ms as f64 / 1000.0;
        self.sync_lid_timeout();
        Ok(self)
    }

    /// Opt in to ignoring temperature drops until the pit first reaches the
    /// recover threshold of the current setpoint. See [`LidAssist`].
    pub fn with_lid_warm_up_arming(mut self, enabled: bool) -> Self {
        self.lid_assist = self.lid_assist.with_warm_up_arming(enabled);
        self
    }

    /// Opt in to resuming control after the lid has read open for
    /// `timeout_ms`, even if the pit never recovered. `None` or 0 disables it.
    pub fn with_lid_timeout_ms(mut self, timeout_ms: Option<u64>) -> Self {
        self.lid_timeout_ms = timeout_ms.filter(|ms| *ms > 0);
        self.sync_lid_timeout();
        self
    }

    fn sync_lid_timeout(&mut self) {
        let period_ms = (self.dt * 1000.0).round() as u64;
        let samples = self
            .lid_timeout_ms
            .map(|ms| u32::try_from(ms.div_ceil(period_ms.max(1))).unwrap_or(u32::MAX));
        self.lid_assist.set_max_open_updates(samples);
    }

    /// Set lid detection thresholds.
    pub fn with_lid_thresholds(mut self, thresholds: LidThresholds) -> Self {
        self.lid.set_thresholds(thresholds);
        self
    }

    /// Run one control sample.
    ///
    /// Disabled: returns 0 and touches nothing. Lid open: forces the output to
    /// 0 and leaves the accumulator frozen. Otherwise runs a PID step and
    /// returns the clamped output.
    pub fn compute(&mut self, current: f64, setpoint: f64) -> f64 {
        if !self.enabled {
            return 0.0;
        }

        let was_open = self.lid.is_open();
        if self.lid_assist.update(&mut self.lid, current, setpoint) == LidState::Open {
            self.output = 0.0;
            return 0.0;
        }
        if was_open {
            // the pre-lid measurement is stale; restart the derivative
            self.last_input = None;
        }

        self.output = self.step(current, setpoint);
        self.output
    }

    fn step(&mut self, current: f64, setpoint: f64) -> f64 {
        let PidTunings { kp, ki, kd } = self.tunings;
        let error = setpoint - current;

        let p_term = kp * error;

        let d_input = self.last_input.map_or(0.0, |prev| current - prev);
        let d_term = -(kd / self.dt) * d_input;

        // Conditional integration: do not grow the accumulator while the
        // output is saturated in the direction the error pushes it.
        let candidate = self.integral + ki * self.dt * error;
        let output_raw = p_term + candidate + d_term;
        let winding_up = (output_raw > PERCENT_MAX && error > 0.0)
            || (output_raw < PERCENT_MIN && error < 0.0);
        if !winding_up {
            self.integral = candidate;
        }
        self.integral = self.integral.clamp(PERCENT_MIN, PERCENT_MAX);

        self.last_input = Some(current);

        let output = p_term + self.integral + d_term;
        if output.is_nan() {
            return PERCENT_MIN;
        }
        output.clamp(PERCENT_MIN, PERCENT_MAX)
    }

    /// Latest output in `[0, 100]`.
    pub fn output(&self) -> f64 {
        self.output
    }

    /// Zero the accumulated error and restart the derivative.
    ///
    /// Call on every operator-initiated setpoint change so the reference
    /// change alone cannot cause an output jump.
    pub fn reset_integrator(&mut self) {
        self.integral = 0.0;
        self.last_input = None;
        tracing::debug!("PID integrator reset");
    }

    /// Update gains in place, effective on the next compute.
    pub fn set_tunings(&mut self, tunings: PidTunings) -> ControlResult<()> {
        tunings.validate()?;
        self.tunings = tunings;
        tracing::info!(kp = tunings.kp, ki = tunings.ki, kd = tunings.kd, "PID tunings updated");
        Ok(())
    }

    pub fn tunings(&self) -> PidTunings {
        self.tunings
    }

    /// Enable or disable computation. Disabling forces the output to 0.
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled && !self.enabled {
            self.last_input = None;
        }
        self.enabled = enabled;
        if !enabled {
            self.output = 0.0;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_lid_open(&self) -> bool {
        self.lid.is_open()
    }

    pub fn lid_state(&self) -> LidState {
        self.lid.state()
    }

    pub fn set_lid_thresholds(&mut self, thresholds: LidThresholds) {
        self.lid.set_thresholds(thresholds);
    }

    /// Treat the lid as closed. With warm-up arming the pit has to reach
    /// temperature again before drops count.
    pub fn reset_lid_detection(&mut self) {
        self.lid.reset();
        self.lid_assist.reset();
    }

    pub fn lid_assist(&self) -> &LidAssist {
        &self.lid_assist
    }

    /// Integral accumulator in output units (diagnostics).
    pub fn integral(&self) -> f64 {
        self.integral
    }
}
