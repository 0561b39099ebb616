//! Actuator boundary and dynamics.
//!
//! The controller core never talks to hardware directly. Each tick it hands a
//! [`SplitRangeOutput`] to an [`ActuatorSink`]; drivers (PWM fan, servo
//! damper) and the simulator implement that trait.
//!
//! [`FirstOrderActuator`] models the physical lag between a command and the
//! actual blade or impeller position, which the simulator uses to keep the
//! fan and damper from teleporting.

use pc_core::{PERCENT_MAX, PERCENT_MIN, clamp_percent};
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};
use crate::split_range::SplitRangeOutput;

/// Receives fan and damper commands, both in `[0, 100]`.
pub trait ActuatorSink {
    fn apply(&mut self, output: SplitRangeOutput);
}

impl<T: ActuatorSink + ?Sized> ActuatorSink for &mut T {
    fn apply(&mut self, output: SplitRangeOutput) {
        (**self).apply(output);
    }
}

impl<T: ActuatorSink + ?Sized> ActuatorSink for Box<T> {
    fn apply(&mut self, output: SplitRangeOutput) {
        (**self).apply(output);
    }
}

/// Commands kept by [`RecordingActuators::new`].
pub const DEFAULT_RECORD_LIMIT: usize = 1024;

/// Sink that remembers the most recent commands it received, for tests and
/// diagnostics. Older commands are dropped once `limit` is reached.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingActuators {
    history: Vec<SplitRangeOutput>,
    limit: usize,
}

impl Default for RecordingActuators {
    fn default() -> Self {
        Self::with_limit(DEFAULT_RECORD_LIMIT)
    }
}

impl RecordingActuators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` commands (at least one).
    pub fn with_limit(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            history: Vec::with_capacity(limit.min(DEFAULT_RECORD_LIMIT)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Most recent command, if any.
    pub fn last(&self) -> Option<SplitRangeOutput> {
        self.history.last().copied()
    }

    /// Oldest to newest.
    pub fn history(&self) -> &[SplitRangeOutput] {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}

impl ActuatorSink for RecordingActuators {
    fn apply(&mut self, output: SplitRangeOutput) {
        if self.history.len() >= self.limit {
            self.history.remove(0);
        }
        self.history.push(output);
    }
}

/// Position of a percent-scaled actuator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActuatorState {
    /// Current position in `[0, 100]`.
    pub position_pct: f64,
}

/// First-order lag with rate limiting.
///
/// Dynamics: `dpos/dt = (cmd - pos) / tau`, clamped to `[-rate_limit, rate_limit]`.
///
/// ```
/// use pc_controls::{ActuatorState, FirstOrderActuator};
///
/// let damper = FirstOrderActuator::new(2.0, 50.0).unwrap();
/// let mut state = ActuatorState::default();
/// for _ in 0..200 {
///     state = damper.step(&state, 0.1, 100.0);
/// }
/// assert!(state.position_pct > 99.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FirstOrderActuator {
    /// Time constant in seconds.
    pub tau_s: f64,
    /// Maximum slew in percent per second.
    pub rate_limit: f64,
}

impl FirstOrderActuator {
    /// Both parameters must be finite and positive.
    pub fn new(tau_s: f64, rate_limit: f64) -> ControlResult<Self> {
        if !(tau_s.is_finite() && tau_s > 0.0) {
            return Err(ControlError::InvalidArg {
                what: "actuator time constant must be positive",
            });
        }
        if !(rate_limit.is_finite() && rate_limit > 0.0) {
            return Err(ControlError::InvalidArg {
                what: "actuator rate limit must be positive",
            });
        }
        Ok(Self { tau_s, rate_limit })
    }

    /// Position derivative, rate limited.
    pub fn dpdt(&self, position: f64, command: f64) -> f64 {
        let raw = (clamp_percent(command) - position) / self.tau_s;
        raw.clamp(-self.rate_limit, self.rate_limit)
    }

    /// Advance by `dt` seconds with explicit Euler; never overshoots the
    /// command.
    pub fn step(&self, state: &ActuatorState, dt: f64, command: f64) -> ActuatorState {
        let target = clamp_percent(command);
        let moved = state.position_pct + self.dpdt(state.position_pct, target) * dt;
        let position_pct = if state.position_pct <= target {
            moved.min(target)
        } else {
            moved.max(target)
        };
        ActuatorState {
            position_pct: position_pct.clamp(PERCENT_MIN, PERCENT_MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_toward_command() {
        let act = FirstOrderActuator::new(1.0, 1000.0).unwrap();
        let state = act.step(&ActuatorState::default(), 0.1, 100.0);
        assert!((state.position_pct - 10.0).abs() < 1e-9);
    }

    #[test]
    fn rate_limited() {
        let act = FirstOrderActuator::new(1.0, 20.0).unwrap();
        // raw slope would be 100 %/s
        assert!((act.dpdt(0.0, 100.0) - 20.0).abs() < 1e-12);
        assert!((act.dpdt(100.0, 0.0) + 20.0).abs() < 1e-12);
    }

    #[test]
    fn large_step_does_not_overshoot() {
        let act = FirstOrderActuator::new(0.1, 1000.0).unwrap();
        let state = act.step(&ActuatorState { position_pct: 40.0 }, 1.0, 60.0);
        assert_eq!(state.position_pct, 60.0);
        let state = act.step(&state, 1.0, 150.0);
        assert_eq!(state.position_pct, 100.0);
    }

    #[test]
    fn invalid_parameters() {
        assert!(FirstOrderActuator::new(0.0, 1.0).is_err());
        assert!(FirstOrderActuator::new(1.0, -1.0).is_err());
        assert!(FirstOrderActuator::new(f64::INFINITY, 1.0).is_err());
    }

    #[test]
    fn recording_sink_keeps_order() {
        let mut sink = RecordingActuators::new();
        assert!(sink.last().is_none());
        sink.apply(SplitRangeOutput { fan_percent: 0.0, damper_percent: 10.0 });
        fn drive<A: ActuatorSink>(mut sink: A) {
            sink.apply(SplitRangeOutput { fan_percent: 5.0, damper_percent: 50.0 });
        }
        drive(&mut sink);
        assert_eq!(sink.history().len(), 2);
        assert_eq!(sink.last().unwrap().fan_percent, 5.0);
        sink.clear();
        assert!(sink.history().is_empty());
    }

    #[test]
    fn recording_sink_is_bounded() {
        let mut sink = RecordingActuators::with_limit(3);
        for i in 0..5 {
            sink.apply(SplitRangeOutput { fan_percent: f64::from(i), damper_percent: 0.0 });
        }
        let fans: Vec<f64> = sink.history().iter().map(|o| o.fan_percent).collect();
        assert_eq!(fans, vec![2.0, 3.0, 4.0]);
        assert_eq!(RecordingActuators::new().limit(), DEFAULT_RECORD_LIMIT);
        assert_eq!(RecordingActuators::with_limit(0).limit(), 1);
    }
}
