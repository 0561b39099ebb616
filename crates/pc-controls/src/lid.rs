//! Lid-open detection.
//!
//! Opening the smoker lid dumps heat: the pit temperature falls well below
//! setpoint within seconds. A PID loop left running would wind the fan to
//! full and overshoot once the lid closes, so the controller suspends its
//! output while the lid is presumed open.
//!
//! [`LidDetector`] is a two-state machine with hysteresis, driven only by the
//! current temperature and setpoint:
//! - `Closed -> Open` when `temp <= setpoint * (1 - drop)`
//! - `Open -> Closed` when `temp >= setpoint * (1 - recover)`, `recover < drop`
//!
//! A pit still coming up from ambient sits below the drop line too, and with
//! the output suspended it may never reach the recover line. [`LidAssist`] is
//! an opt-in layer for that case: it can hold detection off until the pit
//! first reaches temperature, and give up on an open lid after a number of
//! updates. It is inactive unless configured.

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Lid state as inferred from the pit temperature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LidState {
    /// Normal operation.
    #[default]
    Closed,
    /// Lid presumed open, PID output suspended.
    Open,
}

/// Drop/recover fractions of the setpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LidThresholds {
    drop_fraction: f64,
    recover_fraction: f64,
}

impl Default for LidThresholds {
    fn default() -> Self {
        Self {
            drop_fraction: 0.06,
            recover_fraction: 0.02,
        }
    }
}

impl LidThresholds {
    /// Create thresholds from fractions of the setpoint.
    ///
    /// Both must lie in `[0, 1)` and `recover` must be strictly smaller than
    /// `drop`, otherwise the two boundaries would overlap.
    pub fn new(drop_fraction: f64, recover_fraction: f64) -> ControlResult<Self> {
        let in_range = |v: f64| (0.0..1.0).contains(&v);
        if !in_range(drop_fraction) {
            return Err(ControlError::InvalidArg {
                what: "lid drop fraction must be in [0, 1)",
            });
        }
        if !in_range(recover_fraction) {
            return Err(ControlError::InvalidArg {
                what: "lid recover fraction must be in [0, 1)",
            });
        }
        if recover_fraction >= drop_fraction {
            return Err(ControlError::InvalidArg {
                what: "lid recover fraction must be less than drop fraction",
            });
        }
        Ok(Self {
            drop_fraction,
            recover_fraction,
        })
    }

    /// Create thresholds from percentages (6 means 6 %).
    pub fn from_percent(drop_pct: f64, recover_pct: f64) -> ControlResult<Self> {
        Self::new(drop_pct / 100.0, recover_pct / 100.0)
    }

    pub fn drop_fraction(&self) -> f64 {
        self.drop_fraction
    }

    pub fn recover_fraction(&self) -> f64 {
        self.recover_fraction
    }

    /// Temperature at or below which a closed lid is considered opened.
    pub fn drop_threshold(&self, setpoint: f64) -> f64 {
        setpoint * (1.0 - self.drop_fraction)
    }

    /// Temperature at or above which an open lid is considered closed again.
    pub fn recover_threshold(&self, setpoint: f64) -> f64 {
        setpoint * (1.0 - self.recover_fraction)
    }
}

/// Hysteretic lid-open state machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LidDetector {
    thresholds: LidThresholds,
    state: LidState,
}

impl LidDetector {
    pub fn new(thresholds: LidThresholds) -> Self {
        Self {
            thresholds,
            state: LidState::Closed,
        }
    }

    pub fn state(&self) -> LidState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == LidState::Open
    }

    pub fn thresholds(&self) -> &LidThresholds {
        &self.thresholds
    }

    pub fn set_thresholds(&mut self, thresholds: LidThresholds) {
        self.thresholds = thresholds;
    }

    /// Force the detector back to `Closed`.
    pub fn reset(&mut self) {
        self.state = LidState::Closed;
    }

    /// Advance the state machine with the current temperature.
    ///
    /// A setpoint `<= 0` means the controller is not configured; the state is
    /// left as is.
    pub fn update(&mut self, current: f64, setpoint: f64) -> LidState {
        if setpoint <= 0.0 {
            return self.state;
        }

        match self.state {
            LidState::Closed => {
                let threshold = self.thresholds.drop_threshold(setpoint);
                if current <= threshold {
                    self.state = LidState::Open;
                    tracing::info!(temp = current, threshold, "lid-open detected");
                }
            }
            LidState::Open => {
                let threshold = self.thresholds.recover_threshold(setpoint);
                if current >= threshold {
                    self.state = LidState::Closed;
                    tracing::info!(temp = current, threshold, "lid-open recovery");
                }
            }
        }
        self.state
    }
}

/// Opt-in supervision of a [`LidDetector`].
///
/// - Warm-up arming: drops are ignored until the pit has reached the recover
///   threshold for the current setpoint. Changing the setpoint closes the lid
///   and disarms again.
/// - Open timeout: after `max_open_updates` consecutive open updates the lid
///   is forced closed (and disarmed when arming is enabled).
///
/// The default assist does neither and passes updates straight through.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LidAssist {
    warm_up_arming: bool,
    max_open_updates: Option<u32>,
    armed: bool,
    last_setpoint: Option<f64>,
    open_updates: u32,
}

impl LidAssist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_warm_up_arming(mut self, enabled: bool) -> Self {
        self.warm_up_arming = enabled;
        self
    }

    pub fn with_max_open_updates(mut self, limit: Option<u32>) -> Self {
        self.set_max_open_updates(limit);
        self
    }

    /// `None` or 0 waits for the temperature indefinitely.
    pub fn set_max_open_updates(&mut self, limit: Option<u32>) {
        self.max_open_updates = limit.filter(|n| *n > 0);
    }

    pub fn max_open_updates(&self) -> Option<u32> {
        self.max_open_updates
    }

    pub fn warm_up_arming(&self) -> bool {
        self.warm_up_arming
    }

    /// Whether either behaviour is configured.
    pub fn is_active(&self) -> bool {
        self.warm_up_arming || self.max_open_updates.is_some()
    }

    /// Whether a temperature drop would currently reach the detector.
    pub fn is_armed(&self) -> bool {
        !self.warm_up_arming || self.armed
    }

    /// Forget the warm-up and the open count.
    pub fn reset(&mut self) {
        self.armed = false;
        self.last_setpoint = None;
        self.open_updates = 0;
    }

    /// Update `lid` through the assist.
    pub fn update(&mut self, lid: &mut LidDetector, current: f64, setpoint: f64) -> LidState {
        if !self.is_active() || setpoint <= 0.0 {
            return lid.update(current, setpoint);
        }

        if self.warm_up_arming && !self.observe_setpoint(lid, current, setpoint) {
            return lid.state();
        }

        let state = lid.update(current, setpoint);
        if state == LidState::Closed {
            self.open_updates = 0;
            return state;
        }

        self.open_updates = self.open_updates.saturating_add(1);
        if self.max_open_updates.is_some_and(|max| self.open_updates > max) {
            tracing::warn!(
                temp = current,
                updates = self.open_updates,
                "lid still open after timeout, resuming control"
            );
            lid.reset();
            self.armed = false;
            self.open_updates = 0;
            return LidState::Closed;
        }
        state
    }

    /// Track setpoint changes and arming; returns whether the detector should
    /// see this update.
    fn observe_setpoint(&mut self, lid: &mut LidDetector, current: f64, setpoint: f64) -> bool {
        if self.last_setpoint != Some(setpoint) {
            if self.last_setpoint.is_some() {
                tracing::debug!(setpoint, "lid detection disarmed for new setpoint");
            }
            lid.reset();
            self.armed = false;
            self.open_updates = 0;
            self.last_setpoint = Some(setpoint);
        }
        if !self.armed {
            let threshold = lid.thresholds().recover_threshold(setpoint);
            if current < threshold {
                return false;
            }
            self.armed = true;
            tracing::debug!(temp = current, threshold, "lid detection armed");
        }
        true
    }
}
