//! Split-range fan + damper coordination.
//!
//! One heat-demand percentage drives two actuators. Airflow is built from the
//! cheap, quiet damper (natural draft) first and the blower fan (forced draft)
//! only as demand rises:
//!
//! | mode             | damper                                   | fan                                  |
//! |------------------|------------------------------------------|--------------------------------------|
//! | `fan_only`       | 100                                      | pid                                  |
//! | `damper_primary` | pid up to `max(threshold, 50)`, then 100 | 0, then ramps 0..100 above that      |
//! | `fan_and_damper` | pid                                      | 0, then ramps 0..100 above threshold |

use core::fmt;
use core::str::FromStr;

use pc_core::{PERCENT_MAX, PERCENT_MIN, clamp_percent};
use serde::{Deserialize, Serialize};

use crate::error::ControlError;

/// Default PID output above which the fan turns on in `fan_and_damper` mode.
pub const DEFAULT_FAN_ON_THRESHOLD: f64 = 30.0;

/// Lower bound of the fan threshold in `damper_primary` mode.
const DAMPER_PRIMARY_MIN_THRESHOLD: f64 = 50.0;

/// Operator-selected mixing policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanMode {
    FanOnly,
    DamperPrimary,
    #[default]
    FanAndDamper,
}

impl FanMode {
    pub const ALL: [FanMode; 3] = [FanMode::FanOnly, FanMode::DamperPrimary, FanMode::FanAndDamper];

    /// Label used in configuration and transport messages.
    pub fn label(self) -> &'static str {
        match self {
            FanMode::FanOnly => "fan_only",
            FanMode::DamperPrimary => "damper_primary",
            FanMode::FanAndDamper => "fan_and_damper",
        }
    }
}

impl fmt::Display for FanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FanMode {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FanMode::ALL
            .into_iter()
            .find(|mode| mode.label() == s)
            .ok_or_else(|| ControlError::UnknownFanMode {
                label: s.to_string(),
            })
    }
}

/// Fan and damper commands, both in `[0, 100]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitRangeOutput {
    pub fan_percent: f64,
    pub damper_percent: f64,
}

/// Map a PID output to fan and damper percentages.
///
/// Pure and idempotent. Inputs are clamped to `[0, 100]` first.
pub fn split_range(pid_output: f64, mode: FanMode, fan_on_threshold: f64) -> SplitRangeOutput {
    let pid = clamp_percent(pid_output);
    let threshold = clamp_percent(fan_on_threshold);

    let (fan, damper) = match mode {
        FanMode::FanOnly => (pid, PERCENT_MAX),
        FanMode::DamperPrimary => {
            let threshold = threshold.max(DAMPER_PRIMARY_MIN_THRESHOLD);
            if pid > threshold {
                (fan_ramp(pid, threshold), PERCENT_MAX)
            } else {
                (fan_ramp(pid, threshold), pid)
            }
        }
        FanMode::FanAndDamper => (fan_ramp(pid, threshold), pid),
    };

    SplitRangeOutput {
        fan_percent: clamp_percent(fan),
        damper_percent: clamp_percent(damper),
    }
}

/// Fan is off up to `threshold`, then rescaled linearly so that
/// `threshold..100` maps onto `0..100`. Full demand is always full fan, even
/// with a threshold of 100.
fn fan_ramp(pid: f64, threshold: f64) -> f64 {
    if pid >= PERCENT_MAX {
        return PERCENT_MAX;
    }
    if pid <= threshold {
        return PERCENT_MIN;
    }
    (pid - threshold) / (PERCENT_MAX - threshold) * PERCENT_MAX
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sr(pid: f64, mode: FanMode, threshold: f64) -> (f64, f64) {
        let out = split_range(pid, mode, threshold);
        (out.fan_percent, out.damper_percent)
    }

    #[test]
    fn fan_only_keeps_damper_open() {
        assert_eq!(sr(0.0, FanMode::FanOnly, 30.0), (0.0, 100.0));
        assert_eq!(sr(42.0, FanMode::FanOnly, 30.0), (42.0, 100.0));
        assert_eq!(sr(100.0, FanMode::FanOnly, 30.0), (100.0, 100.0));
    }

    #[test]
    fn fan_and_damper_ramps_fan_above_threshold() {
        assert_eq!(sr(20.0, FanMode::FanAndDamper, 30.0), (0.0, 20.0));
        assert_eq!(sr(30.0, FanMode::FanAndDamper, 30.0), (0.0, 30.0));
        let (fan, damper) = sr(65.0, FanMode::FanAndDamper, 30.0);
        assert!((fan - 50.0).abs() < 1e-9);
        assert_eq!(damper, 65.0);
        assert_eq!(sr(100.0, FanMode::FanAndDamper, 30.0), (100.0, 100.0));
    }

    #[test]
    fn damper_primary_uses_at_least_fifty() {
        // threshold 30 is raised to 50
        assert_eq!(sr(40.0, FanMode::DamperPrimary, 30.0), (0.0, 40.0));
        assert_eq!(sr(50.0, FanMode::DamperPrimary, 30.0), (0.0, 50.0));
        let (fan, damper) = sr(75.0, FanMode::DamperPrimary, 30.0);
        assert!((fan - 50.0).abs() < 1e-9);
        assert_eq!(damper, 100.0);

        // a higher configured threshold wins
        assert_eq!(sr(70.0, FanMode::DamperPrimary, 80.0), (0.0, 70.0));
        let (fan, _) = sr(90.0, FanMode::DamperPrimary, 80.0);
        assert!((fan - 50.0).abs() < 1e-9);
    }

    #[test]
    fn inputs_are_clamped() {
        assert_eq!(sr(-10.0, FanMode::FanAndDamper, 30.0), (0.0, 0.0));
        assert_eq!(sr(150.0, FanMode::FanAndDamper, 30.0), (100.0, 100.0));
        assert_eq!(sr(f64::NAN, FanMode::FanOnly, 30.0), (0.0, 100.0));
    }

    #[test]
    fn threshold_of_one_hundred_does_not_divide_by_zero() {
        assert_eq!(sr(99.9, FanMode::FanAndDamper, 100.0), (0.0, 99.9));
        assert_eq!(sr(100.0, FanMode::FanAndDamper, 100.0), (100.0, 100.0));
        assert_eq!(sr(100.0, FanMode::DamperPrimary, 100.0), (100.0, 100.0));
    }

    #[test]
    fn labels_round_trip() {
        for mode in FanMode::ALL {
            assert_eq!(mode.label().parse::<FanMode>().unwrap(), mode);
        }
        assert!("turbo".parse::<FanMode>().is_err());
        assert_eq!(FanMode::default(), FanMode::FanAndDamper);
    }
}
