/// Lower and upper bound of every percentage signal (PID output, fan, damper).
pub const PERCENT_MIN: f64 = 0.0;
pub const PERCENT_MAX: f64 = 100.0;

/// Clamp a value into `[0, 100]`. NaN collapses to 0 so a bad input can never
/// reach an actuator as a non-number.
#[inline]
pub fn clamp_percent(v: f64) -> f64 {
    if v.is_nan() {
        return PERCENT_MIN;
    }
    v.clamp(PERCENT_MIN, PERCENT_MAX)
}

/// Round to one decimal place, the precision temperatures are reported with.
#[inline]
pub fn round_tenth(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn clamp_percent_bounds() {
        assert_eq!(clamp_percent(-5.0), 0.0);
        assert_eq!(clamp_percent(150.0), 100.0);
        assert_eq!(clamp_percent(42.5), 42.5);
        assert_eq!(clamp_percent(f64::NAN), 0.0);
        assert_eq!(clamp_percent(f64::INFINITY), 100.0);
    }

    #[test]
    fn round_tenth_half_up() {
        assert_eq!(round_tenth(224.96), 225.0);
        assert_eq!(round_tenth(107.24), 107.2);
    }

    proptest! {
        #[test]
        fn clamp_percent_stays_in_range(v in any::<f64>()) {
            let c = clamp_percent(v);
            prop_assert!((PERCENT_MIN..=PERCENT_MAX).contains(&c));
        }
    }
}
