//! Thermistor math: divider inversion and the Steinhart–Hart relation.
//!
//! Circuit: VCC -- R_ref -- ADC_PIN -- NTC -- GND, read single-ended by a
//! 16-bit signed converter, so the raw count falls as the thermistor heats up.

use pc_core::KELVIN_OFFSET;
use serde::{Deserialize, Serialize};

/// Full-scale count of the 16-bit signed converter.
pub const ADC_MAX_VALUE: i16 = 32767;

/// Pull-up reference resistor (ohms).
pub const REFERENCE_RESISTANCE_OHMS: f64 = 10_000.0;

/// Raw counts at or above this mean the probe is unplugged.
pub const OPEN_CIRCUIT_THRESHOLD: i16 = 32000;

/// Raw counts at or below this mean the probe leads are shorted.
pub const SHORT_CIRCUIT_THRESHOLD: i16 = 100;

/// Steinhart–Hart coefficients for the Thermoworks Pro-Series probes.
pub const THERM_A: f64 = 7.343_140_1e-4;
pub const THERM_B: f64 = 2.157_437_0e-4;
pub const THERM_C: f64 = 9.515_686_0e-8;

/// Steinhart–Hart coefficients: `1/T = A + B ln(R) + C ln(R)^3`, T in kelvin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SteinhartHart {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Default for SteinhartHart {
    fn default() -> Self {
        Self {
            a: THERM_A,
            b: THERM_B,
            c: THERM_C,
        }
    }
}

impl SteinhartHart {
    pub const fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    /// Inverse absolute temperature (1/K) for a resistance in ohms.
    pub fn inverse_temperature(&self, resistance: f64) -> f64 {
        let ln_r = resistance.ln();
        self.a + self.b * ln_r + self.c * ln_r * ln_r * ln_r
    }

    /// Absolute temperature (K) for a resistance in ohms.
    ///
    /// Returns `None` when the relation is degenerate: a zero, negative or
    /// non-finite inverse temperature has no physical reading behind it.
    pub fn temperature_k(&self, resistance: f64) -> Option<f64> {
        let inv_t = self.inverse_temperature(resistance);
        if !inv_t.is_finite() || inv_t <= 0.0 {
            return None;
        }
        Some(1.0 / inv_t)
    }

    /// Temperature in Celsius for a resistance in ohms.
    pub fn temperature_c(&self, resistance: f64) -> Option<f64> {
        self.temperature_k(resistance).map(|t| t - KELVIN_OFFSET)
    }

    /// Resistance (ohms) the thermistor has at `t_k` kelvin.
    ///
    /// Solves the cubic in `x = ln(R)`:
    /// `C x^3 + B x + (A - 1/T) = 0`. With `B, C > 0` the depressed cubic has
    /// exactly one real root, given by Cardano's formula.
    pub fn resistance_for(&self, t_k: f64) -> Option<f64> {
        if !t_k.is_finite() || t_k <= 0.0 {
            return None;
        }
        let rhs = self.a - 1.0 / t_k;
        let x = if self.c == 0.0 {
            if self.b == 0.0 {
                return None;
            }
            -rhs / self.b
        } else {
            let p = self.b / self.c;
            let q = rhs / self.c;
            let disc = q * q / 4.0 + p * p * p / 27.0;
            if disc < 0.0 {
                return None;
            }
            let sqrt_disc = disc.sqrt();
            (-q / 2.0 + sqrt_disc).cbrt() + (-q / 2.0 - sqrt_disc).cbrt()
        };
        let r = x.exp();
        r.is_finite().then_some(r)
    }
}

/// Pull-up voltage divider in front of the converter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Divider {
    pub reference_ohms: f64,
    pub adc_max: i16,
}

impl Default for Divider {
    fn default() -> Self {
        Self {
            reference_ohms: REFERENCE_RESISTANCE_OHMS,
            adc_max: ADC_MAX_VALUE,
        }
    }
}

impl Divider {
    /// Thermistor resistance for a raw count: `R = R_ref * (ADC_MAX / raw - 1)`.
    ///
    /// Non-positive counts and full-scale readings give a resistance `<= 0`
    /// or infinity; callers treat a non-positive result as a short.
    pub fn resistance(&self, raw: i16) -> f64 {
        if raw <= 0 {
            return 0.0;
        }
        self.reference_ohms * (f64::from(self.adc_max) / f64::from(raw) - 1.0)
    }

    /// Raw count the converter would report for a thermistor resistance.
    pub fn raw_for(&self, resistance: f64) -> i16 {
        if !resistance.is_finite() {
            return self.adc_max;
        }
        if resistance <= 0.0 {
            return 0;
        }
        let raw = f64::from(self.adc_max) / (resistance / self.reference_ohms + 1.0);
        raw.round().clamp(0.0, f64::from(self.adc_max)) as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divider_midpoint_is_reference() {
        let d = Divider::default();
        // raw == ADC_MAX/2 means R_therm == R_ref
        let r = d.resistance(16_384);
        assert!((r - 10_000.0).abs() < 5.0);
        assert_eq!(d.resistance(0), 0.0);
        assert_eq!(d.resistance(-12), 0.0);
    }

    #[test]
    fn divider_is_monotonic_decreasing() {
        let d = Divider::default();
        let mut prev = f64::INFINITY;
        for raw in (200..32_000).step_by(997) {
            let r = d.resistance(raw);
            assert!(r < prev);
            prev = r;
        }
    }

    #[test]
    fn room_temperature_reading() {
        let sh = SteinhartHart::default();
        let r25 = sh.resistance_for(25.0 + KELVIN_OFFSET).unwrap();
        let t = sh.temperature_c(r25).unwrap();
        assert!((t - 25.0).abs() < 1e-6);
    }

    #[test]
    fn inverse_without_cubic_term() {
        let sh = SteinhartHart::new(1.0e-3, 2.5e-4, 0.0);
        let r = sh.resistance_for(350.0).unwrap();
        assert!((sh.temperature_k(r).unwrap() - 350.0).abs() < 1e-9);
    }

    #[test]
    fn zero_inverse_temperature_is_unconvertible() {
        let sh = SteinhartHart::new(0.0, 0.0, 0.0);
        assert_eq!(sh.temperature_k(10_000.0), None);
        // negative inverse temperature would mean negative kelvin
        let sh = SteinhartHart::new(-1.0, 0.0, 0.0);
        assert_eq!(sh.temperature_k(10_000.0), None);
    }

    #[test]
    fn raw_for_saturates() {
        let d = Divider::default();
        assert_eq!(d.raw_for(0.0), 0);
        assert_eq!(d.raw_for(f64::INFINITY), ADC_MAX_VALUE);
        assert_eq!(d.raw_for(10_000.0), 16_384);
    }
}
