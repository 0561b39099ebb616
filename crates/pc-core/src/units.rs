//! Temperature scales.
//!
//! Conversions go through `uom` so the scale arithmetic lives in one place.

use core::fmt;
use core::str::FromStr;

use uom::si::f64::ThermodynamicTemperature;
use uom::si::thermodynamic_temperature::{degree_celsius, degree_fahrenheit};

use crate::PcError;

pub type Temperature = ThermodynamicTemperature;

/// Offset between the Celsius and Kelvin scales.
pub const KELVIN_OFFSET: f64 = 273.15;

#[inline]
pub fn degc(v: f64) -> Temperature {
    Temperature::new::<degree_celsius>(v)
}

#[inline]
pub fn degf(v: f64) -> Temperature {
    Temperature::new::<degree_fahrenheit>(v)
}

#[inline]
pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    degc(c).get::<degree_fahrenheit>()
}

#[inline]
pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    degf(f).get::<degree_celsius>()
}

/// Display unit an operator reads temperatures in.
///
/// Probe state is always kept in Celsius; the unit is applied on read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TempUnit {
    #[cfg_attr(feature = "serde", serde(rename = "C"))]
    Celsius,
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "F"))]
    Fahrenheit,
}

impl TempUnit {
    /// Convert a Celsius value into this unit.
    #[inline]
    pub fn from_celsius(self, c: f64) -> f64 {
        match self {
            TempUnit::Celsius => c,
            TempUnit::Fahrenheit => celsius_to_fahrenheit(c),
        }
    }

    /// Convert a value expressed in this unit into Celsius.
    #[inline]
    pub fn to_celsius(self, v: f64) -> f64 {
        match self {
            TempUnit::Celsius => v,
            TempUnit::Fahrenheit => fahrenheit_to_celsius(v),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            TempUnit::Celsius => "C",
            TempUnit::Fahrenheit => "F",
        }
    }
}

impl fmt::Display for TempUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for TempUnit {
    type Err = PcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "C" | "c" | "celsius" => Ok(TempUnit::Celsius),
            "F" | "f" | "fahrenheit" => Ok(TempUnit::Fahrenheit),
            other => Err(PcError::UnknownUnit {
                label: other.to_string(),
            }),
        }
    }
}
