//! ADS1115 analog source over an `embedded-hal` I²C bus.

use ads1x1x::{Ads1x1x, FullScaleRange, TargetAddr, channel, ic, mode};
use embedded_hal::i2c::I2c;
use nb::block;

use crate::error::{ProbeError, ProbeResult};
use crate::source::AnalogSource;

type Converter<I2C> = Ads1x1x<I2C, ic::Ads1115, ic::Resolution16Bit, mode::OneShot>;

/// Single-shot ADS1115 reader at ±4.096 V full scale.
pub struct Ads1115Source<I2C> {
    adc: Converter<I2C>,
}

impl<I2C, E> Ads1115Source<I2C>
where
    I2C: I2c<Error = E>,
    E: core::fmt::Debug,
{
    /// Configure the converter at its default address (0x48).
    pub fn new(i2c: I2C) -> ProbeResult<Self> {
        let mut adc = Ads1x1x::new_ads1115(i2c, TargetAddr::default());
        adc.set_full_scale_range(FullScaleRange::Within4_096V)
            .map_err(|e| ProbeError::Bus {
                what: format!("{e:?}"),
            })?;
        tracing::info!("ADS1115 initialized at +/-4.096V");
        Ok(Self { adc })
    }

    /// Release the bus.
    pub fn release(self) -> I2C {
        self.adc.destroy_ads1115()
    }
}

impl<I2C, E> AnalogSource for Ads1115Source<I2C>
where
    I2C: I2c<Error = E>,
    E: core::fmt::Debug,
{
    fn read_raw(&mut self, ch: u8) -> ProbeResult<i16> {
        let result = match ch {
            0 => block!(self.adc.read(channel::SingleA0)),
            1 => block!(self.adc.read(channel::SingleA1)),
            2 => block!(self.adc.read(channel::SingleA2)),
            3 => block!(self.adc.read(channel::SingleA3)),
            _ => return Err(ProbeError::NoSuchChannel { channel: ch }),
        };
        result.map_err(|e| ProbeError::Read {
            channel: ch,
            what: format!("{e:?}"),
        })
    }
}
