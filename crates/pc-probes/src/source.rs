//! Analog source capability.
//!
//! The conditioning pipeline only needs "give me the raw count on channel N".
//! Hardware builds plug in a converter driver, tests and the simulator plug in
//! [`SimulatedSource`].

use std::sync::Arc;
use std::sync::atomic::{AtomicI16, AtomicU8, Ordering};

use crate::error::{ProbeError, ProbeResult};

/// Trait for types that can provide raw single-ended ADC samples.
pub trait AnalogSource {
    /// Read one raw count from `channel`.
    fn read_raw(&mut self, channel: u8) -> ProbeResult<i16>;
}

impl<T: AnalogSource + ?Sized> AnalogSource for &mut T {
    fn read_raw(&mut self, channel: u8) -> ProbeResult<i16> {
        (**self).read_raw(channel)
    }
}

impl<T: AnalogSource + ?Sized> AnalogSource for Box<T> {
    fn read_raw(&mut self, channel: u8) -> ProbeResult<i16> {
        (**self).read_raw(channel)
    }
}

/// Number of inputs on the simulated converter (three probes plus a spare).
pub const SIM_CHANNELS: usize = 4;

/// In-memory converter whose counts are set by the caller.
///
/// Clones share the same storage, so a test or plant model can keep a handle
/// and change readings while a `TempManager` owns another clone. Every input
/// starts at full scale, i.e. unplugged.
#[derive(Debug, Clone)]
pub struct SimulatedSource {
    counts: Arc<[AtomicI16; SIM_CHANNELS]>,
    /// Bit per channel: reads fail while set.
    failing: Arc<AtomicU8>,
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedSource {
    pub fn new() -> Self {
        Self {
            counts: Arc::new(std::array::from_fn(|_| AtomicI16::new(i16::MAX))),
            failing: Arc::new(AtomicU8::new(0)),
        }
    }

    /// Set the raw count reported on `channel`. Out-of-range channels are ignored.
    pub fn set(&self, channel: u8, raw: i16) {
        if let Some(slot) = self.counts.get(usize::from(channel)) {
            slot.store(raw, Ordering::Relaxed);
        }
    }

    /// Current raw count on `channel`.
    pub fn get(&self, channel: u8) -> Option<i16> {
        self.counts
            .get(usize::from(channel))
            .map(|slot| slot.load(Ordering::Relaxed))
    }

    /// Make reads on `channel` fail (or succeed again).
    pub fn set_failing(&self, channel: u8, failing: bool) {
        if usize::from(channel) >= SIM_CHANNELS {
            return;
        }
        let bit = 1u8 << channel;
        if failing {
            self.failing.fetch_or(bit, Ordering::Relaxed);
        } else {
            self.failing.fetch_and(!bit, Ordering::Relaxed);
        }
    }
}

impl AnalogSource for SimulatedSource {
    fn read_raw(&mut self, channel: u8) -> ProbeResult<i16> {
        let Some(slot) = self.counts.get(usize::from(channel)) else {
            return Err(ProbeError::NoSuchChannel { channel });
        };
        if self.failing.load(Ordering::Relaxed) & (1u8 << channel) != 0 {
            return Err(ProbeError::Read {
                channel,
                what: "simulated read failure".to_string(),
            });
        }
        Ok(slot.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_counts() {
        let handle = SimulatedSource::new();
        let mut source = handle.clone();
        assert_eq!(source.read_raw(0).unwrap(), i16::MAX);
        handle.set(0, 20_000);
        assert_eq!(source.read_raw(0).unwrap(), 20_000);
    }

    #[test]
    fn unknown_channel_is_an_error() {
        let mut source = SimulatedSource::new();
        assert_eq!(
            source.read_raw(7),
            Err(ProbeError::NoSuchChannel { channel: 7 })
        );
    }

    #[test]
    fn failing_channel() {
        let mut source = SimulatedSource::new();
        source.set_failing(1, true);
        assert!(source.read_raw(1).is_err());
        assert!(source.read_raw(0).is_ok());
        source.set_failing(1, false);
        assert!(source.read_raw(1).is_ok());
    }
}
