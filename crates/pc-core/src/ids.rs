use core::fmt;

use crate::{PcError, PcResult};

/// Number of physical probe channels.
pub const NUM_PROBES: usize = 3;

/// Fixed identity of a probe channel.
///
/// The discriminant is the probe index and also the ADC input the probe is
/// wired to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ProbeId {
    Pit = 0,
    Meat1 = 1,
    Meat2 = 2,
}

impl ProbeId {
    pub const ALL: [ProbeId; NUM_PROBES] = [ProbeId::Pit, ProbeId::Meat1, ProbeId::Meat2];

    /// Recover the 0-based index.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Look up a probe by 0-based index.
    pub fn from_index(index: usize) -> PcResult<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(PcError::ProbeIndex {
                index,
                len: NUM_PROBES,
            })
    }

    /// ADC input channel the probe is wired to.
    #[inline]
    pub fn adc_channel(self) -> u8 {
        self as u8
    }

    /// Short label used in logs and transport messages.
    pub fn label(self) -> &'static str {
        match self {
            ProbeId::Pit => "pit",
            ProbeId::Meat1 => "meat1",
            ProbeId::Meat2 => "meat2",
        }
    }
}

impl fmt::Display for ProbeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_round_trip_index() {
        for probe in ProbeId::ALL {
            assert_eq!(ProbeId::from_index(probe.index()).unwrap(), probe);
        }
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let err = ProbeId::from_index(3).unwrap_err();
        assert_eq!(err, PcError::ProbeIndex { index: 3, len: 3 });
    }

    #[test]
    fn channels_follow_index() {
        assert_eq!(ProbeId::Pit.adc_channel(), 0);
        assert_eq!(ProbeId::Meat2.adc_channel(), 2);
        assert_eq!(ProbeId::Meat1.to_string(), "meat1");
    }
}
