//! Adaptive-condensing graph history.
//!
//! Points are appended chronologically (index 0 is the oldest). When the
//! buffer is full the next insertion first merges adjacent pairs, halving the
//! count, so recent data stays at full resolution while old data is
//! progressively averaged. Memory is bounded to [`GRAPH_HISTORY_SIZE`] slots
//! regardless of cook duration.

use pc_core::{NUM_PROBES, ProbeId};
use serde::{Deserialize, Serialize};

/// Capacity of the history buffer.
pub const GRAPH_HISTORY_SIZE: usize = 240;

/// Cadence at which the control loop pushes a point.
pub const GRAPH_SAMPLE_MS: u64 = 5000;

/// One chart point. Probe values are only meaningful when their flag is set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphSlot {
    pub pit: f64,
    pub meat1: f64,
    pub meat2: f64,
    pub setpoint: f64,
    pub pit_valid: bool,
    pub meat1_valid: bool,
    pub meat2_valid: bool,
}

impl Default for GraphSlot {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl GraphSlot {
    /// Returned for out-of-range reads.
    pub const EMPTY: GraphSlot = GraphSlot {
        pit: 0.0,
        meat1: 0.0,
        meat2: 0.0,
        setpoint: 0.0,
        pit_valid: false,
        meat1_valid: false,
        meat2_valid: false,
    };

    /// Value of one probe, `None` when the slot marks it absent.
    pub fn value(&self, probe: ProbeId) -> Option<f64> {
        let (value, valid) = match probe {
            ProbeId::Pit => (self.pit, self.pit_valid),
            ProbeId::Meat1 => (self.meat1, self.meat1_valid),
            ProbeId::Meat2 => (self.meat2, self.meat2_valid),
        };
        valid.then_some(value)
    }

    /// All three probe values in [`ProbeId`] order.
    pub fn values(&self) -> [Option<f64>; NUM_PROBES] {
        ProbeId::ALL.map(|probe| self.value(probe))
    }

    fn merge(a: &GraphSlot, b: &GraphSlot) -> GraphSlot {
        let (pit, pit_valid) = merge_values(a.pit, a.pit_valid, b.pit, b.pit_valid);
        let (meat1, meat1_valid) = merge_values(a.meat1, a.meat1_valid, b.meat1, b.meat1_valid);
        let (meat2, meat2_valid) = merge_values(a.meat2, a.meat2_valid, b.meat2, b.meat2_valid);
        GraphSlot {
            pit,
            meat1,
            meat2,
            setpoint: (a.setpoint + b.setpoint) * 0.5,
            pit_valid,
            meat1_valid,
            meat2_valid,
        }
    }
}

/// Average two readings honouring validity. Two invalid readings never
/// produce a valid one.
fn merge_values(a: f64, a_valid: bool, b: f64, b_valid: bool) -> (f64, bool) {
    match (a_valid, b_valid) {
        (true, true) => ((a + b) * 0.5, true),
        (true, false) => (a, true),
        (false, true) => (b, true),
        (false, false) => (0.0, false),
    }
}

/// Fixed-capacity chart history.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphHistory {
    buffer: [GraphSlot; GRAPH_HISTORY_SIZE],
    count: usize,
}

impl Default for GraphHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphHistory {
    pub fn new() -> Self {
        Self {
            buffer: [GraphSlot::EMPTY; GRAPH_HISTORY_SIZE],
            count: 0,
        }
    }

    /// Append a point, condensing first if the buffer is full.
    ///
    /// The `*_invalid` flags mark disconnected probes; their values are kept
    /// but never read back as data.
    #[allow(clippy::too_many_arguments)]
    pub fn add_point(
        &mut self,
        pit: f64,
        meat1: f64,
        meat2: f64,
        setpoint: f64,
        pit_invalid: bool,
        meat1_invalid: bool,
        meat2_invalid: bool,
    ) {
        if self.count >= GRAPH_HISTORY_SIZE {
            self.condense();
        }

        self.buffer[self.count] = GraphSlot {
            pit,
            meat1,
            meat2,
            setpoint,
            pit_valid: !pit_invalid,
            meat1_valid: !meat1_invalid,
            meat2_valid: !meat2_invalid,
        };
        self.count += 1;
    }

    /// Append readings as reported by the probe layer; `None` is absent.
    pub fn add_readings(&mut self, readings: &[Option<f64>; NUM_PROBES], setpoint: f64) {
        let [pit, meat1, meat2] = *readings;
        self.add_point(
            pit.unwrap_or(0.0),
            meat1.unwrap_or(0.0),
            meat2.unwrap_or(0.0),
            setpoint,
            pit.is_none(),
            meat1.is_none(),
            meat2.is_none(),
        );
    }

    /// Forget every point. Storage is reused.
    pub fn clear(&mut self) {
        self.count = 0;
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == GRAPH_HISTORY_SIZE
    }

    pub fn capacity(&self) -> usize {
        GRAPH_HISTORY_SIZE
    }

    /// Slot at `index` (0 = oldest), or [`GraphSlot::EMPTY`] past the end.
    pub fn slot(&self, index: usize) -> GraphSlot {
        self.as_slice().get(index).copied().unwrap_or(GraphSlot::EMPTY)
    }

    pub fn as_slice(&self) -> &[GraphSlot] {
        &self.buffer[..self.count]
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &GraphSlot> {
        self.as_slice().iter()
    }

    /// Most recent point.
    pub fn latest(&self) -> Option<&GraphSlot> {
        self.as_slice().last()
    }

    fn condense(&mut self) {
        let old = self.count;
        let mut dst = 0;
        let mut i = 0;
        while i < old {
            self.buffer[dst] = if i + 1 < old {
                GraphSlot::merge(&self.buffer[i], &self.buffer[i + 1])
            } else {
                self.buffer[i]
            };
            dst += 1;
            i += 2;
        }
        self.count = dst;
        tracing::debug!(from = old, to = dst, "graph history condensed");
    }
}
