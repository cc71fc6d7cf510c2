// Clock
//
// Two running counters:
//   t - T-states (clock cycles), 4.194304 MHz on real hardware
//   m - machine cycles, 1 M-cycle = 4 T-states
//
// Both only grow; they are zeroed by a CPU reset and nothing else.

/// T-states per machine cycle
pub const T_PER_M: u64 = 4;

/// Cumulative cycle counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Clock {
    m: u64,
    t: u64,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account `cycles` T-states
    pub fn advance(&mut self, cycles: u32) {
        self.t += cycles as u64;
        self.m += cycles as u64 / T_PER_M;
    }

    /// Total T-states since reset
    pub fn total_cycles(&self) -> u64 {
        self.t
    }

    /// Total machine cycles since reset
    pub fn machine_cycles(&self) -> u64 {
        self.m
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }
}
