//! Clock controller abstractions

/// Identifier of a clock gate in the SoC clock controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockGate(pub u32);

/// Clock service
///
/// Provides the two clock operations bring-up depends on: ungating the
/// controller clocks and reading the bus frequency the timing registers
/// are derived from.
pub trait ClockService {
    /// Turn on the given clock gate
    fn enable_gate(&mut self, gate: ClockGate);

    /// Current system bus frequency in Hz
    fn bus_frequency(&self) -> u32;
}

impl<C: ClockService + ?Sized> ClockService for &mut C {
    fn enable_gate(&mut self, gate: ClockGate) {
        (**self).enable_gate(gate)
    }

    fn bus_frequency(&self) -> u32 {
        (**self).bus_frequency()
    }
}
