//! Clock gates in a memory-mapped clock controller
//!
//! Gate registers hold one bit per gate, 32 gates per register. A set bit
//! stops the clock; enabling a gate clears its bit.

use nandprobe_hal::{ClockGate, ClockService, RegisterAccess};

/// Clock controller gate registers
pub struct MmioClockGates<R> {
    regs: R,
    gates_offset: u32,
    bus_hz: u32,
}

impl<R: RegisterAccess> MmioClockGates<R> {
    /// Create the clock service
    ///
    /// # Arguments
    /// - `regs`: Clock controller window
    /// - `gates_offset`: Offset of the first gate register
    /// - `bus_hz`: Bus frequency programmed by the boot stage
    pub fn new(regs: R, gates_offset: u32, bus_hz: u32) -> Self {
        Self {
            regs,
            gates_offset,
            bus_hz,
        }
    }

    /// Check if a gate is running
    pub fn is_enabled(&mut self, gate: ClockGate) -> bool {
        let (offset, bit) = self.locate(gate);
        self.regs.read32(offset) & bit == 0
    }

    /// Release the window
    pub fn release(self) -> R {
        self.regs
    }

    fn locate(&self, gate: ClockGate) -> (u32, u32) {
        let offset = self.gates_offset + (gate.0 / 32) * 4;
        (offset, 1 << (gate.0 % 32))
    }
}

impl<R: RegisterAccess> ClockService for MmioClockGates<R> {
    fn enable_gate(&mut self, gate: ClockGate) {
        let (offset, bit) = self.locate(gate);
        self.regs.modify32(offset, |value| value & !bit);
    }

    fn bus_frequency(&self) -> u32 {
        self.bus_hz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Window {
        regs: [u32; 4],
    }

    impl RegisterAccess for Window {
        fn read32(&mut self, offset: u32) -> u32 {
            self.regs[(offset / 4) as usize]
        }

        fn write32(&mut self, offset: u32, value: u32) {
            self.regs[(offset / 4) as usize] = value;
        }
    }

    #[test]
    fn test_enable_clears_gate_bit() {
        let window = Window {
            regs: [0, 0xFFFF_FFFF, 0xFFFF_FFFF, 0],
        };
        let mut clocks = MmioClockGates::new(window, 0x4, 103_000_000);

        assert!(!clocks.is_enabled(ClockGate(0x08)));
        clocks.enable_gate(ClockGate(0x08));
        clocks.enable_gate(ClockGate(0x0C));
        clocks.enable_gate(ClockGate(33));

        assert!(clocks.is_enabled(ClockGate(0x08)));
        assert_eq!(clocks.bus_frequency(), 103_000_000);
        let window = clocks.release();
        assert_eq!(window.regs[1], !((1 << 8) | (1 << 12)));
        assert_eq!(window.regs[2], !(1 << 1));
    }
}
